//! Post-transaction order lookup.

use super::gateway::GatewayClient;
use crate::types::{OrderRecord, OrdersPage};
use crate::Result;

const ORDERS_ENDPOINT: &str = "dex/post-transaction/orders";

#[derive(Debug, Clone)]
pub struct OrderLookup {
    gateway: GatewayClient,
}

impl OrderLookup {
    pub fn new(gateway: GatewayClient) -> Self {
        Self { gateway }
    }

    /// Most recent record for an order, or `None` while the gateway has
    /// nothing to report yet.
    pub async fn latest_order(
        &self,
        order_id: &str,
        chain_index: &str,
        address: &str,
    ) -> Result<Option<OrderRecord>> {
        let params = [
            ("orderId", order_id),
            ("chainIndex", chain_index),
            ("address", address),
            ("limit", "1"),
        ];
        let pages = self.gateway.get(ORDERS_ENDPOINT, &params).await?;

        let Some(first) = pages.into_iter().next() else {
            return Ok(None);
        };
        let page: OrdersPage = serde_json::from_value(first)?;
        Ok(page.orders.into_iter().next())
    }
}
