//! Signed transaction submission: gateway first, chain node as fallback.

use super::gateway::GatewayClient;
use super::rpc::ChainRpc;
use crate::signing::SignedTransaction;
use crate::types::{lenient, BroadcastOrder, OrderHandle};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const BROADCAST_ENDPOINT: &str = "dex/pre-transaction/broadcast-transaction";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastBody<'a> {
    signed_tx: &'a str,
    chain_index: &'a str,
    address: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastData {
    #[serde(default, deserialize_with = "lenient::string")]
    order_id: String,
}

/// Whether a node error means the transaction is already in its mempool.
pub fn is_already_known(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("already known") || lower.contains("already imported")
}

/// Submits signed transactions. Never retries on its own: resubmission needs
/// a fresh nonce and is the caller's call.
#[derive(Clone)]
pub struct Broadcaster {
    gateway: GatewayClient,
    fallback: Option<Arc<dyn ChainRpc>>,
}

impl Broadcaster {
    pub fn new(gateway: GatewayClient) -> Self {
        Self {
            gateway,
            fallback: None,
        }
    }

    /// Send through `rpc` whenever the gateway rejects a broadcast.
    pub fn with_rpc_fallback(mut self, rpc: Arc<dyn ChainRpc>) -> Self {
        self.fallback = Some(rpc);
        self
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Submit `signed_tx`.
    ///
    /// Returns the gateway's order id, or the transaction hash when the
    /// fallback path delivered it. Fails with `Broadcast` carrying every
    /// path's error when nothing accepted the transaction.
    pub async fn broadcast(
        &self,
        signed_tx: SignedTransaction,
        chain_index: &str,
        wallet_address: &str,
    ) -> Result<BroadcastOrder> {
        let primary = self
            .broadcast_via_gateway(&signed_tx.raw_transaction_hex, chain_index, wallet_address)
            .await;

        let gateway_error = match primary {
            Ok(order_id) => {
                info!(order_id = %order_id, tx_hash = %signed_tx.transaction_hash, "Broadcast accepted by gateway");
                return Ok(BroadcastOrder {
                    order_id: OrderHandle::GatewayOrder(order_id),
                    chain_index: chain_index.to_string(),
                    wallet_address: wallet_address.to_string(),
                    tx_hash: signed_tx.transaction_hash,
                });
            }
            Err(e) => e,
        };

        let Some(rpc) = &self.fallback else {
            warn!(error = %gateway_error, "Gateway broadcast failed, no fallback configured");
            return Err(Error::Broadcast {
                message: format!("gateway: {}", gateway_error),
            });
        };

        warn!(error = %gateway_error, "Gateway broadcast failed, trying RPC fallback");
        let tx_hash = match rpc.send_raw_transaction(&signed_tx.raw_transaction_hex).await {
            Ok(hash) => hash,
            Err(e) if is_already_known(&e.to_string()) => {
                info!(tx_hash = %signed_tx.transaction_hash, "Transaction already known to node");
                signed_tx.transaction_hash.clone()
            }
            Err(rpc_error) => {
                return Err(Error::Broadcast {
                    message: format!("gateway: {}; rpc: {}", gateway_error, rpc_error),
                });
            }
        };

        info!(tx_hash = %tx_hash, "Broadcast accepted by RPC fallback");
        Ok(BroadcastOrder {
            order_id: OrderHandle::TxHash(tx_hash.clone()),
            chain_index: chain_index.to_string(),
            wallet_address: wallet_address.to_string(),
            tx_hash,
        })
    }

    async fn broadcast_via_gateway(
        &self,
        raw_transaction_hex: &str,
        chain_index: &str,
        wallet_address: &str,
    ) -> Result<String> {
        let body = BroadcastBody {
            signed_tx: raw_transaction_hex,
            chain_index,
            address: wallet_address,
        };
        let data: BroadcastData = self.gateway.post_first(BROADCAST_ENDPOINT, &body).await?;
        if data.order_id.is_empty() {
            return Err(Error::Api {
                code: super::gateway::SUCCESS_CODE.to_string(),
                message: "Broadcast response missing orderId".to_string(),
            });
        }
        Ok(data.order_id)
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("gateway", &self.gateway)
            .field("has_fallback", &self.has_fallback())
            .finish()
    }
}
