//! Order confirmation tracking.
//!
//! Polls the order's status at a fixed interval until it reaches a terminal
//! state or the deadline passes:
//!
//! ```text
//! Submitted ──► Pending ──┬──► Confirmed
//!                 ▲  │    └──► Failed ──► classifier
//!                 └──┘ (until timeout)
//! ```
//!
//! Poll errors are logged and the loop carries on; only the deadline,
//! a terminal status, or cancellation ends it. The deadline also bounds
//! a status call that never answers.

use crate::classifier::classify_order_failure;
use crate::error::{Result, SwapError};
use async_trait::async_trait;
use dex_core::api::{ChainRpc, OrderLookup};
use dex_core::types::{BroadcastOrder, OrderHandle, OrderRecord, TrackingResult, TxStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Reason reported for a reverted receipt.
pub const REVERTED_REASON: &str = "execution reverted";

/// Where order status comes from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Latest record for `order`, or `None` if nothing is known yet.
    async fn latest(&self, order: &BroadcastOrder) -> dex_core::Result<Option<OrderRecord>>;
}

/// Gateway order records for order ids, chain receipts for raw hashes.
pub struct GatewayStatusSource {
    orders: OrderLookup,
    rpc: Option<Arc<dyn ChainRpc>>,
}

impl GatewayStatusSource {
    pub fn new(orders: OrderLookup, rpc: Option<Arc<dyn ChainRpc>>) -> Self {
        Self { orders, rpc }
    }
}

#[async_trait]
impl StatusSource for GatewayStatusSource {
    async fn latest(&self, order: &BroadcastOrder) -> dex_core::Result<Option<OrderRecord>> {
        match &order.order_id {
            OrderHandle::GatewayOrder(id) => {
                self.orders
                    .latest_order(id, &order.chain_index, &order.wallet_address)
                    .await
            }
            OrderHandle::TxHash(hash) => {
                let rpc = self.rpc.as_ref().ok_or_else(|| dex_core::Error::Config {
                    message: "tracking a transaction hash needs a chain RPC".to_string(),
                })?;
                let status = rpc.get_transaction_receipt_status(hash).await?;
                Ok(status.map(|succeeded| receipt_record(order, hash, succeeded)))
            }
        }
    }
}

fn receipt_record(order: &BroadcastOrder, hash: &str, succeeded: bool) -> OrderRecord {
    OrderRecord {
        order_id: hash.to_string(),
        tx_hash: Some(hash.to_string()),
        tx_status: if succeeded { "2" } else { "3" }.to_string(),
        fail_reason: (!succeeded).then(|| REVERTED_REASON.to_string()),
        chain_index: order.chain_index.clone(),
        address: order.wallet_address.clone(),
    }
}

/// Polls a [`StatusSource`] until the order settles.
pub struct OrderTracker {
    source: Arc<dyn StatusSource>,
    interval: Duration,
    timeout: Duration,
    updates: Option<mpsc::Sender<TrackingResult>>,
}

impl OrderTracker {
    pub fn new(source: Arc<dyn StatusSource>, interval: Duration, timeout: Duration) -> Self {
        Self {
            source,
            interval,
            timeout,
            updates: None,
        }
    }

    /// Publish every status change on `tx`.
    pub fn with_updates(mut self, tx: mpsc::Sender<TrackingResult>) -> Self {
        self.updates = Some(tx);
        self
    }

    pub async fn track(&self, order: &BroadcastOrder) -> Result<TrackingResult> {
        self.track_with_cancel(order, &CancellationToken::new())
            .await
    }

    /// Track until `Confirmed`, or fail with `TransactionFailed`,
    /// `TrackingTimeout` or `Cancelled`.
    pub async fn track_with_cancel(
        &self,
        order: &BroadcastOrder,
        cancel: &CancellationToken,
    ) -> Result<TrackingResult> {
        info!(order = %order.order_id, "Tracking transaction");
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut last_observed_status: Option<TxStatus> = None;

        while Instant::now() < deadline {
            if cancel.is_cancelled() {
                return Err(SwapError::Cancelled);
            }

            let poll = tokio::select! {
                _ = cancel.cancelled() => return Err(SwapError::Cancelled),
                poll = tokio::time::timeout_at(deadline, self.source.latest(order)) => poll,
            };
            match poll {
                Ok(Ok(Some(record))) => {
                    let status = record.status();
                    if last_observed_status != Some(status) {
                        last_observed_status = Some(status);
                        if let Some(done) = self.on_status_change(order, record).await? {
                            return Ok(done);
                        }
                    }
                }
                Ok(Ok(None)) => debug!(order = %order.order_id, "No order record yet"),
                Ok(Err(e)) => warn!(order = %order.order_id, error = %e, "Error checking transaction status"),
                Err(_) => warn!(order = %order.order_id, "Status check still running at deadline"),
            }

            let next_poll = (Instant::now() + self.interval).min(deadline);
            tokio::select! {
                _ = cancel.cancelled() => return Err(SwapError::Cancelled),
                _ = tokio::time::sleep_until(next_poll) => {}
            }
        }

        warn!(order = %order.order_id, "Transaction tracking timed out");
        Err(SwapError::TrackingTimeout {
            order: order.order_id.clone(),
            elapsed: started.elapsed(),
        })
    }

    /// Side effects of a new status. Returns the final result on success,
    /// an error on failure, and `None` while still pending.
    async fn on_status_change(
        &self,
        order: &BroadcastOrder,
        record: OrderRecord,
    ) -> Result<Option<TrackingResult>> {
        match record.status() {
            TxStatus::Pending => {
                info!(
                    tx_hash = record.tx_hash.as_deref().unwrap_or("not available yet"),
                    "Transaction pending"
                );
                self.publish(TrackingResult::Pending(record.tx_hash)).await;
                Ok(None)
            }
            TxStatus::Success => {
                let tx_hash = record.tx_hash.unwrap_or_else(|| order.tx_hash.clone());
                let result = TrackingResult::confirmed(&order.chain_index, tx_hash);
                if let TrackingResult::Confirmed { explorer_url, .. } = &result {
                    info!(explorer_url = %explorer_url, "Transaction successful");
                }
                self.publish(result.clone()).await;
                Ok(Some(result))
            }
            TxStatus::Failed => {
                let classified = classify_order_failure(&record);
                error!(
                    reason = %classified.message,
                    action = classified.action,
                    "Transaction failed"
                );
                self.publish(TrackingResult::Failed {
                    reason: classified.message.clone(),
                })
                .await;
                Err(SwapError::TransactionFailed(classified))
            }
            TxStatus::Unknown => {
                debug!(status = %record.tx_status, "Unrecognised order status");
                Ok(None)
            }
        }
    }

    async fn publish(&self, update: TrackingResult) {
        if let Some(tx) = &self.updates {
            if tx.send(update).await.is_err() {
                warn!("No receiver for tracking update");
            }
        }
    }
}
