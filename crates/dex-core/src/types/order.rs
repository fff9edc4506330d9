//! Broadcast handles and order status records.

use super::chain::explorer_tx_url;
use super::lenient;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier returned by a successful broadcast.
///
/// The gateway hands back its own order id; the RPC fallback only yields the
/// transaction hash. The tracker accepts either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OrderHandle {
    GatewayOrder(String),
    TxHash(String),
}

impl OrderHandle {
    pub fn as_str(&self) -> &str {
        match self {
            Self::GatewayOrder(id) | Self::TxHash(id) => id,
        }
    }

    pub fn is_tx_hash(&self) -> bool {
        matches!(self, Self::TxHash(_))
    }
}

impl fmt::Display for OrderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GatewayOrder(id) => write!(f, "order {}", id),
            Self::TxHash(hash) => write!(f, "tx {}", hash),
        }
    }
}

/// A submitted transaction awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastOrder {
    pub order_id: OrderHandle,
    pub chain_index: String,
    pub wallet_address: String,
    /// Hash computed locally at signing time.
    pub tx_hash: String,
}

/// Gateway order status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxStatus {
    Pending,
    Success,
    Failed,
    Unknown,
}

impl TxStatus {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => Self::Pending,
            "2" => Self::Success,
            "3" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// One entry of the post-transaction orders endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderRecord {
    #[serde(deserialize_with = "lenient::string")]
    pub order_id: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub tx_hash: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub tx_status: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub fail_reason: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub chain_index: String,
    pub address: String,
}

impl OrderRecord {
    pub fn status(&self) -> TxStatus {
        TxStatus::from_code(&self.tx_status)
    }
}

/// `data[0]` of the orders endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrdersPage {
    pub orders: Vec<OrderRecord>,
}

/// Outcome of one status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingResult {
    /// Not yet final; carries the hash once the gateway has reported one.
    Pending(Option<String>),
    Confirmed { tx_hash: String, explorer_url: String },
    Failed { reason: String },
}

impl TrackingResult {
    pub fn confirmed(chain_index: &str, tx_hash: impl Into<String>) -> Self {
        let tx_hash = tx_hash.into();
        Self::Confirmed {
            explorer_url: explorer_tx_url(chain_index, &tx_hash),
            tx_hash,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(TxStatus::from_code("1"), TxStatus::Pending);
        assert_eq!(TxStatus::from_code("2"), TxStatus::Success);
        assert_eq!(TxStatus::from_code("3"), TxStatus::Failed);
        assert_eq!(TxStatus::from_code("9"), TxStatus::Unknown);
        assert!(!TxStatus::Pending.is_terminal());
        assert!(TxStatus::Failed.is_terminal());
    }

    #[test]
    fn test_orders_page_deserialization() {
        let json = serde_json::json!({
            "orders": [{
                "orderId": "ord-1",
                "txHash": "0xabc",
                "txStatus": 3,
                "failReason": "",
                "chainIndex": "1",
                "address": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            }]
        });

        let page: OrdersPage = serde_json::from_value(json).unwrap();
        let record = &page.orders[0];
        assert_eq!(record.status(), TxStatus::Failed);
        assert_eq!(record.tx_hash.as_deref(), Some("0xabc"));
        // An empty fail reason is treated as absent
        assert!(record.fail_reason.is_none());
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(OrderHandle::GatewayOrder("42".into()).to_string(), "order 42");
        let hash = OrderHandle::TxHash("0xdead".into());
        assert!(hash.is_tx_hash());
        assert_eq!(hash.as_str(), "0xdead");
    }

    #[test]
    fn test_confirmed_carries_explorer_url() {
        let result = TrackingResult::confirmed("137", "0xfeed");
        assert_eq!(
            result,
            TrackingResult::Confirmed {
                tx_hash: "0xfeed".into(),
                explorer_url: "https://web3.okx.com/explorer/polygon/tx/0xfeed".into(),
            }
        );
        assert!(result.is_terminal());
        assert!(!TrackingResult::Pending(None).is_terminal());
    }
}
