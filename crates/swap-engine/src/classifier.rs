//! Structured classification of swap failures.
//!
//! Turns failed order records and pipeline errors into a `{kind, message,
//! action}` triple suitable for showing to a user. Classification is pure
//! and never fails.

use dex_core::types::OrderRecord;
use serde::Serialize;
use std::fmt;

pub const TRANSACTION_FAILED: &str = "TRANSACTION_FAILED";
pub const UNKNOWN_REASON: &str = "Unknown reason";
pub const DEFAULT_ACTION: &str = "Try again or contact support";

/// A failure with a suggested next step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    pub kind: &'static str,
    pub message: String,
    pub action: &'static str,
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Ordered keyword table; first match wins.
const ACTIONS: &[(&[&str], &str)] = &[
    (
        &[
            "insufficient funds",
            "insufficient balance",
            "exceeds balance",
        ],
        "Top up the wallet balance and retry",
    ),
    (
        &["allowance", "transfer_from_failed", "stf"],
        "Approve the router to spend the token and retry",
    ),
    (
        &["slippage", "too little received", "insufficient_output", "price impact"],
        "Increase slippage tolerance or reduce the swap amount",
    ),
    (
        &["nonce"],
        "Resubmit with a fresh nonce",
    ),
    (
        &["out of gas", "gas limit", "intrinsic gas"],
        "Retry with a higher gas limit",
    ),
];

fn suggested_action(reason: &str) -> &'static str {
    let lower = reason.to_lowercase();
    ACTIONS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| contains_word(&lower, k)))
        .map(|(_, action)| *action)
        .unwrap_or(DEFAULT_ACTION)
}

// Short keywords like "stf" must not match inside longer words.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.len() > 3 {
        return haystack.contains(needle);
    }
    haystack
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .any(|word| word == needle)
}

/// Classify an on-chain failure from its reason text.
pub fn classify_reason(reason: Option<&str>) -> ClassifiedError {
    let message = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(UNKNOWN_REASON);
    ClassifiedError {
        kind: TRANSACTION_FAILED,
        message: message.to_string(),
        action: suggested_action(message),
    }
}

/// Classify a failed order record from the gateway.
pub fn classify_order_failure(record: &OrderRecord) -> ClassifiedError {
    classify_reason(record.fail_reason.as_deref())
}

/// Classify an error raised before the transaction reached the chain.
pub fn classify_error(error: &dex_core::Error) -> ClassifiedError {
    use dex_core::Error;

    let (kind, action) = match error {
        Error::Api { .. } if error.is_insufficient_liquidity() => (
            "INSUFFICIENT_LIQUIDITY",
            "Increase the amount or choose a different token pair",
        ),
        Error::Api { .. } => ("API_ERROR", "Check the request parameters and try again"),
        Error::Http(_) | Error::Network { .. } => {
            ("NETWORK_ERROR", "Check connectivity or proxy settings and retry")
        }
        Error::Config { .. } | Error::ConfigFile(_) => {
            ("CONFIG_ERROR", "Fix the configuration and restart")
        }
        Error::Simulation { reason } => ("SIMULATION_FAILED", suggested_action(reason)),
        Error::Broadcast { message } => ("BROADCAST_FAILED", broadcast_action(message)),
        Error::Signing { .. } | Error::InvalidRequest { .. } => {
            ("INVALID_REQUEST", "Check the swap parameters")
        }
        Error::Rpc { .. } | Error::Json(_) => ("RPC_ERROR", DEFAULT_ACTION),
    };

    ClassifiedError {
        kind,
        message: error.to_string(),
        action,
    }
}

fn broadcast_action(message: &str) -> &'static str {
    match suggested_action(message) {
        DEFAULT_ACTION => "Rebuild the transaction with a fresh nonce and resubmit",
        action => action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(reason: Option<&str>) -> OrderRecord {
        OrderRecord {
            tx_status: "3".to_string(),
            fail_reason: reason.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_unknown_reason_defaults() {
        let classified = classify_order_failure(&record(None));
        assert_eq!(
            classified,
            ClassifiedError {
                kind: TRANSACTION_FAILED,
                message: UNKNOWN_REASON.to_string(),
                action: DEFAULT_ACTION,
            }
        );
        assert_eq!(classify_reason(Some("   ")).message, UNKNOWN_REASON);
    }

    #[test]
    fn test_reason_is_preserved() {
        let classified = classify_order_failure(&record(Some("execution reverted")));
        assert_eq!(classified.kind, TRANSACTION_FAILED);
        assert_eq!(classified.message, "execution reverted");
        assert_eq!(classified.action, DEFAULT_ACTION);
    }

    #[test]
    fn test_keyword_actions() {
        let cases = [
            ("Too little received", "Increase slippage tolerance or reduce the swap amount"),
            ("out of gas", "Retry with a higher gas limit"),
            ("nonce too low", "Resubmit with a fresh nonce"),
            (
                "insufficient funds for gas * price + value",
                "Top up the wallet balance and retry",
            ),
            ("execution reverted: STF", "Approve the router to spend the token and retry"),
        ];
        for (reason, action) in cases {
            assert_eq!(classify_reason(Some(reason)).action, action, "{}", reason);
        }
        // "stf" inside another word is not an allowance failure
        assert_eq!(classify_reason(Some("mystfailure")).action, DEFAULT_ACTION);
    }

    #[test]
    fn test_classify_api_errors() {
        let liquidity = dex_core::Error::Api {
            code: "82000".to_string(),
            message: "Insufficient liquidity".to_string(),
        };
        let classified = classify_error(&liquidity);
        assert_eq!(classified.kind, "INSUFFICIENT_LIQUIDITY");
        assert!(classified.message.contains("82000"));

        let other = dex_core::Error::Api {
            code: "51000".to_string(),
            message: "Parameter error".to_string(),
        };
        assert_eq!(classify_error(&other).kind, "API_ERROR");

        let simulation = dex_core::Error::Simulation {
            reason: "slippage exceeded".to_string(),
        };
        let classified = classify_error(&simulation);
        assert_eq!(classified.kind, "SIMULATION_FAILED");
        assert_eq!(
            classified.action,
            "Increase slippage tolerance or reduce the swap amount"
        );

        let broadcast = dex_core::Error::Broadcast {
            message: "gateway: rejected".to_string(),
        };
        assert_eq!(
            classify_error(&broadcast).action,
            "Rebuild the transaction with a fresh nonce and resubmit"
        );
    }
}
