//! Swap execution engine
//!
//! Drives one aggregator swap from quote to on-chain confirmation:
//! - Token approval and optional pre-broadcast simulation
//! - Per-wallet nonce serialization
//! - Broadcast with chain-node fallback
//! - Confirmation tracking and failure classification

pub mod classifier;
pub mod error;
pub mod executor;
pub mod nonce;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use classifier::{classify_error, classify_order_failure, classify_reason, ClassifiedError};
pub use error::{Result, SwapError};
pub use executor::{describe_error, PreflightReport, SimulationReport, SwapExecutor, SwapOutcome};
pub use nonce::WalletLocks;
pub use tracker::{GatewayStatusSource, OrderTracker, StatusSource};
