//! DEX Swap: aggregator-routed token swaps with on-chain confirmation.
//!
//! The root crate re-exports the workspace for end-to-end tests.
//! For actual functionality, use the individual crates directly:
//!
//! - `dex-core`: Config, gateway and chain clients, transaction signing
//! - `swap-engine`: Swap pipeline, confirmation tracking, error classification
//! - `auth`: Gateway credentials and the trading wallet

pub use auth;
pub use dex_core as core;
pub use swap_engine as engine;
