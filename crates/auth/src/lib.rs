//! Authentication material
//!
//! Gateway API credentials and the trading wallet used for offline
//! transaction signing.

pub mod credentials;
pub mod wallet;

pub use credentials::{ApiCredentials, CredentialsError};
pub use wallet::TradingWallet;
