//! Transaction construction and offline signing.
//!
//! ```text
//! Quote.tx + gas limit + nonce + FeeData
//!       │
//!       ▼
//! TransactionBuilder ──► UnsignedTransaction
//!                              │
//!                              ▼
//!               TransactionSigner (wallet key)
//!                              │
//!                              ▼
//!                     SignedTransaction ──► Broadcaster
//! ```

pub mod signer;
pub mod transaction;

pub use signer::{SignedTransaction, TransactionSigner};
pub use transaction::{
    parse_numeric, FeeData, FeeMode, TransactionBuilder, UnsignedTransaction,
    DEFAULT_PRIORITY_FEE_WEI,
};
