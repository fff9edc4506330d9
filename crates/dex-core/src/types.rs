//! Core domain types for the swap pipeline.

pub mod chain;
pub(crate) mod lenient;
pub mod order;
pub mod swap;

pub use chain::*;
pub use order::*;
pub use swap::*;
