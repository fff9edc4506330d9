//! DEX Swap Core Library
//!
//! Domain types, aggregator gateway and chain RPC clients, and offline
//! transaction signing for the swap execution pipeline.

pub mod api;
pub mod config;
pub mod error;
pub mod signing;
pub mod types;

pub use error::{Error, Result};
