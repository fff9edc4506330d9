//! Clients for the aggregator gateway and the chain node.

pub mod approve;
pub mod auth;
pub mod broadcast;
pub mod gas;
pub mod gateway;
pub mod orders;
pub mod quote;
pub mod rpc;
pub mod simulate;
pub mod transport;

pub use approve::{ApprovalService, ApproveTransaction};
pub use auth::{iso_timestamp, AuthSigner};
pub use broadcast::Broadcaster;
pub use gas::GasEstimator;
pub use gateway::GatewayClient;
pub use orders::OrderLookup;
pub use quote::{QuoteService, SupportedChain};
pub use rpc::{ChainRpc, RpcClient};
pub use simulate::{SimulationResult, Simulator};
pub use transport::{GatewayRequest, HttpTransport, Method, Transport};
