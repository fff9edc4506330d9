//! Test doubles for the gateway transport and the chain node.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use auth::ApiCredentials;
use dex_core::api::{AuthSigner, ChainRpc, GatewayClient, GatewayRequest, Transport};
use dex_core::config::ApiVersion;
use dex_core::signing::FeeData;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

// Well-known development key (DO NOT USE IN PRODUCTION)
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

mockall::mock! {
    pub Rpc {}

    #[async_trait]
    impl ChainRpc for Rpc {
        async fn get_pending_nonce(&self, address: Address) -> dex_core::Result<u64>;
        async fn get_fee_data(&self) -> dex_core::Result<FeeData>;
        async fn send_raw_transaction(&self, raw_transaction_hex: &str) -> dex_core::Result<String>;
        async fn get_block_number(&self) -> dex_core::Result<u64>;
        async fn get_balance(&self, address: Address) -> dex_core::Result<U256>;
        async fn erc20_allowance(
            &self,
            token: Address,
            owner: Address,
            spender: Address,
        ) -> dex_core::Result<U256>;
        async fn get_transaction_receipt_status(&self, tx_hash: &str) -> dex_core::Result<Option<bool>>;
    }
}

/// Gateway that answers by endpoint suffix and records every request.
///
/// Each endpoint replays its queued bodies in order and repeats the last one
/// once the queue is down to a single entry.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<HashMap<String, VecDeque<String>>>,
    requests: Mutex<Vec<GatewayRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful envelope carrying `data`.
    pub fn ok(&self, endpoint: &str, data: serde_json::Value) {
        self.raw(endpoint, envelope("0", "", data));
    }

    /// Queue an error envelope.
    pub fn reject(&self, endpoint: &str, code: &str, msg: &str) {
        self.raw(endpoint, envelope(code, msg, serde_json::json!([])));
    }

    pub fn raw(&self, endpoint: &str, body: String) {
        self.responses
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(body);
    }

    /// Requests whose path ends with `endpoint`, oldest first.
    pub fn requests_to(&self, endpoint: &str) -> Vec<GatewayRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path.ends_with(endpoint))
            .cloned()
            .collect()
    }

    pub fn client(self: &Arc<Self>) -> GatewayClient {
        gateway_over(self.clone())
    }
}

#[async_trait]
impl Transport for ScriptedGateway {
    async fn execute(&self, request: GatewayRequest) -> dex_core::Result<String> {
        let path = request.path.clone();
        self.requests.lock().unwrap().push(request);

        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .iter_mut()
            .find(|(endpoint, _)| path.ends_with(endpoint.as_str()))
            .map(|(_, queue)| queue);
        match queue {
            Some(queue) if queue.len() > 1 => Ok(queue.pop_front().unwrap()),
            Some(queue) if !queue.is_empty() => Ok(queue[0].clone()),
            _ => Err(dex_core::Error::Network {
                message: format!("no scripted response for {}", path),
                status: None,
            }),
        }
    }
}

pub fn envelope(code: &str, msg: &str, data: serde_json::Value) -> String {
    serde_json::json!({"code": code, "msg": msg, "data": data}).to_string()
}

pub fn gateway_over(transport: Arc<dyn Transport>) -> GatewayClient {
    let signer = AuthSigner::new(&ApiCredentials::new("key", "secret", "pass", "project")).unwrap();
    GatewayClient::new(transport, signer, ApiVersion::V6)
}
