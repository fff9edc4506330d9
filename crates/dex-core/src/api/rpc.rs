//! JSON-RPC client for the chain node.
//!
//! Reads nonce, fee market data, balances and allowances, and writes raw
//! transactions for the broadcast fallback and token approvals.

use crate::config::Config;
use crate::signing::FeeData;
use crate::{Error, Result};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// ERC-20 `allowance(address,address)` selector.
const ALLOWANCE_SELECTOR: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];

/// Chain node operations the swap pipeline depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Next nonce including pending transactions.
    async fn get_pending_nonce(&self, address: Address) -> Result<u64>;

    /// Current fee market snapshot. Never cached.
    async fn get_fee_data(&self) -> Result<FeeData>;

    /// Submit a signed transaction; returns the node's transaction hash.
    async fn send_raw_transaction(&self, raw_transaction_hex: &str) -> Result<String>;

    async fn get_block_number(&self) -> Result<u64>;

    async fn get_balance(&self, address: Address) -> Result<U256>;

    async fn erc20_allowance(&self, token: Address, owner: Address, spender: Address)
        -> Result<U256>;

    /// `Some(true)` on success, `Some(false)` on revert, `None` while unmined
    /// or when the receipt carries no status (pre-Byzantium blocks).
    async fn get_transaction_receipt_status(&self, tx_hash: &str) -> Result<Option<bool>>;
}

/// [`ChainRpc`] over HTTP JSON-RPC.
pub struct RpcClient {
    rpc_url: String,
    http_client: reqwest::Client,
}

impl RpcClient {
    #[allow(clippy::result_large_err)]
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("Failed to build RPC client: {}", e),
            })?;
        Ok(Self {
            rpc_url: rpc_url.into(),
            http_client,
        })
    }

    #[allow(clippy::result_large_err)]
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.chain.rpc_url.clone(),
            Duration::from_secs(config.gateway.request_timeout_secs),
        )
    }

    /// Call a method whose result may legitimately be `null`.
    async fn rpc_call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Network {
                message: format!("RPC request {} failed: {}", method, response.status()),
                status: Some(response.status().as_u16()),
            });
        }

        let body: JsonRpcResponse<T> = response.json().await?;
        if let Some(err) = body.error {
            debug!(method, code = err.code, message = %err.message, "RPC error");
            return Err(Error::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(body.result)
    }

    /// Call a method whose result must be present.
    async fn rpc_value<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        self.rpc_call(method, params).await?.ok_or_else(|| Error::Rpc {
            code: 0,
            message: format!("No result in {} response", method),
        })
    }

    async fn max_priority_fee(&self) -> Option<u128> {
        match self
            .rpc_value::<String>("eth_maxPriorityFeePerGas", serde_json::json!([]))
            .await
            .and_then(|hex| parse_quantity_u128(&hex))
        {
            Ok(fee) => Some(fee),
            Err(e) => {
                debug!(error = %e, "eth_maxPriorityFeePerGas unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl ChainRpc for RpcClient {
    async fn get_pending_nonce(&self, address: Address) -> Result<u64> {
        let hex: String = self
            .rpc_value(
                "eth_getTransactionCount",
                serde_json::json!([format!("{:?}", address), "pending"]),
            )
            .await?;
        parse_quantity_u64(&hex)
    }

    async fn get_fee_data(&self) -> Result<FeeData> {
        let block: Option<LatestBlock> = self
            .rpc_call(
                "eth_getBlockByNumber",
                serde_json::json!(["latest", false]),
            )
            .await?;
        let base_fee = block
            .and_then(|b| b.base_fee_per_gas)
            .map(|hex| parse_quantity_u128(&hex))
            .transpose()?;

        if base_fee.is_some() {
            let priority = self.max_priority_fee().await;
            return Ok(FeeData::from_market(base_fee, priority, None));
        }

        warn!("Latest block has no base fee, using legacy gas price");
        let gas_price: String = self.rpc_value("eth_gasPrice", serde_json::json!([])).await?;
        Ok(FeeData::from_market(
            None,
            None,
            Some(parse_quantity_u128(&gas_price)?),
        ))
    }

    async fn send_raw_transaction(&self, raw_transaction_hex: &str) -> Result<String> {
        self.rpc_value(
            "eth_sendRawTransaction",
            serde_json::json!([raw_transaction_hex]),
        )
        .await
    }

    async fn get_block_number(&self) -> Result<u64> {
        let hex: String = self
            .rpc_value("eth_blockNumber", serde_json::json!([]))
            .await?;
        parse_quantity_u64(&hex)
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        let hex: String = self
            .rpc_value(
                "eth_getBalance",
                serde_json::json!([format!("{:?}", address), "latest"]),
            )
            .await?;
        parse_u256(&hex)
    }

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        let data = encode_allowance_call(owner, spender);
        let hex: String = self
            .rpc_value(
                "eth_call",
                serde_json::json!([
                    { "to": format!("{:?}", token), "data": data },
                    "latest"
                ]),
            )
            .await?;
        parse_u256(&hex)
    }

    async fn get_transaction_receipt_status(&self, tx_hash: &str) -> Result<Option<bool>> {
        let receipt: Option<Receipt> = self
            .rpc_call("eth_getTransactionReceipt", serde_json::json!([tx_hash]))
            .await?;
        Ok(receipt.and_then(|r| r.succeeded()))
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // RPC URLs often embed provider API keys
        f.debug_struct("RpcClient").finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlock {
    base_fee_per_gas: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Receipt {
    status: Option<String>,
}

impl Receipt {
    fn succeeded(&self) -> Option<bool> {
        match self.status.as_deref() {
            Some("0x1") => Some(true),
            Some("0x0") => Some(false),
            _ => None,
        }
    }
}

/// `allowance(owner, spender)` calldata as `0x` hex.
pub fn encode_allowance_call(owner: Address, spender: Address) -> String {
    let mut data = Vec::with_capacity(68);
    data.extend_from_slice(&ALLOWANCE_SELECTOR);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(owner.as_slice());
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(spender.as_slice());
    format!("0x{}", hex::encode(data))
}

#[allow(clippy::result_large_err)]
pub fn parse_quantity_u64(hex: &str) -> Result<u64> {
    u64::from_str_radix(strip_quantity(hex), 16).map_err(|e| Error::Rpc {
        code: 0,
        message: format!("Invalid quantity {}: {}", hex, e),
    })
}

#[allow(clippy::result_large_err)]
pub fn parse_quantity_u128(hex: &str) -> Result<u128> {
    u128::from_str_radix(strip_quantity(hex), 16).map_err(|e| Error::Rpc {
        code: 0,
        message: format!("Invalid quantity {}: {}", hex, e),
    })
}

/// Parse a quantity or a 32-byte word. `0x` alone reads as zero.
#[allow(clippy::result_large_err)]
pub fn parse_u256(hex: &str) -> Result<U256> {
    U256::from_str_radix(strip_quantity(hex), 16).map_err(|e| Error::Rpc {
        code: 0,
        message: format!("Invalid uint256 {}: {}", hex, e),
    })
}

fn strip_quantity(hex: &str) -> &str {
    let digits = hex.trim().trim_start_matches("0x");
    if digits.is_empty() {
        "0"
    } else {
        digits
    }
}
