//! Gas-limit estimation through the gateway.

use super::gateway::GatewayClient;
use crate::types::lenient;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const GAS_LIMIT_ENDPOINT: &str = "dex/pre-transaction/gas-limit";

/// Body shared by the gas-limit and simulate endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreTransactionBody {
    pub chain_index: String,
    pub from_address: String,
    pub to_address: String,
    pub tx_amount: String,
    pub ext_json: ExtJson,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtJson {
    pub input_data: String,
}

impl PreTransactionBody {
    /// `tx_amount` defaults to `"0"` and `input_data` to empty.
    pub fn new(
        chain_index: &str,
        from_address: &str,
        to_address: &str,
        tx_amount: Option<&str>,
        input_data: Option<&str>,
    ) -> Self {
        Self {
            chain_index: chain_index.to_string(),
            from_address: from_address.to_string(),
            to_address: to_address.to_string(),
            tx_amount: tx_amount
                .filter(|s| !s.trim().is_empty())
                .unwrap_or("0")
                .to_string(),
            ext_json: ExtJson {
                input_data: input_data.unwrap_or_default().to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GasLimitData {
    #[serde(default, deserialize_with = "lenient::string")]
    gas_limit: String,
}

/// Asks the gateway how much gas a call will need.
#[derive(Debug, Clone)]
pub struct GasEstimator {
    gateway: GatewayClient,
    chain_index: String,
}

impl GasEstimator {
    pub fn new(gateway: GatewayClient, chain_index: impl Into<String>) -> Self {
        Self {
            gateway,
            chain_index: chain_index.into(),
        }
    }

    /// Gas limit as the gateway reports it (decimal string).
    pub async fn get_gas_limit(
        &self,
        from_address: &str,
        to_address: &str,
        tx_amount: Option<&str>,
        input_data: Option<&str>,
    ) -> Result<String> {
        let body = PreTransactionBody::new(
            &self.chain_index,
            from_address,
            to_address,
            tx_amount,
            input_data,
        );
        let data: GasLimitData = self.gateway.post_first(GAS_LIMIT_ENDPOINT, &body).await?;

        if data.gas_limit.trim().is_empty() {
            return Err(Error::Api {
                code: super::gateway::SUCCESS_CODE.to_string(),
                message: "Gas limit missing from response".to_string(),
            });
        }
        debug!(gas_limit = %data.gas_limit, to = to_address, "Gas limit estimated");
        Ok(data.gas_limit)
    }
}
