//! Pre-broadcast transaction simulation.

use super::gas::PreTransactionBody;
use super::gateway::GatewayClient;
use crate::types::lenient;
use crate::{Error, Result};
use serde::Deserialize;
use tracing::{info, warn};

const SIMULATE_ENDPOINT: &str = "dex/pre-transaction/simulate";

/// Simulation outcome reported by the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationResult {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub gas_used: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub fail_reason: Option<String>,
    pub asset_change: Vec<serde_json::Value>,
    pub risks: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct Simulator {
    gateway: GatewayClient,
    chain_index: String,
}

impl Simulator {
    pub fn new(gateway: GatewayClient, chain_index: impl Into<String>) -> Self {
        Self {
            gateway,
            chain_index: chain_index.into(),
        }
    }

    /// Dry-run a call. A non-empty fail reason aborts with `Simulation`
    /// before any gas is spent.
    pub async fn simulate(
        &self,
        from_address: &str,
        to_address: &str,
        tx_amount: Option<&str>,
        input_data: Option<&str>,
    ) -> Result<SimulationResult> {
        let body = PreTransactionBody::new(
            &self.chain_index,
            from_address,
            to_address,
            tx_amount,
            input_data,
        );
        let result: SimulationResult = self.gateway.post_first(SIMULATE_ENDPOINT, &body).await?;

        if let Some(reason) = &result.fail_reason {
            warn!(reason = %reason, "Simulation reported failure");
            return Err(Error::Simulation {
                reason: reason.clone(),
            });
        }

        info!(
            gas_used = result.gas_used.as_deref().unwrap_or("unknown"),
            "Simulation succeeded"
        );
        Ok(result)
    }
}
