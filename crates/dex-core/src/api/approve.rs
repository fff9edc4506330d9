//! ERC-20 approval transactions for the aggregator router.

use super::gateway::GatewayClient;
use crate::types::lenient;
use crate::Result;
use serde::Deserialize;

const APPROVE_ENDPOINT: &str = "dex/aggregator/approve-transaction";

/// Calldata and target for an `approve(spender, amount)` call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApproveTransaction {
    pub data: String,
    /// Spender the token must approve.
    pub dex_contract_address: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub gas_limit: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub gas_price: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApprovalService {
    gateway: GatewayClient,
    chain_index: String,
}

impl ApprovalService {
    pub fn new(gateway: GatewayClient, chain_index: impl Into<String>) -> Self {
        Self {
            gateway,
            chain_index: chain_index.into(),
        }
    }

    /// Approval calldata letting the router spend `approve_amount` of
    /// `token_contract_address`.
    pub async fn get_approve_transaction(
        &self,
        token_contract_address: &str,
        approve_amount: &str,
    ) -> Result<ApproveTransaction> {
        let params = [
            ("chainIndex", self.chain_index.as_str()),
            ("tokenContractAddress", token_contract_address),
            ("approveAmount", approve_amount),
        ];
        self.gateway.get_first(APPROVE_ENDPOINT, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::gateway::test_support::{client_with, envelope};
    use crate::api::transport::MockTransport;
    use crate::config::ApiVersion;

    #[tokio::test]
    async fn test_approve_transaction() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| {
                req.path == "/api/v6/dex/aggregator/approve-transaction"
                    && req.query
                        == "?chainIndex=1&tokenContractAddress=0xtoken&approveAmount=5000"
            })
            .returning(|_| {
                Ok(envelope(
                    "0",
                    "",
                    serde_json::json!([{
                        "data": "0x095ea7b3",
                        "dexContractAddress": "0x40aA958dd87FC8305b97f2BA922CDdCa374bcD7f",
                        "gasLimit": "50000",
                        "gasPrice": "110000000"
                    }]),
                ))
            });

        let service = ApprovalService::new(client_with(transport, ApiVersion::V6), "1");
        let approve = service
            .get_approve_transaction("0xtoken", "5000")
            .await
            .unwrap();
        assert_eq!(approve.data, "0x095ea7b3");
        assert_eq!(approve.gas_limit.as_deref(), Some("50000"));
    }
}
