//! Swap routes and price quotes from the aggregator.

use super::gateway::GatewayClient;
use crate::types::{is_zero_amount, validate_amount, Quote, RouteSummary, SwapRequest};
use crate::{Error, Result};
use serde::Deserialize;
use tracing::{debug, info};

const SWAP_ENDPOINT: &str = "dex/aggregator/swap";
const QUOTE_ENDPOINT: &str = "dex/aggregator/quote";
const SUPPORTED_CHAIN_ENDPOINT: &str = "dex/aggregator/supported/chain";

/// A chain the aggregator can route on.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupportedChain {
    #[serde(deserialize_with = "crate::types::lenient::string")]
    pub chain_index: String,
    pub chain_name: String,
    pub dex_token_approve_address: String,
}

/// Fetches priced routes. No retries: every failure goes back to the caller.
#[derive(Debug, Clone)]
pub struct QuoteService {
    gateway: GatewayClient,
}

impl QuoteService {
    pub fn new(gateway: GatewayClient) -> Self {
        Self { gateway }
    }

    /// Route plus executable transaction for `request`, built for
    /// `user_wallet_address`.
    ///
    /// Fails with `InvalidRequest` for a zero amount, `Api` when the gateway
    /// rejects the request or returns no route, and `Network` when the
    /// gateway cannot be reached.
    pub async fn get_swap_data(
        &self,
        request: &SwapRequest,
        user_wallet_address: &str,
    ) -> Result<Quote> {
        ensure_positive(request.amount())?;

        let version = self.gateway.api_version();
        let slippage = request.slippage_percent().to_string();
        let params = [
            (version.aggregator_chain_param(), request.chain_index()),
            ("fromTokenAddress", request.from_token_address()),
            ("toTokenAddress", request.to_token_address()),
            ("amount", request.amount()),
            (version.slippage_param(), slippage.as_str()),
            ("userWalletAddress", user_wallet_address),
        ];

        debug!(
            chain_index = request.chain_index(),
            from_token = request.from_token_address(),
            to_token = request.to_token_address(),
            amount = request.amount(),
            "Requesting swap data"
        );
        let quote: Quote = self.gateway.get_first(SWAP_ENDPOINT, &params).await?;

        info!(
            to_token_amount = %quote.to_token_amount,
            routes = quote.router_list.len(),
            "Swap data received"
        );
        Ok(quote)
    }

    /// Price-only quote: no transaction data, no wallet needed.
    pub async fn get_quote(&self, request: &SwapRequest) -> Result<RouteSummary> {
        ensure_positive(request.amount())?;

        let params = [
            ("chainIndex", request.chain_index()),
            ("fromTokenAddress", request.from_token_address()),
            ("toTokenAddress", request.to_token_address()),
            ("amount", request.amount()),
        ];
        self.gateway.get_first(QUOTE_ENDPOINT, &params).await
    }

    /// Aggregator metadata for one chain, including the approve target.
    pub async fn get_supported_chain(&self, chain_index: &str) -> Result<SupportedChain> {
        self.gateway
            .get_first(SUPPORTED_CHAIN_ENDPOINT, &[("chainIndex", chain_index)])
            .await
    }
}

#[allow(clippy::result_large_err)]
fn ensure_positive(amount: &str) -> Result<()> {
    validate_amount(amount)?;
    if is_zero_amount(amount) {
        return Err(Error::invalid_request("amount must be positive"));
    }
    Ok(())
}
