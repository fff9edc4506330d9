//! Swap execution pipeline.
//!
//! One swap runs start to finish on the calling task:
//! approval (ERC-20 input only) → swap data → simulation (optional) →
//! gas estimate → nonce + fees → sign → broadcast → track.
//!
//! Nothing is retried here. Every step either succeeds or returns its error
//! to the caller, who decides whether to start over with fresh chain state.

use crate::error::{Result, SwapError};
use crate::nonce::WalletLocks;
use crate::tracker::{GatewayStatusSource, OrderTracker};
use alloy_primitives::{Address, U256};
use auth::TradingWallet;
use chrono::{DateTime, Utc};
use dex_core::api::{
    ApprovalService, Broadcaster, ChainRpc, GasEstimator, GatewayClient, OrderLookup,
    QuoteService, RpcClient, SimulationResult, Simulator,
};
use dex_core::config::{Config, ExecutionConfig};
use dex_core::signing::{
    parse_numeric, FeeData, TransactionBuilder, TransactionSigner, UnsignedTransaction,
};
use dex_core::types::{BroadcastOrder, OrderHandle, SwapRequest, TrackingResult};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A swap that reached a terminal state.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub swap_id: Uuid,
    pub order: BroadcastOrder,
    /// Hash of the approval sent ahead of the swap, if one was needed.
    pub approval_tx_hash: Option<String>,
    pub result: TrackingResult,
    pub to_token_amount: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Connectivity and funding check run before any swap.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightReport {
    pub chain_index: String,
    pub chain_name: String,
    pub wallet_address: String,
    pub block_number: u64,
    pub native_balance_wei: String,
}

/// Everything a swap would do short of signing it.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub to_token_amount: String,
    pub gas_limit: String,
    /// Whether an ERC-20 approval would be sent first.
    pub needs_approval: bool,
    pub simulation: SimulationResult,
}

/// Runs swaps for one wallet on one chain.
pub struct SwapExecutor {
    chain_index: String,
    wallet_address: String,
    quotes: QuoteService,
    gas: GasEstimator,
    simulator: Simulator,
    approvals: ApprovalService,
    broadcaster: Broadcaster,
    tracker: OrderTracker,
    rpc: Arc<dyn ChainRpc>,
    builder: TransactionBuilder,
    signer: TransactionSigner,
    wallet_locks: WalletLocks,
    execution: ExecutionConfig,
}

impl SwapExecutor {
    /// Wire the pipeline from its clients.
    ///
    /// Fails with a config error when the configured wallet address does not
    /// belong to `wallet`, or the chain index is not an EVM chain id.
    pub fn new(
        config: &Config,
        gateway: GatewayClient,
        rpc: Arc<dyn ChainRpc>,
        wallet: TradingWallet,
    ) -> Result<Self> {
        if let Some(expected) = &config.chain.wallet_address {
            wallet
                .ensure_address(expected)
                .map_err(|e| dex_core::Error::Config {
                    message: format!("{:#}", e),
                })?;
        }

        let chain_index = config.chain.chain_index.clone();
        let builder = TransactionBuilder::new(config.chain.chain_id()?);
        let wallet_address = wallet.address_string();

        let mut broadcaster = Broadcaster::new(gateway.clone());
        if config.execution.rpc_fallback {
            broadcaster = broadcaster.with_rpc_fallback(rpc.clone());
        }

        let status = GatewayStatusSource::new(OrderLookup::new(gateway.clone()), Some(rpc.clone()));
        let tracker = OrderTracker::new(
            Arc::new(status),
            config.tracking.interval(),
            config.tracking.timeout(),
        );

        info!(
            chain_index = %chain_index,
            wallet = %wallet_address,
            rpc_fallback = config.execution.rpc_fallback,
            "Created swap executor"
        );

        Ok(Self {
            quotes: QuoteService::new(gateway.clone()),
            gas: GasEstimator::new(gateway.clone(), chain_index.clone()),
            simulator: Simulator::new(gateway.clone(), chain_index.clone()),
            approvals: ApprovalService::new(gateway, chain_index.clone()),
            broadcaster,
            tracker,
            rpc,
            builder,
            signer: TransactionSigner::new(wallet.into_signer()),
            wallet_locks: WalletLocks::new(),
            execution: config.execution.clone(),
            chain_index,
            wallet_address,
        })
    }

    /// Executor over the live gateway and chain node.
    pub fn from_config(config: &Config, wallet: TradingWallet) -> Result<Self> {
        let gateway = GatewayClient::from_config(config)?;
        let rpc = RpcClient::from_config(config)?;
        Self::new(config, gateway, Arc::new(rpc), wallet)
    }

    /// Share nonce locks with other executors signing for the same wallet.
    pub fn with_wallet_locks(mut self, locks: WalletLocks) -> Self {
        self.wallet_locks = locks;
        self
    }

    /// Publish tracking status changes on `tx`.
    pub fn with_updates(mut self, tx: mpsc::Sender<TrackingResult>) -> Self {
        self.tracker = self.tracker.with_updates(tx);
        self
    }

    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }

    /// Check the gateway accepts our credentials for this chain and the node
    /// answers for this wallet.
    pub async fn preflight(&self) -> Result<PreflightReport> {
        let chain = self.quotes.get_supported_chain(&self.chain_index).await?;
        let block_number = self.rpc.get_block_number().await?;
        let balance = self.rpc.get_balance(self.signer.address()).await?;

        if balance.is_zero() {
            warn!(wallet = %self.wallet_address, "Wallet has no native balance for gas");
        }
        info!(
            chain = %chain.chain_name,
            block_number,
            balance_wei = %balance,
            "Preflight checks passed"
        );

        Ok(PreflightReport {
            chain_index: self.chain_index.clone(),
            chain_name: chain.chain_name,
            wallet_address: self.wallet_address.clone(),
            block_number,
            native_balance_wei: balance.to_string(),
        })
    }

    /// Quote, simulate and estimate gas without signing or broadcasting.
    pub async fn simulate_only(&self, request: &SwapRequest) -> Result<SimulationReport> {
        self.ensure_chain(request)?;
        let needs_approval = match self.approval_target(request).await? {
            Some((token, spender, required)) => {
                self.rpc
                    .erc20_allowance(token, self.signer.address(), spender)
                    .await?
                    < required
            }
            None => false,
        };

        let quote = self
            .quotes
            .get_swap_data(request, &self.wallet_address)
            .await?;
        let to_token_amount = quote.to_token_amount.clone();
        let tx = quote.into_tx();

        let simulation = self
            .simulator
            .simulate(&tx.from, &tx.to, Some(tx.value_or_zero()), Some(&tx.data))
            .await?;
        let gas_limit = self
            .gas
            .get_gas_limit(&tx.from, &tx.to, Some(tx.value_or_zero()), Some(&tx.data))
            .await?;

        info!(
            to_token_amount = %to_token_amount,
            gas_limit = %gas_limit,
            needs_approval,
            "Simulation complete, nothing broadcast"
        );
        Ok(SimulationReport {
            to_token_amount,
            gas_limit,
            needs_approval,
            simulation,
        })
    }

    pub async fn execute(&self, request: &SwapRequest) -> Result<SwapOutcome> {
        self.execute_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Run the full pipeline. Cancelling `cancel` stops confirmation tracking;
    /// a transaction already broadcast stays broadcast.
    pub async fn execute_with_cancel(
        &self,
        request: &SwapRequest,
        cancel: &CancellationToken,
    ) -> Result<SwapOutcome> {
        let swap_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            swap_id = %swap_id,
            chain_index = request.chain_index(),
            from_token = request.from_token_address(),
            to_token = request.to_token_address(),
            amount = request.amount(),
            "Starting swap"
        );

        match self.run(request, cancel).await {
            Ok((order, approval_tx_hash, result, to_token_amount)) => {
                let finished_at = Utc::now();
                info!(
                    swap_id = %swap_id,
                    order = %order.order_id,
                    duration_ms = (finished_at - started_at).num_milliseconds(),
                    "Swap complete"
                );
                Ok(SwapOutcome {
                    swap_id,
                    order,
                    approval_tx_hash,
                    result,
                    to_token_amount,
                    started_at,
                    finished_at,
                })
            }
            Err(e) => {
                let classified = e.classify();
                error!(
                    swap_id = %swap_id,
                    kind = classified.kind,
                    error = %classified.message,
                    action = classified.action,
                    "Swap failed"
                );
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &SwapRequest,
        cancel: &CancellationToken,
    ) -> Result<(BroadcastOrder, Option<String>, TrackingResult, String)> {
        self.ensure_chain(request)?;
        let approval_tx_hash = if self.execution.approve_tokens {
            self.ensure_allowance(request, cancel).await?
        } else {
            None
        };

        let quote = self
            .quotes
            .get_swap_data(request, &self.wallet_address)
            .await?;
        let to_token_amount = quote.to_token_amount.clone();
        let tx = quote.into_tx();

        if self.execution.simulate_before_broadcast {
            self.simulator
                .simulate(&tx.from, &tx.to, Some(tx.value_or_zero()), Some(&tx.data))
                .await?;
        }

        let gas_limit = self
            .gas
            .get_gas_limit(&tx.from, &tx.to, Some(tx.value_or_zero()), Some(&tx.data))
            .await?;

        let order = self
            .submit(|nonce, fees| self.builder.build(tx, &gas_limit, nonce, fees))
            .await?;

        let result = self.tracker.track_with_cancel(&order, cancel).await?;
        Ok((order, approval_tx_hash, result, to_token_amount))
    }

    /// The executor signs with one chain id; a quote for another chain would
    /// carry calldata for the wrong router.
    fn ensure_chain(&self, request: &SwapRequest) -> dex_core::Result<()> {
        if request.chain_index() != self.chain_index {
            return Err(dex_core::Error::invalid_request(format!(
                "request is for chain {} but this executor signs for chain {}",
                request.chain_index(),
                self.chain_index
            )));
        }
        Ok(())
    }

    /// Hold the wallet lock from nonce read to broadcast so concurrent swaps
    /// on one wallet never sign with the same nonce.
    async fn submit<F>(&self, build: F) -> Result<BroadcastOrder>
    where
        F: FnOnce(u64, &FeeData) -> dex_core::Result<UnsignedTransaction>,
    {
        let address = self.signer.address();
        let _guard = self.wallet_locks.acquire(address).await;

        let nonce = self.rpc.get_pending_nonce(address).await?;
        let fee_data = self.rpc.get_fee_data().await?;
        let unsigned = build(nonce, &fee_data)?;
        let signed = self.signer.sign(&unsigned)?;

        info!(
            nonce,
            gas_limit = unsigned.gas_limit,
            tx_hash = %signed.transaction_hash,
            "Broadcasting transaction"
        );
        Ok(self
            .broadcaster
            .broadcast(signed, &self.chain_index, &self.wallet_address)
            .await?)
    }

    /// Token, spender and required amount for an ERC-20 input, or `None`
    /// for native input.
    async fn approval_target(&self, request: &SwapRequest) -> Result<Option<(Address, Address, U256)>> {
        if request.is_native_input() {
            return Ok(None);
        }
        let token = parse_address(request.from_token_address(), "from token")?;
        let chain = self.quotes.get_supported_chain(&self.chain_index).await?;
        let spender = parse_address(&chain.dex_token_approve_address, "approve target")?;
        let required = parse_numeric(request.amount(), "amount")?;
        Ok(Some((token, spender, required)))
    }

    /// Approve the router when its allowance is below the swap amount and
    /// wait for the approval's receipt. Returns the approval hash if one was
    /// sent.
    async fn ensure_allowance(
        &self,
        request: &SwapRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        let Some((token, spender, required)) = self.approval_target(request).await? else {
            return Ok(None);
        };

        let allowance = self
            .rpc
            .erc20_allowance(token, self.signer.address(), spender)
            .await?;
        if allowance >= required {
            debug!(allowance = %allowance, "Router allowance sufficient");
            return Ok(None);
        }

        info!(
            token = request.from_token_address(),
            allowance = %allowance,
            required = %required,
            "Approving router to spend token"
        );
        let approval = self
            .approvals
            .get_approve_transaction(request.from_token_address(), request.amount())
            .await?;
        let gas_limit = self
            .gas
            .get_gas_limit(
                &self.wallet_address,
                request.from_token_address(),
                None,
                Some(&approval.data),
            )
            .await?;

        let order = self
            .submit(|nonce, fees| {
                self.builder.build_call(
                    &self.wallet_address,
                    request.from_token_address(),
                    &approval.data,
                    "0",
                    &gas_limit,
                    nonce,
                    fees,
                )
            })
            .await?;

        // Wait on the receipt itself, whichever path broadcast it
        let receipt_order = BroadcastOrder {
            order_id: OrderHandle::TxHash(order.tx_hash.clone()),
            ..order
        };
        if let Err(e) = self.tracker.track_with_cancel(&receipt_order, cancel).await {
            warn!(tx_hash = %receipt_order.tx_hash, error = %e, "Approval did not confirm");
            return Err(e);
        }
        info!(tx_hash = %receipt_order.tx_hash, "Approval confirmed");
        Ok(Some(receipt_order.tx_hash))
    }
}

fn parse_address(value: &str, field: &str) -> dex_core::Result<Address> {
    value
        .trim()
        .parse()
        .map_err(|e| dex_core::Error::invalid_request(format!("invalid {} address {:?}: {}", field, value, e)))
}

impl std::fmt::Debug for SwapExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapExecutor")
            .field("chain_index", &self.chain_index)
            .field("wallet_address", &self.wallet_address)
            .field("execution", &self.execution)
            .finish()
    }
}

/// Classify any pipeline error for display.
pub fn describe_error(error: &SwapError) -> String {
    let classified = error.classify();
    format!("{} (suggested action: {})", classified, classified.action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockRpc, ScriptedGateway, TEST_ADDRESS, TEST_PRIVATE_KEY};
    use dex_core::types::NATIVE_TOKEN_ADDRESS;
    use serde_json::json;

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
    const ROUTER: &str = "0x5E1f62Dac767b0491e3CE72469C217365D5B48cC";
    const APPROVE_TARGET: &str = "0x40aA958dd87FC8305b97f2BA922CDdCa374bcD7f";

    const SWAP: &str = "dex/aggregator/swap";
    const GAS_LIMIT: &str = "dex/pre-transaction/gas-limit";
    const SIMULATE: &str = "dex/pre-transaction/simulate";
    const BROADCAST: &str = "dex/pre-transaction/broadcast-transaction";
    const ORDERS: &str = "dex/post-transaction/orders";
    const SUPPORTED_CHAIN: &str = "dex/aggregator/supported/chain";
    const APPROVE: &str = "dex/aggregator/approve-transaction";

    fn config() -> Config {
        let mut config = Config::test_config();
        config.tracking.interval_ms = 5;
        config.tracking.timeout_ms = 5_000;
        config
    }

    fn wallet() -> TradingWallet {
        TradingWallet::from_private_key(TEST_PRIVATE_KEY).unwrap()
    }

    fn eth_to_usdc() -> SwapRequest {
        SwapRequest::new("1", NATIVE_TOKEN_ADDRESS, USDC, "100000000000000", "0.5").unwrap()
    }

    fn usdc_to_eth() -> SwapRequest {
        SwapRequest::new("1", USDC, NATIVE_TOKEN_ADDRESS, "1000000", "0.5").unwrap()
    }

    fn script_swap(gateway: &ScriptedGateway, value: &str) {
        gateway.ok(
            SWAP,
            json!([{
                "routerResult": {"toTokenAmount": "251234", "fromTokenAmount": "100000000000000"},
                "tx": {"from": TEST_ADDRESS, "to": ROUTER, "data": "0xabcdef", "value": value}
            }]),
        );
        gateway.ok(GAS_LIMIT, json!([{"gasLimit": "185000"}]));
    }

    fn market_rpc(nonces: Vec<u64>) -> MockRpc {
        let mut rpc = MockRpc::new();
        let mut nonces = nonces.into_iter();
        rpc.expect_get_pending_nonce()
            .returning(move |_| Ok(nonces.next().unwrap_or(99)));
        rpc.expect_get_fee_data()
            .returning(|| Ok(FeeData::from_market(Some(10_000_000_000), None, None)));
        rpc
    }

    fn executor(config: &Config, gateway: &Arc<ScriptedGateway>, rpc: MockRpc) -> SwapExecutor {
        SwapExecutor::new(config, gateway.client(), Arc::new(rpc), wallet()).unwrap()
    }

    #[tokio::test]
    async fn test_native_swap_confirms() {
        let gateway = ScriptedGateway::new();
        script_swap(&gateway, "100000000000000");
        gateway.ok(BROADCAST, json!([{"orderId": "ord-1"}]));
        gateway.ok(ORDERS, json!([{"orders": [{"orderId": "ord-1", "txStatus": "1"}]}]));
        gateway.ok(
            ORDERS,
            json!([{"orders": [{"orderId": "ord-1", "txHash": "0xfeed", "txStatus": "2"}]}]),
        );

        let (tx, mut rx) = mpsc::channel(8);
        let executor = executor(&config(), &gateway, market_rpc(vec![7])).with_updates(tx);
        let outcome = tokio_test::assert_ok!(executor.execute(&eth_to_usdc()).await);

        assert_eq!(outcome.order.order_id, OrderHandle::GatewayOrder("ord-1".into()));
        assert_eq!(outcome.to_token_amount, "251234");
        assert!(outcome.approval_tx_hash.is_none());
        assert_eq!(
            outcome.result,
            TrackingResult::Confirmed {
                tx_hash: "0xfeed".into(),
                explorer_url: "https://web3.okx.com/explorer/eth/tx/0xfeed".into(),
            }
        );
        assert_eq!(rx.recv().await, Some(TrackingResult::Pending(None)));

        let swap = &gateway.requests_to(SWAP)[0];
        assert!(swap.query.contains("slippagePercent=0.5"));
        assert!(swap.query.contains("chainIndex=1"));
        assert!(swap.query.contains(&format!("userWalletAddress={}", TEST_ADDRESS)));

        let broadcast: serde_json::Value =
            serde_json::from_str(gateway.requests_to(BROADCAST)[0].body.as_deref().unwrap())
                .unwrap();
        assert!(broadcast["signedTx"].as_str().unwrap().starts_with("0x02"));
        assert_eq!(broadcast["chainIndex"], "1");
        assert!(gateway.requests_to(SIMULATE).is_empty());
        assert!(gateway.requests_to(APPROVE).is_empty());
    }

    #[tokio::test]
    async fn test_simulation_failure_stops_before_signing() {
        let gateway = ScriptedGateway::new();
        script_swap(&gateway, "100000000000000");
        gateway.ok(SIMULATE, json!([{"failReason": "Too little received"}]));

        let mut config = config();
        config.execution.simulate_before_broadcast = true;
        // No nonce or fee expectations: reaching the node would panic
        let executor = executor(&config, &gateway, MockRpc::new());

        let err = executor.execute(&eth_to_usdc()).await.unwrap_err();
        let classified = err.classify();
        assert_eq!(classified.kind, "SIMULATION_FAILED");
        assert_eq!(
            classified.action,
            "Increase slippage tolerance or reduce the swap amount"
        );
        assert!(gateway.requests_to(GAS_LIMIT).is_empty());
        assert!(gateway.requests_to(BROADCAST).is_empty());
    }

    #[tokio::test]
    async fn test_failed_order_is_classified() {
        let gateway = ScriptedGateway::new();
        script_swap(&gateway, "100000000000000");
        gateway.ok(BROADCAST, json!([{"orderId": "ord-1"}]));
        gateway.ok(
            ORDERS,
            json!([{"orders": [{"orderId": "ord-1", "txStatus": "3", "failReason": "out of gas"}]}]),
        );

        let executor = executor(&config(), &gateway, market_rpc(vec![7]));
        match executor.execute(&eth_to_usdc()).await.unwrap_err() {
            SwapError::TransactionFailed(classified) => {
                assert_eq!(classified.kind, "TRANSACTION_FAILED");
                assert_eq!(classified.message, "out of gas");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gateway_rejection_falls_back_to_rpc() {
        let gateway = ScriptedGateway::new();
        script_swap(&gateway, "100000000000000");
        gateway.reject(BROADCAST, "81104", "Chain not supported");

        let mut rpc = market_rpc(vec![7]);
        rpc.expect_send_raw_transaction()
            .times(1)
            .returning(|_| Ok("0xbeef".to_string()));
        rpc.expect_get_transaction_receipt_status()
            .returning(|_| Ok(Some(true)));

        let executor = executor(&config(), &gateway, rpc);
        let outcome = executor.execute(&eth_to_usdc()).await.unwrap();

        assert_eq!(outcome.order.order_id, OrderHandle::TxHash("0xbeef".into()));
        assert!(matches!(outcome.result, TrackingResult::Confirmed { ref tx_hash, .. } if tx_hash == "0xbeef"));
        assert!(gateway.requests_to(ORDERS).is_empty());
    }

    #[tokio::test]
    async fn test_erc20_input_is_approved_first() {
        let gateway = ScriptedGateway::new();
        gateway.ok(
            SUPPORTED_CHAIN,
            json!([{"chainIndex": "1", "chainName": "Ethereum", "dexTokenApproveAddress": APPROVE_TARGET}]),
        );
        gateway.ok(APPROVE, json!([{"data": "0x095ea7b3", "dexContractAddress": APPROVE_TARGET}]));
        script_swap(&gateway, "0");
        gateway.ok(BROADCAST, json!([{"orderId": "approve-1"}]));
        gateway.ok(BROADCAST, json!([{"orderId": "swap-1"}]));
        gateway.ok(
            ORDERS,
            json!([{"orders": [{"orderId": "swap-1", "txHash": "0xswap", "txStatus": "2"}]}]),
        );

        let mut rpc = market_rpc(vec![7, 8]);
        rpc.expect_erc20_allowance()
            .withf(|token, _, spender| {
                *token == USDC.parse::<Address>().unwrap()
                    && *spender == APPROVE_TARGET.parse::<Address>().unwrap()
            })
            .times(1)
            .returning(|_, _, _| Ok(U256::ZERO));
        rpc.expect_get_transaction_receipt_status()
            .times(1)
            .returning(|_| Ok(Some(true)));

        let executor = executor(&config(), &gateway, rpc);
        let outcome = executor.execute(&usdc_to_eth()).await.unwrap();

        let approval_hash = outcome.approval_tx_hash.expect("approval sent");
        assert!(approval_hash.starts_with("0x"));
        assert_eq!(outcome.order.order_id, OrderHandle::GatewayOrder("swap-1".into()));

        let approve = &gateway.requests_to(APPROVE)[0];
        assert_eq!(
            approve.query,
            format!("?chainIndex=1&tokenContractAddress={}&approveAmount=1000000", USDC)
        );
        // Approval gas is estimated against the token with no value
        let approval_gas: serde_json::Value =
            serde_json::from_str(gateway.requests_to(GAS_LIMIT)[0].body.as_deref().unwrap())
                .unwrap();
        assert_eq!(approval_gas["toAddress"], USDC);
        assert_eq!(approval_gas["txAmount"], "0");
        assert_eq!(gateway.requests_to(BROADCAST).len(), 2);
    }

    #[tokio::test]
    async fn test_sufficient_allowance_skips_approval() {
        let gateway = ScriptedGateway::new();
        gateway.ok(
            SUPPORTED_CHAIN,
            json!([{"chainIndex": "1", "chainName": "Ethereum", "dexTokenApproveAddress": APPROVE_TARGET}]),
        );
        script_swap(&gateway, "0");
        gateway.ok(BROADCAST, json!([{"orderId": "swap-1"}]));
        gateway.ok(ORDERS, json!([{"orders": [{"orderId": "swap-1", "txStatus": "2"}]}]));

        let mut rpc = market_rpc(vec![7]);
        rpc.expect_erc20_allowance()
            .returning(|_, _, _| Ok(U256::from(1_000_000u64)));

        let executor = executor(&config(), &gateway, rpc);
        let outcome = executor.execute(&usdc_to_eth()).await.unwrap();

        assert!(outcome.approval_tx_hash.is_none());
        assert!(gateway.requests_to(APPROVE).is_empty());
        assert_eq!(gateway.requests_to(BROADCAST).len(), 1);
    }

    #[tokio::test]
    async fn test_simulate_only_never_broadcasts() {
        let gateway = ScriptedGateway::new();
        script_swap(&gateway, "100000000000000");
        gateway.ok(SIMULATE, json!([{"gasUsed": "150000", "assetChange": [], "risks": []}]));

        let executor = executor(&config(), &gateway, MockRpc::new());
        let report = executor.simulate_only(&eth_to_usdc()).await.unwrap();

        assert_eq!(report.gas_limit, "185000");
        assert_eq!(report.to_token_amount, "251234");
        assert_eq!(report.simulation.gas_used.as_deref(), Some("150000"));
        assert!(!report.needs_approval);
        assert!(gateway.requests_to(BROADCAST).is_empty());
    }

    #[tokio::test]
    async fn test_preflight_reports_chain_state() {
        let gateway = ScriptedGateway::new();
        gateway.ok(
            SUPPORTED_CHAIN,
            json!([{"chainIndex": 1, "chainName": "Ethereum", "dexTokenApproveAddress": APPROVE_TARGET}]),
        );
        let mut rpc = MockRpc::new();
        rpc.expect_get_block_number().returning(|| Ok(19_000_000));
        rpc.expect_get_balance()
            .returning(|_| Ok(U256::from(5_000_000_000_000_000u64)));

        let report = executor(&config(), &gateway, rpc).preflight().await.unwrap();
        assert_eq!(report.chain_name, "Ethereum");
        assert_eq!(report.block_number, 19_000_000);
        assert_eq!(report.native_balance_wei, "5000000000000000");
        assert_eq!(report.wallet_address, TEST_ADDRESS);
    }

    #[tokio::test]
    async fn test_cancel_stops_tracking() {
        let gateway = ScriptedGateway::new();
        script_swap(&gateway, "100000000000000");
        gateway.ok(BROADCAST, json!([{"orderId": "ord-1"}]));
        gateway.ok(ORDERS, json!([{"orders": [{"orderId": "ord-1", "txStatus": "1"}]}]));

        let executor = executor(&config(), &gateway, market_rpc(vec![7]));
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            canceller.cancel();
        });

        let err = executor
            .execute_with_cancel(&eth_to_usdc(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::Cancelled));
    }

    #[tokio::test]
    async fn test_request_for_other_chain_is_rejected() {
        let gateway = ScriptedGateway::new();
        script_swap(&gateway, "100000000000000");
        gateway.ok(BROADCAST, json!([{"orderId": "ord-1"}]));

        // No nonce or fee expectations: reaching the node would panic
        let executor = executor(&config(), &gateway, MockRpc::new());
        let base = SwapRequest::new("8453", NATIVE_TOKEN_ADDRESS, USDC, "100000000000000", "0.5")
            .unwrap();

        let err = executor.execute(&base).await.unwrap_err();
        assert_eq!(err.classify().kind, "INVALID_REQUEST");
        let err = executor.simulate_only(&base).await.unwrap_err();
        assert_eq!(err.classify().kind, "INVALID_REQUEST");

        assert!(gateway.requests_to(SWAP).is_empty());
        assert!(gateway.requests_to(BROADCAST).is_empty());
    }

    #[test]
    fn test_mismatched_wallet_address_is_config_error() {
        let mut config = config();
        config.chain.wallet_address = Some("0x70997970C51812dc3A010C7d01b50e0d17dc79C8".into());

        let gateway = ScriptedGateway::new();
        let err = SwapExecutor::new(&config, gateway.client(), Arc::new(MockRpc::new()), wallet())
            .unwrap_err();
        assert_eq!(err.classify().kind, "CONFIG_ERROR");
    }

    #[test]
    fn test_describe_error_includes_action() {
        let err = SwapError::Core(dex_core::Error::Api {
            code: "82000".into(),
            message: "Insufficient liquidity".into(),
        });
        let text = describe_error(&err);
        assert!(text.starts_with("INSUFFICIENT_LIQUIDITY: "));
        assert!(text.contains("suggested action"));
    }
}
