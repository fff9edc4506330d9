//! Swap requests and aggregator quotes.

use super::chain::is_native_token;
use super::lenient;
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A swap the caller wants executed. Validated on construction and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    chain_index: String,
    from_token_address: String,
    to_token_address: String,
    amount: String,
    slippage_percent: Decimal,
}

impl SwapRequest {
    /// Build a request.
    ///
    /// `amount` is in the from-token's base units and must be a plain
    /// non-negative integer literal. `slippage_percent` is a percentage in
    /// `(0, 100]`, e.g. `"0.5"`.
    pub fn new(
        chain_index: impl Into<String>,
        from_token_address: impl Into<String>,
        to_token_address: impl Into<String>,
        amount: impl Into<String>,
        slippage_percent: &str,
    ) -> Result<Self> {
        let amount = amount.into();
        validate_amount(&amount)?;
        let slippage_percent = parse_slippage(slippage_percent)?;

        let from_token_address = from_token_address.into();
        let to_token_address = to_token_address.into();
        if from_token_address.trim().is_empty() || to_token_address.trim().is_empty() {
            return Err(Error::invalid_request("token addresses must not be empty"));
        }

        Ok(Self {
            chain_index: chain_index.into(),
            from_token_address,
            to_token_address,
            amount,
            slippage_percent,
        })
    }

    pub fn chain_index(&self) -> &str {
        &self.chain_index
    }

    pub fn from_token_address(&self) -> &str {
        &self.from_token_address
    }

    pub fn to_token_address(&self) -> &str {
        &self.to_token_address
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn slippage_percent(&self) -> Decimal {
        self.slippage_percent
    }

    /// Whether the swap spends the chain's native token (no approval needed).
    pub fn is_native_input(&self) -> bool {
        is_native_token(&self.from_token_address)
    }
}

/// Check that `amount` is a non-negative base-unit integer literal.
pub fn validate_amount(amount: &str) -> Result<()> {
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_request(format!(
            "amount must be a non-negative integer literal, got {:?}",
            amount
        )));
    }
    Ok(())
}

/// Whether a validated amount literal is zero.
pub fn is_zero_amount(amount: &str) -> bool {
    amount.bytes().all(|b| b == b'0')
}

/// Parse a slippage percentage and check it lies in `(0, 100]`.
pub fn parse_slippage(slippage_percent: &str) -> Result<Decimal> {
    let value: Decimal = slippage_percent.trim().parse().map_err(|_| {
        Error::invalid_request(format!("invalid slippage percent {:?}", slippage_percent))
    })?;
    if value <= Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(Error::invalid_request(format!(
            "slippage percent must be in (0, 100], got {}",
            value
        )));
    }
    Ok(value)
}

/// Transaction fields returned by the swap endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTx {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub data: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub value: String,
    /// Gateway's own gas hint. The pipeline re-estimates instead of trusting it.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub gas: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub gas_price: Option<String>,
}

impl QuoteTx {
    /// Transferred native value; the gateway omits it for token-to-token swaps.
    pub fn value_or_zero(&self) -> &str {
        if self.value.trim().is_empty() {
            "0"
        } else {
            &self.value
        }
    }
}

/// Token metadata attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenInfo {
    pub token_symbol: String,
    pub token_contract_address: String,
    #[serde(deserialize_with = "lenient::string")]
    pub decimal: String,
}

/// Price summary of a route (the quote endpoint's payload and the swap
/// endpoint's `routerResult`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteSummary {
    #[serde(deserialize_with = "lenient::string")]
    pub from_token_amount: String,
    #[serde(deserialize_with = "lenient::string")]
    pub to_token_amount: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub estimate_gas_fee: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub price_impact_percentage: Option<String>,
    pub from_token: Option<TokenInfo>,
    pub to_token: Option<TokenInfo>,
    #[serde(alias = "routerList")]
    pub dex_router_list: Vec<serde_json::Value>,
}

/// A priced swap route with the transaction that executes it.
///
/// Produced by the quote service and consumed once by the transaction
/// builder (see [`Quote::into_tx`]).
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawSwapData")]
pub struct Quote {
    pub tx: QuoteTx,
    pub to_token_amount: String,
    pub to_token_decimal: Option<String>,
    pub from_token_amount: Option<String>,
    pub router_list: Vec<serde_json::Value>,
}

impl Quote {
    /// Give up the quote for its transaction.
    pub fn into_tx(self) -> QuoteTx {
        self.tx
    }
}

/// Wire shape of the swap endpoint. Newer API versions nest the price data
/// under `routerResult`; older ones put it at the top level.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSwapData {
    tx: QuoteTx,
    #[serde(default)]
    router_result: Option<RouteSummary>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    to_token_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    to_token_decimal: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    from_token_amount: Option<String>,
    #[serde(default)]
    router_list: Vec<serde_json::Value>,
}

impl From<RawSwapData> for Quote {
    fn from(raw: RawSwapData) -> Self {
        match raw.router_result {
            Some(route) => Self {
                tx: raw.tx,
                to_token_amount: raw.to_token_amount.unwrap_or(route.to_token_amount),
                to_token_decimal: raw
                    .to_token_decimal
                    .or_else(|| route.to_token.map(|t| t.decimal)),
                from_token_amount: raw
                    .from_token_amount
                    .or(Some(route.from_token_amount).filter(|s| !s.is_empty())),
                router_list: if raw.router_list.is_empty() {
                    route.dex_router_list
                } else {
                    raw.router_list
                },
            },
            None => Self {
                tx: raw.tx,
                to_token_amount: raw.to_token_amount.unwrap_or_default(),
                to_token_decimal: raw.to_token_decimal,
                from_token_amount: raw.from_token_amount,
                router_list: raw.router_list,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NATIVE_TOKEN_ADDRESS;

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    #[test]
    fn test_swap_request_validation() {
        let request =
            SwapRequest::new("1", NATIVE_TOKEN_ADDRESS, USDC, "100000000000000", "0.5").unwrap();
        assert_eq!(request.amount(), "100000000000000");
        assert_eq!(request.slippage_percent(), Decimal::new(5, 1));
        assert!(request.is_native_input());

        assert!(SwapRequest::new("1", NATIVE_TOKEN_ADDRESS, USDC, "-1", "0.5").is_err());
        assert!(SwapRequest::new("1", NATIVE_TOKEN_ADDRESS, USDC, "1.5", "0.5").is_err());
        assert!(SwapRequest::new("1", NATIVE_TOKEN_ADDRESS, USDC, "", "0.5").is_err());
        assert!(SwapRequest::new("1", NATIVE_TOKEN_ADDRESS, USDC, "0x10", "0.5").is_err());
        assert!(SwapRequest::new("1", "", USDC, "1", "0.5").is_err());
    }

    #[test]
    fn test_slippage_bounds() {
        assert!(parse_slippage("0").is_err());
        assert!(parse_slippage("-0.1").is_err());
        assert!(parse_slippage("100.01").is_err());
        assert!(parse_slippage("abc").is_err());
        assert_eq!(parse_slippage("100").unwrap(), Decimal::ONE_HUNDRED);
        assert_eq!(parse_slippage(" 0.05 ").unwrap(), Decimal::new(5, 2));
    }

    #[test]
    fn test_zero_amount() {
        assert!(is_zero_amount("0"));
        assert!(is_zero_amount("000"));
        assert!(!is_zero_amount("10"));
    }

    #[test]
    fn test_quote_from_nested_router_result() {
        let json = serde_json::json!({
            "routerResult": {
                "fromTokenAmount": "100000000000000",
                "toTokenAmount": "381215",
                "dexRouterList": [{"router": "Uniswap V3"}],
                "toToken": {"tokenSymbol": "USDC", "decimal": "6", "tokenContractAddress": USDC}
            },
            "tx": {
                "from": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                "to": "0x5E1f62Dac767b0491e3CE72469C217365D5B48cC",
                "data": "0xabcdef",
                "value": "100000000000000",
                "gas": 185000
            }
        });

        let quote: Quote = serde_json::from_value(json).unwrap();
        assert_eq!(quote.to_token_amount, "381215");
        assert_eq!(quote.to_token_decimal.as_deref(), Some("6"));
        assert_eq!(quote.from_token_amount.as_deref(), Some("100000000000000"));
        assert_eq!(quote.router_list.len(), 1);
        assert_eq!(quote.tx.gas.as_deref(), Some("185000"));
        assert_eq!(quote.into_tx().value_or_zero(), "100000000000000");
    }

    #[test]
    fn test_quote_from_flat_payload() {
        let json = serde_json::json!({
            "toTokenAmount": "999",
            "toTokenDecimal": 6,
            "routerList": [{"router": "a"}, {"router": "b"}],
            "tx": {"from": "0x1", "to": "0x2", "data": "0x"}
        });

        let quote: Quote = serde_json::from_value(json).unwrap();
        assert_eq!(quote.to_token_amount, "999");
        assert_eq!(quote.to_token_decimal.as_deref(), Some("6"));
        assert_eq!(quote.router_list.len(), 2);
        assert_eq!(quote.tx.value_or_zero(), "0");
    }
}
