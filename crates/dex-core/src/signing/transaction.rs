//! Unsigned transaction construction from quote data and live chain state.

use crate::types::QuoteTx;
use crate::{Error, Result};
use alloy_primitives::{Address, Bytes, U256};

/// Priority fee used when the node cannot suggest one (2.5 gwei).
pub const DEFAULT_PRIORITY_FEE_WEI: u128 = 2_500_000_000;

/// Fee market snapshot read from the chain node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeData {
    pub base_fee_per_gas: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub gas_price: Option<u128>,
}

impl FeeData {
    /// Derive fee caps from raw market readings.
    ///
    /// With a base fee: `max_fee = 2 * base_fee + priority`, where priority
    /// falls back to [`DEFAULT_PRIORITY_FEE_WEI`]. Without one, only the
    /// legacy gas price is usable.
    pub fn from_market(
        base_fee_per_gas: Option<u128>,
        max_priority_fee_per_gas: Option<u128>,
        gas_price: Option<u128>,
    ) -> Self {
        match base_fee_per_gas {
            Some(base_fee) => {
                let priority = max_priority_fee_per_gas.unwrap_or(DEFAULT_PRIORITY_FEE_WEI);
                Self {
                    base_fee_per_gas: Some(base_fee),
                    max_fee_per_gas: Some(base_fee.saturating_mul(2).saturating_add(priority)),
                    max_priority_fee_per_gas: Some(priority),
                    gas_price,
                }
            }
            None => Self {
                gas_price,
                ..Self::default()
            },
        }
    }

    /// Pick the pricing mode: fee market when available, legacy otherwise.
    #[allow(clippy::result_large_err)]
    pub fn fee_mode(&self) -> Result<FeeMode> {
        match (
            self.max_fee_per_gas,
            self.max_priority_fee_per_gas,
            self.gas_price,
        ) {
            (Some(max_fee_per_gas), Some(max_priority_fee_per_gas), _) => Ok(FeeMode::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            }),
            (_, _, Some(gas_price)) => Ok(FeeMode::Legacy { gas_price }),
            _ => Err(Error::signing("no fee data available")),
        }
    }
}

/// Transaction pricing. One mode per transaction, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeMode {
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
    Legacy {
        gas_price: u128,
    },
}

/// A fully specified transaction ready for offline signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_limit: u64,
    pub nonce: u64,
    pub chain_id: u64,
    pub fees: FeeMode,
}

impl UnsignedTransaction {
    /// JSON-RPC style view with hex quantities.
    pub fn to_json(&self) -> serde_json::Value {
        let mut json = serde_json::json!({
            "from": format!("{:?}", self.from),
            "to": format!("{:?}", self.to),
            "data": self.data.to_string(),
            "value": format!("0x{:x}", self.value),
            "gas": format!("{:#x}", self.gas_limit),
            "nonce": format!("{:#x}", self.nonce),
            "chainId": format!("{:#x}", self.chain_id),
        });
        if let serde_json::Value::Object(map) = &mut json {
            match self.fees {
                FeeMode::Eip1559 {
                    max_fee_per_gas,
                    max_priority_fee_per_gas,
                } => {
                    map.insert("maxFeePerGas".into(), format!("{:#x}", max_fee_per_gas).into());
                    map.insert(
                        "maxPriorityFeePerGas".into(),
                        format!("{:#x}", max_priority_fee_per_gas).into(),
                    );
                }
                FeeMode::Legacy { gas_price } => {
                    map.insert("gasPrice".into(), format!("{:#x}", gas_price).into());
                }
            }
        }
        json
    }
}

/// Builds transactions for one chain.
#[derive(Debug, Clone, Copy)]
pub struct TransactionBuilder {
    chain_id: u64,
}

impl TransactionBuilder {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Build the swap transaction. Takes the quote's transaction by value so
    /// a quote is spent once.
    #[allow(clippy::result_large_err)]
    pub fn build(
        &self,
        tx: QuoteTx,
        gas_limit: &str,
        nonce: u64,
        fee_data: &FeeData,
    ) -> Result<UnsignedTransaction> {
        self.build_call(&tx.from, &tx.to, &tx.data, tx.value_or_zero(), gas_limit, nonce, fee_data)
    }

    /// Build an arbitrary contract call (used for token approvals).
    #[allow(clippy::too_many_arguments, clippy::result_large_err)]
    pub fn build_call(
        &self,
        from: &str,
        to: &str,
        data: &str,
        value: &str,
        gas_limit: &str,
        nonce: u64,
        fee_data: &FeeData,
    ) -> Result<UnsignedTransaction> {
        let gas_limit = parse_numeric(gas_limit, "gas limit")?;
        let gas_limit = u64::try_from(gas_limit)
            .map_err(|_| Error::signing(format!("gas limit {} does not fit in u64", gas_limit)))?;

        Ok(UnsignedTransaction {
            from: parse_address(from, "from")?,
            to: parse_address(to, "to")?,
            data: parse_data(data)?,
            value: parse_numeric(value, "value")?,
            gas_limit,
            nonce,
            chain_id: self.chain_id,
            fees: fee_data.fee_mode()?,
        })
    }
}

/// Parse a decimal or `0x` hex integer.
#[allow(clippy::result_large_err)]
pub fn parse_numeric(value: &str, field: &str) -> Result<U256> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::signing(format!("{} is missing", field)));
    }
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some("") => Ok(U256::ZERO),
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(trimmed, 10),
    };
    parsed.map_err(|e| Error::signing(format!("invalid {} {:?}: {}", field, value, e)))
}

#[allow(clippy::result_large_err)]
fn parse_address(value: &str, field: &str) -> Result<Address> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::signing(format!("invalid {} address {:?}: {}", field, value, e)))
}

#[allow(clippy::result_large_err)]
fn parse_data(value: &str) -> Result<Bytes> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(Bytes::new());
    }
    trimmed
        .parse()
        .map_err(|e| Error::signing(format!("invalid calldata: {}", e)))
}
