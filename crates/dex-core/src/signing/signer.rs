//! Offline transaction signing.
//!
//! Transactions are signed locally with the wallet key and encoded as
//! EIP-2718 envelopes. Signatures are RFC 6979 deterministic, so the same
//! transaction and key always yield the same raw bytes.

use super::transaction::{FeeMode, UnsignedTransaction};
use crate::{Error, Result};
use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_network::TxSignerSync;
use alloy_primitives::{keccak256, Address, TxKind};
use alloy_signer_local::PrivateKeySigner;
use tracing::debug;

/// A signed transaction. Owned by whoever submits it.
#[derive(Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// `0x`-prefixed EIP-2718 encoding.
    pub raw_transaction_hex: String,
    /// `0x`-prefixed keccak256 of the encoding.
    pub transaction_hash: String,
}

/// Signs transactions for a single wallet.
#[derive(Clone)]
pub struct TransactionSigner {
    signer: PrivateKeySigner,
}

impl TransactionSigner {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign `tx`. Fails if `tx.from` is not this signer's address.
    #[allow(clippy::result_large_err)]
    pub fn sign(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction> {
        if tx.from != self.address() {
            return Err(Error::signing(format!(
                "transaction sender {} does not match signer {}",
                tx.from,
                self.address()
            )));
        }

        let envelope = match tx.fees {
            FeeMode::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                let mut inner = TxEip1559 {
                    chain_id: tx.chain_id,
                    nonce: tx.nonce,
                    gas_limit: tx.gas_limit,
                    max_fee_per_gas,
                    max_priority_fee_per_gas,
                    to: TxKind::Call(tx.to),
                    value: tx.value,
                    access_list: Default::default(),
                    input: tx.data.clone(),
                };
                let signature = self
                    .signer
                    .sign_transaction_sync(&mut inner)
                    .map_err(|e| Error::signing(format!("Failed to sign transaction: {}", e)))?;
                TxEnvelope::from(inner.into_signed(signature))
            }
            FeeMode::Legacy { gas_price } => {
                let mut inner = TxLegacy {
                    chain_id: Some(tx.chain_id),
                    nonce: tx.nonce,
                    gas_price,
                    gas_limit: tx.gas_limit,
                    to: TxKind::Call(tx.to),
                    value: tx.value,
                    input: tx.data.clone(),
                };
                let signature = self
                    .signer
                    .sign_transaction_sync(&mut inner)
                    .map_err(|e| Error::signing(format!("Failed to sign transaction: {}", e)))?;
                TxEnvelope::from(inner.into_signed(signature))
            }
        };

        let encoded = envelope.encoded_2718();
        let transaction_hash = format!("{:?}", keccak256(&encoded));
        debug!(tx_hash = %transaction_hash, nonce = tx.nonce, "Transaction signed");

        Ok(SignedTransaction {
            raw_transaction_hex: format!("0x{}", hex::encode(&encoded)),
            transaction_hash,
        })
    }
}

impl std::fmt::Debug for TransactionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSigner")
            .field("address", &self.address())
            .finish()
    }
}
