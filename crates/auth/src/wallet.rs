//! The swap wallet.
//!
//! Holds the private key that signs swap and approval transactions offline.
//! Only the serialized signed transaction ever leaves the process.

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{bail, Context, Result};

/// Environment variable holding the wallet's private key.
pub const PRIVATE_KEY_VAR: &str = "EVM_PRIVATE_KEY";

#[derive(Clone)]
pub struct TradingWallet {
    signer: PrivateKeySigner,
}

impl TradingWallet {
    /// Load the key from `EVM_PRIVATE_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the key through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(PRIVATE_KEY_VAR) {
            Some(key) if !key.trim().is_empty() => Self::from_private_key(&key),
            _ => bail!("{} is not set", PRIVATE_KEY_VAR),
        }
    }

    /// Parse a 32-byte hex key, with or without a `0x` prefix.
    pub fn from_private_key(key: &str) -> Result<Self> {
        let key = key.trim();
        let hex = key.strip_prefix("0x").unwrap_or(key);
        let signer: PrivateKeySigner = hex
            .parse()
            .context("Wallet private key must be 64 hex characters")?;
        Ok(Self { signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// EIP-55 checksummed address, as the gateway expects it.
    pub fn address_string(&self) -> String {
        self.address().to_checksum(None)
    }

    /// Fail unless `expected` is this key's address (any letter case).
    pub fn ensure_address(&self, expected: &str) -> Result<()> {
        let expected: Address = expected
            .trim()
            .parse()
            .with_context(|| format!("Invalid wallet address: {}", expected))?;
        let actual = self.address();
        if expected != actual {
            bail!(
                "Configured wallet address {} does not match private key address {}",
                expected,
                actual
            );
        }
        Ok(())
    }

    /// Hand the key to a transaction signer.
    pub fn into_signer(self) -> PrivateKeySigner {
        self.signer
    }
}

impl std::fmt::Debug for TradingWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Address only, never key material
        f.debug_struct("TradingWallet")
            .field("address", &self.address_string())
            .finish()
    }
}
