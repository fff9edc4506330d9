//! Per-wallet serialization of nonce acquisition.
//!
//! A swap holds its wallet's lock from the pending-nonce read until the
//! signed transaction has been handed to the broadcaster, so two swaps on
//! the same wallet can never sign with the same nonce. Nonces themselves are
//! never cached: each holder reads the chain's pending count afresh.

use alloy_primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct WalletLocks {
    locks: Arc<DashMap<Address, Arc<Mutex<()>>>>,
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `wallet`'s nonce sequence.
    pub async fn acquire(&self, wallet: Address) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the map shard is not held across the await
        let lock = self.locks.entry(wallet).or_default().clone();
        let guard = lock.lock_owned().await;
        debug!(wallet = %wallet, "Acquired wallet nonce lock");
        guard
    }

    /// Number of wallets seen so far.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const WALLET_A: Address = Address::repeat_byte(0xaa);
    const WALLET_B: Address = Address::repeat_byte(0xbb);

    #[tokio::test]
    async fn test_same_wallet_is_serialized() {
        let locks = WalletLocks::new();
        let guard = locks.acquire(WALLET_A).await;

        let contender = locks.clone();
        let mut waiting = tokio::spawn(async move {
            let _guard = contender.acquire(WALLET_A).await;
        });

        assert!(
            tokio::time::timeout(Duration::from_millis(50), &mut waiting)
                .await
                .is_err(),
            "second acquire must wait for the first guard"
        );

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_wallets_are_independent() {
        let locks = WalletLocks::new();
        let _a = locks.acquire(WALLET_A).await;

        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(WALLET_B)).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }
}
