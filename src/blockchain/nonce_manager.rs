// src/blockchain/nonce_manager.rs

use std::sync::Arc;

use dashmap::DashMap;
use ethers_core::types::{Address, U256};
use tokio::sync::Mutex;

use crate::blockchain::rpc::RpcClient;
use crate::providers::ProviderError;

/// Hands out sequential nonces per sender so concurrent writes from the same
/// key do not collide.
#[derive(Debug, Clone, Default)]
pub struct NonceManager {
    // Different senders never contend; the same sender is serialized by its Mutex.
    nonces: Arc<DashMap<Address, Arc<Mutex<Option<U256>>>>>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, address: Address) -> Arc<Mutex<Option<U256>>> {
        self.nonces
            .entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Returns the nonce to use now and remembers the one after it. The
    /// first call for an address asks the node.
    pub async fn get_next_nonce(
        &self,
        address: Address,
        rpc: &RpcClient,
    ) -> Result<U256, ProviderError> {
        let slot = self.slot(address);
        let mut next = slot.lock().await;

        let nonce = match *next {
            Some(n) => n,
            None => rpc.transaction_count(address).await?,
        };
        *next = Some(nonce + U256::one());
        Ok(nonce)
    }

    /// Drops the cached nonce so the next call re-reads it from the node.
    /// Used after a failed submission, where the reserved nonce was never spent.
    pub async fn reset(&self, address: Address) {
        let slot = self.slot(address);
        *slot.lock().await = None;
    }
}
