use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use tokio::sync::RwLock;

use crate::contract::OracleIndexes;

/// Indices the contract assigned to each oracle this process registered.
#[derive(Clone, Default)]
pub struct OracleRegistry {
    inner: Arc<RwLock<HashMap<Address, OracleIndexes>>>,
}

impl OracleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, oracle: Address, indexes: OracleIndexes) {
        self.inner.write().await.insert(oracle, indexes);
    }

    pub async fn indexes(&self, oracle: &Address) -> Option<OracleIndexes> {
        self.inner.read().await.get(oracle).copied()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Oracles whose indices include `index`.
    pub async fn oracles_for(&self, index: u8) -> Vec<Address> {
        self.inner
            .read()
            .await
            .iter()
            .filter(|(_, indexes)| indexes.contains(&index))
            .map(|(oracle, _)| *oracle)
            .collect()
    }
}
