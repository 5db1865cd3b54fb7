use crate::{Result as StoreErrorResult, StorePool};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::gauge;

/// Something whose size can be reported.
#[async_trait]
pub trait Counter: Send + Sync {
    async fn count(&self) -> StoreErrorResult<u64>;
}

/// Publishes the sizes of named collections as gauges.
#[derive(Default, Clone)]
pub struct CollectionMonitor {
    counters: BTreeMap<String, Arc<dyn Counter>>,
}

impl CollectionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter(mut self, name: impl Into<String>, counter: Arc<dyn Counter>) -> Self {
        self.counters.insert(name.into(), counter);
        self
    }

    /// Current size of every collection, ordered by name.
    pub async fn collect(&self) -> StoreErrorResult<Vec<(String, u64)>> {
        let mut sizes = Vec::with_capacity(self.counters.len());
        for (name, counter) in &self.counters {
            sizes.push((name.clone(), counter.count().await?));
        }
        Ok(sizes)
    }

    /// Collect and publish as `idm.collection.size{collection=<name>}`.
    pub async fn report(&self) -> StoreErrorResult<()> {
        for (name, size) in self.collect().await? {
            gauge!("idm.collection.size", "collection" => name).set(size as f64);
        }
        Ok(())
    }
}

/// Counts stored identities using a session outside the pool limit.
pub struct IdentityCounter {
    pool: StorePool,
}

impl IdentityCounter {
    pub fn new(pool: StorePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Counter for IdentityCounter {
    async fn count(&self) -> StoreErrorResult<u64> {
        let mut store = self.pool.get_no_limit().await?;
        store.count_identities().await
    }
}
