//! Id resolution from a fixed table

use crate::domain::types::{NodeId, TaxonId};
use crate::io::ports::IdResolver;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::time::Duration;
use tracing::debug;

/// Resolves taxon ids from a table, optionally after a simulated lookup delay
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    table: FxHashMap<TaxonId, NodeId>,
    latency: Duration,
}

impl StaticResolver {
    pub fn new(table: FxHashMap<TaxonId, NodeId>) -> Self {
        Self {
            table,
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl IdResolver for StaticResolver {
    async fn resolve(&self, ids: Vec<TaxonId>) -> FxHashMap<TaxonId, NodeId> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let resolved: FxHashMap<TaxonId, NodeId> = ids
            .iter()
            .filter_map(|id| self.table.get(id).map(|node| (*id, *node)))
            .collect();
        debug!(requested = ids.len(), resolved = resolved.len(), "ids_resolved");
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_ids_are_left_out() {
        let mut table = FxHashMap::default();
        table.insert(TaxonId(770315), NodeId(1234));
        let resolver = StaticResolver::new(table);

        let resolved = resolver.resolve(vec![TaxonId(770315), TaxonId(1)]).await;
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.get(&TaxonId(770315)), Some(&NodeId(1234)));
    }
}
