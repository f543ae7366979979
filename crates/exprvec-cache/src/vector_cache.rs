//! VectorCache: the injected, experiment-partitioned cache service.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use exprvec_core::config::CacheConfig;
use exprvec_core::errors::CacheError;
use exprvec_core::{DecodedVector, ExperimentId, GeneId};

use crate::partition::{Partition, PartitionHandle};
use crate::stats::{CacheStats, Counters};

/// Gene-keyed decoded-vector cache, one bounded partition per experiment.
///
/// Created once at process start and handed to the components that need
/// it; [`VectorCache::shutdown`] drops everything at teardown.
pub struct VectorCache {
    partitions: DashMap<ExperimentId, Arc<Partition>>,
    config: CacheConfig,
    counters: Arc<Counters>,
}

impl VectorCache {
    pub fn new(config: CacheConfig) -> Self {
        debug!(
            max_entries = config.max_entries_per_partition,
            ttl_secs = config.time_to_live_secs,
            tti_secs = config.time_to_idle_secs,
            policy = ?config.eviction_policy,
            "vector cache initialized"
        );
        Self {
            partitions: DashMap::new(),
            config,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Acquire a handle on the experiment's current partition, creating it
    /// if needed.
    pub fn partition(&self, experiment: ExperimentId) -> PartitionHandle {
        let partition = self
            .partitions
            .entry(experiment)
            .or_insert_with(|| Arc::new(Partition::new(experiment, &self.config)))
            .value()
            .clone();
        PartitionHandle {
            partition,
            counters: Arc::clone(&self.counters),
        }
    }

    /// Look up the vectors cached for `gene` in `experiment`.
    pub fn get(&self, experiment: ExperimentId, gene: GeneId) -> Option<Vec<DecodedVector>> {
        // Clone the Arc out so the map shard lock is not held during lookup.
        let partition = self.partitions.get(&experiment).map(|p| Arc::clone(p.value()));
        let found = partition.and_then(|p| p.lookup(gene));
        if found.is_some() {
            self.counters.hit();
        } else {
            self.counters.miss();
        }
        found
    }

    /// Look up several genes against one consistent partition snapshot.
    /// Returns the hits and the genes that missed, in input order.
    pub fn get_many(
        &self,
        experiment: ExperimentId,
        genes: &[GeneId],
    ) -> (HashMap<GeneId, Vec<DecodedVector>>, Vec<GeneId>) {
        let handle = self.partitions.get(&experiment).map(|p| Arc::clone(p.value()));
        let mut hits = HashMap::new();
        let mut misses = Vec::new();
        for &gene in genes {
            match handle.as_ref().and_then(|p| p.lookup(gene)) {
                Some(vectors) => {
                    self.counters.hit();
                    hits.insert(gene, vectors);
                }
                None => {
                    self.counters.miss();
                    misses.push(gene);
                }
            }
        }
        (hits, misses)
    }

    /// Store `vectors` under (`experiment`, `gene`) in the live partition.
    pub fn put(
        &self,
        experiment: ExperimentId,
        gene: GeneId,
        vectors: Vec<DecodedVector>,
    ) -> Result<(), CacheError> {
        // A concurrent invalidation between acquiring and storing detaches
        // the partition; the write is then dropped, which is a miss later.
        self.partition(experiment).put(gene, vectors)?;
        Ok(())
    }

    /// Drop the experiment's whole partition. Returns whether one existed.
    pub fn invalidate(&self, experiment: ExperimentId) -> bool {
        match self.partitions.remove(&experiment) {
            Some((_, partition)) => {
                partition.detach();
                self.counters.partition_invalidated();
                debug!(experiment = %experiment, "cache partition invalidated");
                true
            }
            None => false,
        }
    }

    /// Drop every partition.
    pub fn invalidate_all(&self) {
        let experiments: Vec<ExperimentId> = self.partitions.iter().map(|e| *e.key()).collect();
        let mut dropped = 0usize;
        for experiment in experiments {
            if let Some((_, partition)) = self.partitions.remove(&experiment) {
                partition.detach();
                dropped += 1;
            }
        }
        self.counters.fully_invalidated();
        info!(partitions = dropped, "vector cache cleared");
    }

    pub fn contains(&self, experiment: ExperimentId, gene: GeneId) -> bool {
        self.partitions
            .get(&experiment)
            .is_some_and(|p| p.entries_contains(gene))
    }

    /// Number of gene entries cached for the experiment.
    pub fn partition_len(&self, experiment: ExperimentId) -> u64 {
        let partition = self.partitions.get(&experiment).map(|p| Arc::clone(p.value()));
        partition.map_or(0, |p| p.entry_count())
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.partitions.len())
    }

    /// Tear down: drop all partitions.
    pub fn shutdown(&self) {
        self.invalidate_all();
        info!("vector cache shut down");
    }
}

impl Default for VectorCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
