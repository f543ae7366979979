//! One bounded moka cache per experiment.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use exprvec_core::config::{CacheConfig, EvictionPolicyKind};
use exprvec_core::errors::CacheError;
use exprvec_core::{DecodedVector, ExperimentId, GeneId};

use crate::stats::Counters;

/// Gene → vector collection map for a single experiment.
///
/// Collections are stored as immutable `Arc<[DecodedVector]>`, so a reader
/// always observes a whole collection. Once detached (by invalidation) the
/// partition accepts no more writes.
pub(crate) struct Partition {
    experiment: ExperimentId,
    entries: Cache<GeneId, Arc<[DecodedVector]>>,
    detached: AtomicBool,
}

impl Partition {
    pub(crate) fn new(experiment: ExperimentId, config: &CacheConfig) -> Self {
        let policy = match config.eviction_policy {
            EvictionPolicyKind::Lru => EvictionPolicy::lru(),
            EvictionPolicyKind::TinyLfu => EvictionPolicy::tiny_lfu(),
        };
        let mut builder = Cache::builder()
            .max_capacity(config.max_entries_per_partition)
            .eviction_policy(policy);
        if let Some(ttl) = config.time_to_live() {
            builder = builder.time_to_live(ttl);
        }
        if let Some(tti) = config.time_to_idle() {
            builder = builder.time_to_idle(tti);
        }

        Self {
            experiment,
            entries: builder.build(),
            detached: AtomicBool::new(false),
        }
    }

    pub(crate) fn experiment(&self) -> ExperimentId {
        self.experiment
    }

    /// A detached partition always misses, even for a write that raced
    /// the detach.
    pub(crate) fn lookup(&self, gene: GeneId) -> Option<Vec<DecodedVector>> {
        let collection = self.entries.get(&gene)?;
        if self.is_detached() {
            return None;
        }
        Some(collection.to_vec())
    }

    /// Insert a collection. Returns `Ok(false)` if the partition is detached.
    ///
    /// Transient annotations are cleared before the collection becomes shared.
    pub(crate) fn store(
        &self,
        gene: GeneId,
        mut vectors: Vec<DecodedVector>,
    ) -> Result<bool, CacheError> {
        if let Some(stray) = vectors.iter().find(|v| v.experiment != self.experiment) {
            return Err(CacheError::Inconsistency {
                experiment: self.experiment,
                details: format!(
                    "vector for probe {} belongs to experiment {}",
                    stray.probe, stray.experiment
                ),
            });
        }
        if self.is_detached() {
            return Ok(false);
        }
        vectors.iter_mut().for_each(DecodedVector::clear_transient);
        self.entries.insert(gene, Arc::from(vectors));
        Ok(true)
    }

    pub(crate) fn entries_contains(&self, gene: GeneId) -> bool {
        self.entries.contains_key(&gene)
    }

    pub(crate) fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
        self.entries.invalidate_all();
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    pub(crate) fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

/// A caller's view of one experiment partition, fixed at acquisition time.
///
/// Writes through a handle whose partition has since been invalidated are
/// silently dropped, which keeps data read before a rebuild out of the cache
/// after it.
#[derive(Clone)]
pub struct PartitionHandle {
    pub(crate) partition: Arc<Partition>,
    pub(crate) counters: Arc<Counters>,
}

impl PartitionHandle {
    pub fn experiment(&self) -> ExperimentId {
        self.partition.experiment()
    }

    /// Whether this handle still points at the live partition.
    pub fn is_current(&self) -> bool {
        !self.partition.is_detached()
    }

    pub fn get(&self, gene: GeneId) -> Option<Vec<DecodedVector>> {
        let found = self.partition.lookup(gene);
        if found.is_some() {
            self.counters.hit();
        } else {
            self.counters.miss();
        }
        found
    }

    /// Store a collection; `Ok(false)` means the write was discarded because
    /// the partition was invalidated after this handle was acquired.
    pub fn put(&self, gene: GeneId, vectors: Vec<DecodedVector>) -> Result<bool, CacheError> {
        let stored = self.partition.store(gene, vectors)?;
        if stored {
            self.counters.put();
        } else {
            self.counters.stale_put();
        }
        Ok(stored)
    }
}
