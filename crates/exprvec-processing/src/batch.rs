//! BatchRetriever: bounded-size round trips to the backing store.
//!
//! Probe sets are deduplicated, sorted, and cut into fixed-size batches.
//! Batches may run concurrently on the rayon pool; the merged result is the
//! same as one unbatched load. Any failed batch fails the whole fetch.

use std::collections::BTreeSet;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use exprvec_core::config::RetrievalConfig;
use exprvec_core::errors::ExprResult;
use exprvec_core::{
    Cancellation, DescriptorFilter, ExperimentId, GeneId, IVectorStore, ProbeId, ProcessedVector,
    RawVector,
};
use exprvec_observability::batch_span;

/// A fetched vector with the genes annotated to its probe.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<V> {
    pub vector: V,
    pub genes: BTreeSet<GeneId>,
}

/// Fetches vectors for a probe set across a set of experiments.
pub struct BatchRetriever {
    store: Arc<dyn IVectorStore>,
    batch_size: usize,
    parallel: bool,
}

impl BatchRetriever {
    pub fn new(store: Arc<dyn IVectorStore>, config: &RetrievalConfig) -> Self {
        Self {
            store,
            batch_size: config.effective_batch_size(),
            parallel: config.parallel_batches,
        }
    }

    /// Use an exact batch size, bypassing the configured clamp.
    pub fn with_batch_size(store: Arc<dyn IVectorStore>, batch_size: usize, parallel: bool) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            parallel,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Raw vectors matching `filter`, for every probe and experiment.
    pub fn fetch_raw(
        &self,
        probes: &[ProbeId],
        experiments: &[ExperimentId],
        filter: DescriptorFilter,
        cancel: &Cancellation,
    ) -> ExprResult<Vec<RawVector>> {
        let mut vectors = self.batched(probes, cancel, |batch| {
            self.store.load_raw_vectors(batch, experiments, filter)
        })?;
        vectors.sort_by_key(|v| (v.experiment, v.probe, v.descriptor));
        Ok(vectors)
    }

    /// Processed vectors with gene annotations, sorted by (experiment, probe).
    pub fn fetch(
        &self,
        probes: &[ProbeId],
        experiments: &[ExperimentId],
        cancel: &Cancellation,
    ) -> ExprResult<Vec<Fetched<ProcessedVector>>> {
        let mut fetched = self.batched(probes, cancel, |batch| {
            let vectors = self.store.load_processed_vectors(batch, experiments)?;
            let genes = self.store.load_probe_genes(batch)?;
            Ok(vectors
                .into_iter()
                .map(|vector| Fetched {
                    genes: genes.get(&vector.probe).cloned().unwrap_or_default(),
                    vector,
                })
                .collect::<Vec<_>>())
        })?;
        fetched.sort_by_key(|f| (f.vector.experiment, f.vector.probe));
        Ok(fetched)
    }

    fn batched<V, F>(&self, probes: &[ProbeId], cancel: &Cancellation, load: F) -> ExprResult<Vec<V>>
    where
        V: Send,
        F: Fn(&[ProbeId]) -> ExprResult<Vec<V>> + Sync,
    {
        let mut unique: Vec<ProbeId> = probes.to_vec();
        unique.sort_unstable();
        unique.dedup();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let _span = batch_span!(unique.len(), self.batch_size).entered();
        let batches = unique.len().div_ceil(self.batch_size);

        let run = |batch: &[ProbeId]| -> ExprResult<Vec<V>> {
            cancel.check("batch fetch")?;
            load(batch)
        };

        let results: Vec<Vec<V>> = if self.parallel && batches > 1 {
            unique
                .par_chunks(self.batch_size)
                .map(run)
                .collect::<ExprResult<_>>()?
        } else {
            unique
                .chunks(self.batch_size)
                .map(run)
                .collect::<ExprResult<_>>()?
        };

        let merged: Vec<V> = results.into_iter().flatten().collect();
        debug!(
            probes = unique.len(),
            batches,
            vectors = merged.len(),
            "batched fetch complete"
        );
        Ok(merged)
    }
}
