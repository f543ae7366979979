use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use tracing::{info, warn};
use uuid::Uuid;

use exprvec_cache::VectorCache;
use exprvec_core::config::{RebuildConfig, RetrievalConfig};
use exprvec_core::errors::{ExprResult, RebuildError, StorageError};
use exprvec_core::{
    Cancellation, DescriptorFilter, DescriptorId, DimensionId, Experiment, ExperimentId,
    ExprConfig, IVectorStore, ProbeId, ProcessedVector, QuantitationDescriptor, RawVector,
};
use exprvec_observability::rebuild_span;

use super::guard::RebuildGuards;
use super::materialize::materialize;
use super::report::RebuildReport;
use super::state::{RebuildState, StateTracker};
use crate::batch::BatchRetriever;
use crate::masking::{MaskingOutcome, MaskingPipeline};

/// Recomputes an experiment's processed vectors from its raw vectors.
///
/// A successful run replaces the processed set atomically and then drops the
/// experiment's cache partition. A failed run leaves the experiment with no
/// processed vectors.
pub struct RebuildWorkflow {
    store: Arc<dyn IVectorStore>,
    cache: Arc<VectorCache>,
    guards: RebuildGuards,
    retrieval: RetrievalConfig,
    config: RebuildConfig,
}

/// Everything fetched for one experiment.
struct Inputs {
    preferred: QuantitationDescriptor,
    descriptors: Vec<QuantitationDescriptor>,
    signal: Vec<RawVector>,
    presence: Option<Vec<RawVector>>,
}

/// Intermediate results carried from one state to the next.
#[derive(Default)]
struct Progress {
    vectors_removed: usize,
    vectors_created: usize,
    two_channel: bool,
    masked_values: usize,
    probes_without_presence: Vec<ProbeId>,
}

impl RebuildWorkflow {
    pub fn new(store: Arc<dyn IVectorStore>, cache: Arc<VectorCache>, config: &ExprConfig) -> Self {
        Self {
            store,
            cache,
            guards: RebuildGuards::new(),
            retrieval: config.retrieval.clone(),
            config: config.rebuild.clone(),
        }
    }

    pub fn guards(&self) -> &RebuildGuards {
        &self.guards
    }

    /// Rebuild one experiment. Blocks while another rebuild of the same
    /// experiment is running, then performs a full rebuild of its own.
    pub fn run(&self, experiment: ExperimentId, cancel: &Cancellation) -> ExprResult<RebuildReport> {
        self.guards
            .exclusive(experiment, || self.run_exclusive(experiment, cancel))
    }

    /// Rebuild several experiments in parallel. A repeated id is rebuilt
    /// once; results follow first appearance.
    pub fn run_many(
        &self,
        experiments: &[ExperimentId],
        cancel: &Cancellation,
    ) -> Vec<(ExperimentId, ExprResult<RebuildReport>)> {
        let mut seen = HashSet::with_capacity(experiments.len());
        let distinct: Vec<ExperimentId> = experiments
            .iter()
            .copied()
            .filter(|experiment| seen.insert(*experiment))
            .collect();
        distinct
            .par_iter()
            .map(|&experiment| (experiment, self.run(experiment, cancel)))
            .collect()
    }

    fn run_exclusive(
        &self,
        experiment: ExperimentId,
        cancel: &Cancellation,
    ) -> ExprResult<RebuildReport> {
        let run_id = Uuid::new_v4();
        let _span = rebuild_span!(experiment, run_id).entered();
        let started_at = Utc::now();
        let clock = Instant::now();

        let mut tracker = StateTracker::new(experiment);
        let mut progress = Progress::default();

        let descriptor = match self.execute(experiment, cancel, &mut tracker, &mut progress) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                let from = tracker.current();
                tracker.abort();
                // Clearing may already have removed the processed set; the
                // cache must not keep serving it.
                if tracker.visited(RebuildState::Clearing) {
                    self.cache.invalidate(experiment);
                }
                warn!(
                    experiment = %experiment,
                    state = from.as_str(),
                    error = %err,
                    "rebuild aborted"
                );
                return Err(err);
            }
        };

        let report = RebuildReport {
            run_id,
            experiment,
            descriptor,
            vectors_removed: progress.vectors_removed,
            vectors_created: progress.vectors_created,
            masked_values: progress.masked_values,
            probes_without_presence: progress.probes_without_presence,
            two_channel: progress.two_channel,
            states: tracker.into_path(),
            started_at,
            elapsed: clock.elapsed(),
        };
        info!(
            experiment = %experiment,
            descriptor = %report.descriptor,
            vectors = report.vectors_created,
            masked_values = report.masked_values,
            two_channel = report.two_channel,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "rebuild complete"
        );
        Ok(report)
    }

    fn execute(
        &self,
        experiment: ExperimentId,
        cancel: &Cancellation,
        tracker: &mut StateTracker,
        progress: &mut Progress,
    ) -> ExprResult<DescriptorId> {
        // Clearing
        tracker.advance_checked(cancel)?;
        let entity = self
            .store
            .load_experiment(experiment)?
            .ok_or(RebuildError::ExperimentNotFound { experiment })?;
        progress.vectors_removed = self.store.delete_processed_vectors(experiment)?;

        // Fetching
        tracker.advance_checked(cancel)?;
        progress.two_channel = self.classify_platforms(&entity)?;
        let inputs = self.fetch(&entity, progress.two_channel, cancel)?;

        // Masking
        tracker.advance_checked(cancel)?;
        let MaskingOutcome {
            vectors: masked,
            masked_values,
            probes_without_presence,
        } = MaskingPipeline::new(self.config.strict_missing_presence).run(
            &inputs.signal,
            &inputs.descriptors,
            inputs.presence.as_deref(),
        )?;
        progress.masked_values = masked_values;
        progress.probes_without_presence = probes_without_presence;

        // Materializing
        tracker.advance_checked(cancel)?;
        let dimension_ids: Vec<DimensionId> = masked
            .iter()
            .map(|v| v.dimension)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let dimensions = self.store.load_dimensions(&dimension_ids)?;
        let descriptor = inputs.preferred.derive_masked_preferred();
        let vectors: Vec<ProcessedVector> =
            materialize(experiment, &masked, &dimensions, self.config.compute_ranks)?;

        // Swapping. Past this point the run is no longer cancellable.
        tracker.advance_checked(cancel)?;
        let descriptor_id = self
            .store
            .save_processed_vectors(experiment, &descriptor, &vectors)?;
        progress.vectors_created = vectors.len();

        // Invalidated
        tracker.advance();
        self.cache.invalidate(experiment);

        // Idle
        tracker.advance();
        Ok(descriptor_id)
    }

    /// Whether any platform is two-channel. Every platform must be
    /// classified.
    fn classify_platforms(&self, experiment: &Experiment) -> ExprResult<bool> {
        let platforms = self.store.load_platforms(&experiment.platforms)?;
        let mut two_channel = false;
        for id in &experiment.platforms {
            let platform = platforms
                .iter()
                .find(|p| p.id == *id)
                .ok_or_else(|| StorageError::NotFound {
                    entity: "platform",
                    id: id.to_string(),
                })?;
            let technology = platform.technology.ok_or(RebuildError::Configuration {
                experiment: experiment.id,
                platform: platform.id,
            })?;
            two_channel |= technology.is_two_channel();
        }
        Ok(two_channel)
    }

    fn fetch(
        &self,
        experiment: &Experiment,
        two_channel: bool,
        cancel: &Cancellation,
    ) -> ExprResult<Inputs> {
        let id = experiment.id;
        let descriptors = self.store.load_descriptors(id)?;
        let probes = self.store.load_probe_ids(&experiment.platforms)?;
        // No rayon fan-out while the experiment guard is held.
        let retriever = BatchRetriever::with_batch_size(
            Arc::clone(&self.store),
            self.retrieval.effective_batch_size(),
            false,
        );

        let signal = retriever.fetch_raw(&probes, &[id], DescriptorFilter::Preferred, cancel)?;
        if signal.is_empty() {
            return Err(RebuildError::NoData { experiment: id }.into());
        }
        // Sorted by probe, so repeats are adjacent.
        if let Some(pair) = signal.windows(2).find(|w| w[0].probe == w[1].probe) {
            return Err(RebuildError::DuplicateDesignElement {
                experiment: id,
                probe: pair[0].probe,
            }
            .into());
        }
        let preferred = descriptors
            .iter()
            .find(|d| d.is_preferred && !d.is_masked_preferred)
            .cloned()
            .ok_or(RebuildError::MissingPreferredDescriptor { experiment: id })?;

        let presence = if two_channel {
            Some(retriever.fetch_raw(&probes, &[id], DescriptorFilter::PresenceCall, cancel)?)
        } else {
            None
        };

        Ok(Inputs {
            preferred,
            descriptors,
            signal,
            presence,
        })
    }
}
