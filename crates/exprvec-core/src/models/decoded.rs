use std::collections::BTreeSet;
use std::sync::Arc;

use super::experiment::BioAssaySetId;
use super::ids::{ExperimentId, GeneId, ProbeId};
use super::sample::SampleArrangement;

/// A processed vector decoded to doubles, annotated with the genes of its
/// probe and the arrangement it was decoded against.
///
/// A value snapshot: mutating it never touches stored or cached data.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedVector {
    pub probe: ProbeId,
    /// Experiment the stored vector belongs to.
    pub experiment: ExperimentId,
    /// Set this view was produced for (the experiment, or a sub-cohort of it).
    pub owner: BioAssaySetId,
    pub arrangement: Arc<SampleArrangement>,
    pub data: Vec<f64>,
    pub genes: BTreeSet<GeneId>,
    pub masked: bool,
    pub rank_by_mean: Option<f64>,
    pub rank_by_max: Option<f64>,
    /// Transient significance score attached by downstream consumers.
    /// Never meaningful inside the cache.
    pub p_value: Option<f64>,
}

impl DecodedVector {
    /// Identity used to deduplicate retrieval results.
    pub fn key(&self) -> (ProbeId, BioAssaySetId) {
        (self.probe, self.owner)
    }

    /// Reset caller-specific annotations.
    pub fn clear_transient(&mut self) {
        self.p_value = None;
    }

    /// Number of non-NaN values.
    pub fn present_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}
