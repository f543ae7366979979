use std::collections::{BTreeSet, HashMap};

use crate::errors::ExprResult;
use crate::models::{
    DescriptorId, DimensionId, Experiment, ExperimentId, GeneId, Platform, PlatformId, ProbeId,
    ProcessedVector, QuantitationDescriptor, RawVector, SampleArrangement, SubCohort,
    SubCohortId,
};

/// Which raw vectors a load should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFilter {
    /// Vectors under the experiment's preferred descriptor.
    Preferred,
    /// Presence/absence call vectors (the missing-value matrix).
    PresenceCall,
    /// Vectors under one specific descriptor.
    Descriptor(DescriptorId),
}

impl DescriptorFilter {
    pub fn matches(&self, descriptor: &QuantitationDescriptor) -> bool {
        match self {
            DescriptorFilter::Preferred => descriptor.is_preferred,
            DescriptorFilter::PresenceCall => descriptor.is_presence_call(),
            DescriptorFilter::Descriptor(id) => descriptor.id == Some(*id),
        }
    }
}

/// The backing store consumed by the engine.
///
/// All calls are synchronous and surface store failures as
/// `ExprError::StorageError`. Loads return vectors in no particular order.
pub trait IVectorStore: Send + Sync {
    // --- Entities ---
    fn load_experiment(&self, id: ExperimentId) -> ExprResult<Option<Experiment>>;
    fn load_sub_cohort(&self, id: SubCohortId) -> ExprResult<Option<SubCohort>>;
    fn load_platforms(&self, ids: &[PlatformId]) -> ExprResult<Vec<Platform>>;
    fn load_probe_ids(&self, platforms: &[PlatformId]) -> ExprResult<Vec<ProbeId>>;
    fn load_dimensions(&self, ids: &[DimensionId]) -> ExprResult<Vec<SampleArrangement>>;

    /// Every descriptor registered against the experiment.
    fn load_descriptors(&self, experiment: ExperimentId)
        -> ExprResult<Vec<QuantitationDescriptor>>;

    // --- Vectors ---
    fn load_raw_vectors(
        &self,
        probes: &[ProbeId],
        experiments: &[ExperimentId],
        filter: DescriptorFilter,
    ) -> ExprResult<Vec<RawVector>>;

    fn load_processed_vectors(
        &self,
        probes: &[ProbeId],
        experiments: &[ExperimentId],
    ) -> ExprResult<Vec<ProcessedVector>>;

    fn count_processed_vectors(&self, experiment: ExperimentId) -> ExprResult<usize>;

    /// Remove the experiment's processed vectors and its masked-preferred
    /// descriptor. Returns the number of vectors removed; zero is not an error.
    fn delete_processed_vectors(&self, experiment: ExperimentId) -> ExprResult<usize>;

    /// Atomically replace the experiment's processed vectors with `vectors`
    /// and register `descriptor` as its only masked-preferred descriptor.
    /// Returns the id assigned to the descriptor.
    fn save_processed_vectors(
        &self,
        experiment: ExperimentId,
        descriptor: &QuantitationDescriptor,
        vectors: &[ProcessedVector],
    ) -> ExprResult<DescriptorId>;

    // --- Annotations ---
    fn load_gene_to_probe_map(
        &self,
        genes: &[GeneId],
        platforms: &[PlatformId],
    ) -> ExprResult<HashMap<GeneId, Vec<ProbeId>>>;

    fn load_probe_genes(&self, probes: &[ProbeId])
        -> ExprResult<HashMap<ProbeId, BTreeSet<GeneId>>>;
}
