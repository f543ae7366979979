use crate::models::{ExperimentId, PlatformId, ProbeId};

/// Processed-vector rebuild errors. All are fatal to the running rebuild.
#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    #[error("platform {platform} of experiment {experiment} has no technology type")]
    Configuration {
        experiment: ExperimentId,
        platform: PlatformId,
    },

    #[error("experiment {experiment} has no preferred raw vectors")]
    NoData { experiment: ExperimentId },

    #[error("experiment {experiment} has more than one preferred vector for probe {probe}")]
    DuplicateDesignElement {
        experiment: ExperimentId,
        probe: ProbeId,
    },

    #[error("experiment {experiment} has no preferred quantitation descriptor")]
    MissingPreferredDescriptor { experiment: ExperimentId },

    #[error("experiment {experiment} not found")]
    ExperimentNotFound { experiment: ExperimentId },
}
