use crate::models::ExperimentId;

/// Cache errors. These indicate a bug, not a recoverable condition.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache inconsistency in partition {experiment}: {details}")]
    Inconsistency {
        experiment: ExperimentId,
        details: String,
    },
}
