//! Span definitions per operation: rebuild, retrieval, batch fetch.
//!
//! Each span carries its identifying fields via the `tracing` crate.

/// Create a rebuild span.
#[macro_export]
macro_rules! rebuild_span {
    ($experiment:expr, $run_id:expr) => {
        tracing::info_span!("exprvec.rebuild", experiment = %$experiment, run_id = %$run_id)
    };
}

/// Create a retrieval span.
#[macro_export]
macro_rules! retrieval_span {
    ($sets:expr, $genes:expr) => {
        tracing::info_span!("exprvec.retrieval", sets = $sets, genes = $genes)
    };
}

/// Create a batch fetch span.
#[macro_export]
macro_rules! batch_span {
    ($probes:expr, $batch_size:expr) => {
        tracing::debug_span!("exprvec.batch", probes = $probes, batch_size = $batch_size)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const REBUILD: &str = "exprvec.rebuild";
    pub const RETRIEVAL: &str = "exprvec.retrieval";
    pub const BATCH: &str = "exprvec.batch";
}
