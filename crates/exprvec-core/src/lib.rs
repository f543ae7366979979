//! # exprvec-core
//!
//! Foundation crate for the processed expression vector engine.
//! Defines the domain types, the backing-store trait, errors, and config.
//! Every other crate in the workspace depends on this.

pub mod cancellation;
pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use cancellation::Cancellation;
pub use config::ExprConfig;
pub use errors::{ExprError, ExprResult};
pub use models::{
    BioAssaySet, BioAssaySetId, DecodedVector, DescriptorId, DimensionId, Experiment,
    ExperimentId, GeneId, PlatformId, PrimitiveType, ProbeId, ProcessedVector,
    QuantitationDescriptor, RawVector, SampleArrangement, SampleId, SubCohort, SubCohortId,
};
pub use traits::{DescriptorFilter, IVectorStore};
