//! Domain model: identities, platforms, sample arrangements, descriptors,
//! stored vectors, and the decoded view exchanged with callers.

pub mod decoded;
pub mod descriptor;
pub mod experiment;
pub mod ids;
pub mod platform;
pub mod sample;
pub mod vectors;

pub use decoded::DecodedVector;
pub use descriptor::{
    GeneralType, PrimitiveType, QuantitationDescriptor, ScaleType, StandardQuantitationType,
};
pub use experiment::{BioAssaySet, BioAssaySetId, Experiment, SubCohort};
pub use ids::{
    DescriptorId, DimensionId, ExperimentId, GeneId, PlatformId, ProbeId, SampleId, SubCohortId,
};
pub use platform::{Platform, Probe, TechnologyType};
pub use sample::SampleArrangement;
pub use vectors::{ProcessedVector, RawVector};
