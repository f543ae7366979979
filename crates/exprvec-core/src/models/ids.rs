//! Numeric identities for persisted entities.
//!
//! Each is a transparent `i64` newtype so ids of different entities cannot be
//! mixed up at call sites.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// An expression experiment.
    ExperimentId
);
entity_id!(
    /// A platform probe (design element).
    ProbeId
);
entity_id!(
    /// A gene, usually its NCBI id.
    GeneId
);
entity_id!(
    /// A biological sample (bio-assay).
    SampleId
);
entity_id!(PlatformId);
entity_id!(
    /// A quantitation descriptor (quantitation type).
    DescriptorId
);
entity_id!(
    /// A persisted sample arrangement (bio-assay dimension).
    DimensionId
);
entity_id!(
    /// An experiment sub-cohort (subset).
    SubCohortId
);
