use serde::{Deserialize, Serialize};

use super::ids::{DescriptorId, DimensionId, ExperimentId, ProbeId};

/// A stored raw vector: one encoded value per sample of its arrangement.
///
/// Several raw vectors may exist per probe (one per descriptor), but at most
/// one under the experiment's preferred descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVector {
    pub experiment: ExperimentId,
    pub probe: ProbeId,
    pub descriptor: DescriptorId,
    pub dimension: DimensionId,
    pub data: Vec<u8>,
}

/// A stored processed vector, always double-encoded under the experiment's
/// masked-preferred descriptor. Values are NaN where masked.
///
/// `descriptor` is `None` until the vector has been swapped into the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedVector {
    pub experiment: ExperimentId,
    pub probe: ProbeId,
    pub descriptor: Option<DescriptorId>,
    pub dimension: DimensionId,
    pub data: Vec<u8>,
    pub rank_by_mean: Option<f64>,
    pub rank_by_max: Option<f64>,
}
