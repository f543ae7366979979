use crate::models::{DescriptorId, ProbeId};

/// Masking pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum MaskingError {
    #[error("shape mismatch for probe {probe}: signal has {signal_len} values, presence has {presence_len}")]
    ShapeMismatch {
        probe: ProbeId,
        signal_len: usize,
        presence_len: usize,
    },

    #[error("no presence vector for {count} probe(s), first {first}")]
    MissingPresenceData { first: ProbeId, count: usize },

    #[error("more than one presence vector for probe {probe}")]
    DuplicatePresenceCall { probe: ProbeId },

    #[error("signal vector for probe {probe} uses unknown descriptor {descriptor}")]
    UnknownDescriptor {
        probe: ProbeId,
        descriptor: DescriptorId,
    },
}
