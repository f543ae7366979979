//! Materializing: masked signal → processed vectors under a fresh
//! masked-preferred descriptor.

use std::collections::HashMap;

use exprvec_core::errors::{CodecError, ExprResult, StorageError};
use exprvec_core::{
    DimensionId, ExperimentId, PrimitiveType, ProcessedVector, SampleArrangement,
};

use crate::masking::SignalVector;
use crate::ranks::{compute_ranks, Ranks};

/// Build processed vectors from masked signal, sorted by probe.
///
/// Fails on a vector whose length disagrees with its sample arrangement.
/// Probes are already unique.
pub(crate) fn materialize(
    experiment: ExperimentId,
    masked: &[SignalVector],
    dimensions: &[SampleArrangement],
    with_ranks: bool,
) -> ExprResult<Vec<ProcessedVector>> {
    let sample_counts: HashMap<DimensionId, usize> = dimensions
        .iter()
        .filter_map(|d| d.id.map(|id| (id, d.len())))
        .collect();

    for vector in masked {
        let expected = sample_counts.get(&vector.dimension).copied().ok_or_else(|| {
            StorageError::NotFound {
                entity: "bioassay dimension",
                id: vector.dimension.to_string(),
            }
        })?;
        if vector.values.len() != expected {
            return Err(CodecError::MalformedVector {
                primitive: PrimitiveType::Double,
                reason: format!(
                    "probe {} has {} values but its arrangement has {} samples",
                    vector.probe,
                    vector.values.len(),
                    expected
                ),
            }
            .into());
        }
    }

    let ranks = if with_ranks {
        compute_ranks(&masked.iter().map(|v| v.values.as_slice()).collect::<Vec<_>>())
    } else {
        vec![Ranks::default(); masked.len()]
    };

    let mut processed: Vec<ProcessedVector> = masked
        .iter()
        .zip(ranks)
        .map(|(vector, ranks)| ProcessedVector {
            experiment,
            probe: vector.probe,
            descriptor: None,
            dimension: vector.dimension,
            data: exprvec_codec::encode_doubles(&vector.values),
            rank_by_mean: ranks.by_mean,
            rank_by_max: ranks.by_max,
        })
        .collect();
    processed.sort_by_key(|v| v.probe);
    Ok(processed)
}
