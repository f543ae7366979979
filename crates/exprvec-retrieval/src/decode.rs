use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use exprvec_core::errors::{CodecError, ExprResult};
use exprvec_core::{
    BioAssaySetId, DecodedVector, DimensionId, IVectorStore, PrimitiveType, ProcessedVector,
    SampleArrangement,
};
use exprvec_processing::Fetched;

/// Decode fetched processed vectors against their stored arrangements.
///
/// Vectors sharing an arrangement share one `Arc`. A vector whose length
/// disagrees with its arrangement is malformed.
pub(crate) fn decode_all(
    store: &dyn IVectorStore,
    fetched: Vec<Fetched<ProcessedVector>>,
) -> ExprResult<Vec<DecodedVector>> {
    let dimension_ids: Vec<DimensionId> = fetched
        .iter()
        .map(|f| f.vector.dimension)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let arrangements: HashMap<DimensionId, Arc<SampleArrangement>> = store
        .load_dimensions(&dimension_ids)?
        .into_iter()
        .filter_map(|d| d.id.map(|id| (id, Arc::new(d))))
        .collect();

    fetched
        .into_iter()
        .map(|Fetched { vector, genes }| -> ExprResult<DecodedVector> {
            let arrangement = arrangements.get(&vector.dimension).cloned().ok_or_else(|| {
                CodecError::MalformedVector {
                    primitive: PrimitiveType::Double,
                    reason: format!(
                        "probe {} refers to unknown arrangement {}",
                        vector.probe, vector.dimension
                    ),
                }
            })?;
            let data = exprvec_codec::decode_doubles(&vector.data)?;
            if data.len() != arrangement.len() {
                return Err(CodecError::MalformedVector {
                    primitive: PrimitiveType::Double,
                    reason: format!(
                        "probe {} has {} values for {} samples",
                        vector.probe,
                        data.len(),
                        arrangement.len()
                    ),
                }
                .into());
            }
            Ok(DecodedVector {
                probe: vector.probe,
                experiment: vector.experiment,
                owner: BioAssaySetId::Experiment(vector.experiment),
                arrangement,
                data,
                genes,
                masked: true,
                rank_by_mean: vector.rank_by_mean,
                rank_by_max: vector.rank_by_max,
                p_value: None,
            })
        })
        .collect()
}
