//! Sub-cohort slicing of decoded vectors.

use std::collections::HashSet;
use std::sync::Arc;

use exprvec_core::{BioAssaySetId, DecodedVector, SampleId, SubCohort};

/// Project `vector` onto the samples of `sub_cohort`.
///
/// Keeps the samples present in both the vector's arrangement and the
/// sub-cohort, in arrangement order. The input is untouched. Slicing an
/// already-sliced vector with the same sub-cohort returns an equal vector.
pub fn slice(vector: &DecodedVector, sub_cohort: &SubCohort) -> DecodedVector {
    let members: HashSet<SampleId> = sub_cohort.samples.iter().copied().collect();
    let positions = vector.arrangement.retained_positions(&members);
    let data = positions
        .iter()
        .filter_map(|&i| vector.data.get(i).copied())
        .collect();

    DecodedVector {
        probe: vector.probe,
        experiment: vector.experiment,
        owner: BioAssaySetId::SubCohort(sub_cohort.id),
        arrangement: Arc::new(vector.arrangement.derive(&positions)),
        data,
        genes: vector.genes.clone(),
        masked: vector.masked,
        rank_by_mean: vector.rank_by_mean,
        rank_by_max: vector.rank_by_max,
        p_value: None,
    }
}
