//! Property tests: slicing is a pure, order-preserving projection.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use proptest::prelude::*;

use exprvec_core::{
    BioAssaySetId, DecodedVector, DimensionId, ExperimentId, GeneId, ProbeId, SampleArrangement,
    SampleId, SubCohort, SubCohortId,
};
use exprvec_retrieval::slice;

fn vector(values: Vec<f64>) -> DecodedVector {
    let samples = (0..values.len() as i64).map(|i| SampleId(i + 1)).collect();
    DecodedVector {
        probe: ProbeId(1),
        experiment: ExperimentId(1),
        owner: BioAssaySetId::Experiment(ExperimentId(1)),
        arrangement: Arc::new(SampleArrangement::new(DimensionId(1), samples)),
        data: values,
        genes: BTreeSet::from([GeneId(1)]),
        masked: true,
        rank_by_mean: None,
        rank_by_max: None,
        p_value: None,
    }
}

fn cohort(members: &[i64]) -> SubCohort {
    SubCohort {
        id: SubCohortId(9),
        name: "prop".to_string(),
        source: ExperimentId(1),
        samples: members.iter().copied().map(SampleId).collect(),
    }
}

proptest! {
    #[test]
    fn prop_slicing_is_idempotent(
        values in prop::collection::vec(-1e6f64..1e6, 0..40),
        members in prop::collection::vec(1i64..50, 0..40),
    ) {
        let sub = cohort(&members);
        let once = slice(&vector(values), &sub);
        let twice = slice(&once, &sub);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_slice_keeps_member_values_in_order(
        values in prop::collection::vec(-1e6f64..1e6, 0..40),
        members in prop::collection::vec(1i64..50, 0..40),
    ) {
        let source = vector(values.clone());
        let sliced = slice(&source, &cohort(&members));
        let wanted: HashSet<i64> = members.iter().copied().collect();
        let expected: Vec<f64> = values
            .iter()
            .enumerate()
            .filter(|(i, _)| wanted.contains(&(*i as i64 + 1)))
            .map(|(_, v)| *v)
            .collect();
        prop_assert_eq!(&sliced.data, &expected);
        prop_assert_eq!(sliced.arrangement.len(), sliced.data.len());
        prop_assert_eq!(source.data, values);
    }
}
