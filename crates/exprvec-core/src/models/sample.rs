use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ids::{DimensionId, SampleId};

/// An ordered sequence of samples defining the column order of a vector
/// (a bio-assay dimension).
///
/// Persisted arrangements carry an `id`. Derived arrangements (a subset of
/// another arrangement, relative order preserved) have no identity of their
/// own and record the persisted arrangement they were cut from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleArrangement {
    pub id: Option<DimensionId>,
    pub derived_from: Option<DimensionId>,
    pub samples: Vec<SampleId>,
}

impl SampleArrangement {
    pub fn new(id: DimensionId, samples: Vec<SampleId>) -> Self {
        Self {
            id: Some(id),
            derived_from: None,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_derived(&self) -> bool {
        self.derived_from.is_some()
    }

    /// Column positions whose sample is in `members`, in arrangement order.
    pub fn retained_positions(&self, members: &HashSet<SampleId>) -> Vec<usize> {
        self.samples
            .iter()
            .enumerate()
            .filter(|(_, s)| members.contains(s))
            .map(|(i, _)| i)
            .collect()
    }

    /// Build a derived arrangement holding the samples at `positions`.
    /// Positions must be ascending and in range.
    pub fn derive(&self, positions: &[usize]) -> SampleArrangement {
        SampleArrangement {
            id: None,
            derived_from: self.id.or(self.derived_from),
            samples: positions.iter().map(|&i| self.samples[i]).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrangement() -> SampleArrangement {
        SampleArrangement::new(
            DimensionId(7),
            vec![SampleId(1), SampleId(2), SampleId(3), SampleId(4)],
        )
    }

    #[test]
    fn retained_positions_follow_arrangement_order() {
        let members: HashSet<SampleId> = [SampleId(4), SampleId(2), SampleId(99)].into();
        assert_eq!(arrangement().retained_positions(&members), vec![1, 3]);
    }

    #[test]
    fn derived_arrangement_points_at_source() {
        let source = arrangement();
        let derived = source.derive(&[1, 3]);
        assert!(derived.is_derived());
        assert_eq!(derived.id, None);
        assert_eq!(derived.derived_from, Some(DimensionId(7)));
        assert_eq!(derived.samples, vec![SampleId(2), SampleId(4)]);

        let again = derived.derive(&[0]);
        assert_eq!(again.derived_from, Some(DimensionId(7)));
    }
}
