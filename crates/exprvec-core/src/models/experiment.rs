use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{ExperimentId, PlatformId, SampleId, SubCohortId};

/// An expression experiment and the platforms its samples were run on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: ExperimentId,
    pub short_name: String,
    pub platforms: Vec<PlatformId>,
}

/// A named subset of an experiment's samples.
///
/// Sub-cohorts have no vectors of their own; their data is always sliced out
/// of the source experiment's vectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCohort {
    pub id: SubCohortId,
    pub name: String,
    pub source: ExperimentId,
    pub samples: Vec<SampleId>,
}

/// One element of a retrieval request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BioAssaySet {
    Experiment(ExperimentId),
    SubCohort(SubCohort),
}

impl BioAssaySet {
    /// The experiment whose stored vectors back this set.
    pub fn source_experiment(&self) -> ExperimentId {
        match self {
            BioAssaySet::Experiment(id) => *id,
            BioAssaySet::SubCohort(sub) => sub.source,
        }
    }

    pub fn id(&self) -> BioAssaySetId {
        match self {
            BioAssaySet::Experiment(id) => BioAssaySetId::Experiment(*id),
            BioAssaySet::SubCohort(sub) => BioAssaySetId::SubCohort(sub.id),
        }
    }
}

impl From<ExperimentId> for BioAssaySet {
    fn from(id: ExperimentId) -> Self {
        BioAssaySet::Experiment(id)
    }
}

impl From<SubCohort> for BioAssaySet {
    fn from(sub: SubCohort) -> Self {
        BioAssaySet::SubCohort(sub)
    }
}

/// Identity of a bio-assay set; the owner of a decoded vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BioAssaySetId {
    Experiment(ExperimentId),
    SubCohort(SubCohortId),
}

impl fmt::Display for BioAssaySetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BioAssaySetId::Experiment(id) => write!(f, "experiment:{id}"),
            BioAssaySetId::SubCohort(id) => write!(f, "subset:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_cohort_resolves_to_source() {
        let set = BioAssaySet::from(SubCohort {
            id: SubCohortId(5),
            name: "treated".to_string(),
            source: ExperimentId(9),
            samples: vec![SampleId(1)],
        });
        assert_eq!(set.source_experiment(), ExperimentId(9));
        assert_eq!(set.id(), BioAssaySetId::SubCohort(SubCohortId(5)));
        assert_eq!(set.id().to_string(), "subset:5");
    }
}
