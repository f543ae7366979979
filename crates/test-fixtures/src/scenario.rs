//! Golden scenarios: typed fixture files and their installation into a store.

use serde::{Deserialize, Serialize};

use exprvec_codec::VectorValues;
use exprvec_core::models::{
    GeneralType, Platform, Probe, ScaleType, StandardQuantitationType, TechnologyType,
};
use exprvec_core::{
    DescriptorId, DimensionId, Experiment, ExperimentId, GeneId, PlatformId, PrimitiveType,
    ProbeId, QuantitationDescriptor, RawVector, SampleArrangement, SampleId, SubCohort,
    SubCohortId,
};

use crate::store::InMemoryStore;

/// One probe of a scenario: its genes, raw signal, optional presence calls,
/// and the processed values expected after a rebuild (`None` = NaN).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeFixture {
    pub id: i64,
    pub name: String,
    pub genes: Vec<i64>,
    pub signal: Vec<f64>,
    #[serde(default)]
    pub presence: Option<Vec<bool>>,
    pub expected: Vec<Option<f64>>,
}

impl ProbeFixture {
    pub fn probe_id(&self) -> ProbeId {
        ProbeId(self.id)
    }

    /// Expected processed values with `None` mapped to NaN.
    pub fn expected_values(&self) -> Vec<f64> {
        self.expected
            .iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubCohortFixture {
    pub id: i64,
    pub name: String,
    pub samples: Vec<i64>,
}

/// A single-experiment, single-platform scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFixture {
    pub experiment: i64,
    pub short_name: String,
    pub platform: i64,
    /// `None` leaves the platform unclassified.
    pub technology: Option<String>,
    pub dimension: i64,
    pub samples: Vec<i64>,
    pub signal_descriptor: i64,
    pub presence_descriptor: i64,
    pub probes: Vec<ProbeFixture>,
    #[serde(default)]
    pub sub_cohorts: Vec<SubCohortFixture>,
}

/// Write access a scenario needs to install itself into a store.
///
/// Seeding is fixture setup, so implementations panic on failure.
pub trait SeedStore {
    fn seed_platform(&self, platform: Platform);
    fn seed_probe(&self, probe: Probe, genes: Vec<GeneId>);
    fn seed_experiment(&self, experiment: Experiment);
    fn seed_dimension(&self, dimension: SampleArrangement);
    fn seed_descriptor(
        &self,
        experiment: ExperimentId,
        descriptor: QuantitationDescriptor,
    ) -> DescriptorId;
    fn seed_raw_vector(&self, vector: RawVector);
    fn seed_sub_cohort(&self, sub_cohort: SubCohort);
}

impl SeedStore for InMemoryStore {
    fn seed_platform(&self, platform: Platform) {
        self.add_platform(platform);
    }

    fn seed_probe(&self, probe: Probe, genes: Vec<GeneId>) {
        self.add_probe(probe, genes);
    }

    fn seed_experiment(&self, experiment: Experiment) {
        self.add_experiment(experiment);
    }

    fn seed_dimension(&self, dimension: SampleArrangement) {
        self.add_dimension(dimension);
    }

    fn seed_descriptor(
        &self,
        experiment: ExperimentId,
        descriptor: QuantitationDescriptor,
    ) -> DescriptorId {
        self.add_descriptor(experiment, descriptor)
    }

    fn seed_raw_vector(&self, vector: RawVector) {
        self.add_raw_vector(vector);
    }

    fn seed_sub_cohort(&self, sub_cohort: SubCohort) {
        self.add_sub_cohort(sub_cohort);
    }
}

/// Handles to what a scenario installed.
#[derive(Debug, Clone)]
pub struct Installed {
    pub experiment: ExperimentId,
    pub platform: PlatformId,
    pub dimension: DimensionId,
    pub signal_descriptor: DescriptorId,
    pub presence_descriptor: DescriptorId,
    pub sub_cohorts: Vec<SubCohort>,
}

impl ScenarioFixture {
    /// Write the scenario's entities and raw vectors into `store`.
    pub fn install(&self, store: &InMemoryStore) -> Installed {
        self.install_into(store)
    }

    /// Write the scenario into any seedable store.
    ///
    /// # Panics
    /// Panics on an unknown technology name; fixtures are trusted input.
    pub fn install_into(&self, store: &dyn SeedStore) -> Installed {
        let experiment = ExperimentId(self.experiment);
        let platform = PlatformId(self.platform);
        let dimension = DimensionId(self.dimension);

        let technology = self.technology.as_deref().map(|t| {
            TechnologyType::parse(t).unwrap_or_else(|| panic!("unknown technology {t}"))
        });
        store.seed_platform(Platform {
            id: platform,
            short_name: format!("GPL{}", self.platform),
            technology,
        });
        store.seed_experiment(Experiment {
            id: experiment,
            short_name: self.short_name.clone(),
            platforms: vec![platform],
        });
        store.seed_dimension(SampleArrangement::new(
            dimension,
            self.samples.iter().copied().map(SampleId).collect(),
        ));

        let signal_descriptor =
            store.seed_descriptor(experiment, signal_descriptor(self.signal_descriptor));
        let presence_descriptor =
            store.seed_descriptor(experiment, presence_descriptor(self.presence_descriptor));

        for probe in &self.probes {
            store.seed_probe(
                Probe {
                    id: probe.probe_id(),
                    platform,
                    name: probe.name.clone(),
                },
                probe.genes.iter().copied().map(GeneId).collect(),
            );
            store.seed_raw_vector(RawVector {
                experiment,
                probe: probe.probe_id(),
                descriptor: signal_descriptor,
                dimension,
                data: exprvec_codec::encode_doubles(&probe.signal),
            });
            if let Some(calls) = &probe.presence {
                let data = exprvec_codec::encode(
                    &VectorValues::Boolean(calls.clone()),
                    PrimitiveType::Boolean,
                )
                .unwrap_or_else(|e| panic!("presence fixture for {}: {e}", probe.name));
                store.seed_raw_vector(RawVector {
                    experiment,
                    probe: probe.probe_id(),
                    descriptor: presence_descriptor,
                    dimension,
                    data,
                });
            }
        }

        let sub_cohorts: Vec<SubCohort> = self
            .sub_cohorts
            .iter()
            .map(|s| SubCohort {
                id: SubCohortId(s.id),
                name: s.name.clone(),
                source: experiment,
                samples: s.samples.iter().copied().map(SampleId).collect(),
            })
            .collect();
        for sub in &sub_cohorts {
            store.seed_sub_cohort(sub.clone());
        }

        Installed {
            experiment,
            platform,
            dimension,
            signal_descriptor,
            presence_descriptor,
            sub_cohorts,
        }
    }

    pub fn probe(&self, id: i64) -> Option<&ProbeFixture> {
        self.probes.iter().find(|p| p.id == id)
    }
}

fn signal_descriptor(id: i64) -> QuantitationDescriptor {
    QuantitationDescriptor {
        id: Some(DescriptorId(id)),
        name: "VALUE".to_string(),
        description: "Normalized log ratio".to_string(),
        primitive_type: PrimitiveType::Double,
        general_type: GeneralType::Quantitative,
        quantitation_type: StandardQuantitationType::Amount,
        scale: ScaleType::Log2,
        is_preferred: true,
        is_masked_preferred: false,
        is_background: false,
        is_background_subtracted: true,
        is_normalized: true,
        is_ratio: true,
    }
}

fn presence_descriptor(id: i64) -> QuantitationDescriptor {
    QuantitationDescriptor {
        id: Some(DescriptorId(id)),
        name: "Missing value".to_string(),
        description: "Computed present/absent calls".to_string(),
        primitive_type: PrimitiveType::Boolean,
        general_type: GeneralType::Categorical,
        quantitation_type: StandardQuantitationType::PresentAbsent,
        scale: ScaleType::Other,
        is_preferred: false,
        is_masked_preferred: false,
        is_background: false,
        is_background_subtracted: false,
        is_normalized: false,
        is_ratio: false,
    }
}
