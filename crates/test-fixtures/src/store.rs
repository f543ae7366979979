//! `InMemoryStore`: an `IVectorStore` held in memory, with hooks for
//! injecting the failures the engine must survive.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;
use std::time::Duration;

use exprvec_core::errors::{ExprResult, StorageError};
use exprvec_core::models::{Platform, Probe};
use exprvec_core::{
    DescriptorFilter, DescriptorId, DimensionId, Experiment, ExperimentId, GeneId, IVectorStore,
    PlatformId, ProbeId, ProcessedVector, QuantitationDescriptor, RawVector, SampleArrangement,
    SubCohort, SubCohortId,
};

#[derive(Debug, Default)]
struct State {
    platforms: BTreeMap<PlatformId, Platform>,
    probes: BTreeMap<ProbeId, Probe>,
    probe_genes: BTreeMap<ProbeId, BTreeSet<GeneId>>,
    experiments: BTreeMap<ExperimentId, Experiment>,
    sub_cohorts: BTreeMap<SubCohortId, SubCohort>,
    dimensions: BTreeMap<DimensionId, SampleArrangement>,
    descriptors: BTreeMap<ExperimentId, Vec<QuantitationDescriptor>>,
    raw: Vec<RawVector>,
    processed: BTreeMap<ExperimentId, Vec<ProcessedVector>>,
    next_descriptor: i64,
}

impl State {
    /// Assigned ids start above any id a fixture file uses.
    fn allocate_descriptor(&mut self) -> DescriptorId {
        self.next_descriptor = self.next_descriptor.max(1000) + 1;
        DescriptorId(self.next_descriptor)
    }
}

#[derive(Debug, Default)]
struct Faults {
    /// 1-based raw-load call that fails; 0 disables.
    fail_raw_load_at: AtomicUsize,
    fail_saves: AtomicBool,
    raw_load_delay_ms: AtomicUsize,
}

#[derive(Debug, Default)]
struct Calls {
    raw_loads: AtomicUsize,
    processed_loads: AtomicUsize,
    saves: AtomicUsize,
    deletes: AtomicUsize,
}

/// In-memory backing store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    faults: Faults,
    calls: Calls,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    // --- Seeding ---

    pub fn add_platform(&self, platform: Platform) {
        self.write().platforms.insert(platform.id, platform);
    }

    pub fn add_probe(&self, probe: Probe, genes: impl IntoIterator<Item = GeneId>) {
        let mut state = self.write();
        state.probe_genes.insert(probe.id, genes.into_iter().collect());
        state.probes.insert(probe.id, probe);
    }

    pub fn add_experiment(&self, experiment: Experiment) {
        self.write().experiments.insert(experiment.id, experiment);
    }

    pub fn add_dimension(&self, dimension: SampleArrangement) {
        if let Some(id) = dimension.id {
            self.write().dimensions.insert(id, dimension);
        }
    }

    /// Register a descriptor, assigning an id when it has none.
    pub fn add_descriptor(
        &self,
        experiment: ExperimentId,
        mut descriptor: QuantitationDescriptor,
    ) -> DescriptorId {
        let mut state = self.write();
        let id = match descriptor.id {
            Some(id) => id,
            None => state.allocate_descriptor(),
        };
        descriptor.id = Some(id);
        state.descriptors.entry(experiment).or_default().push(descriptor);
        id
    }

    pub fn add_raw_vector(&self, vector: RawVector) {
        self.write().raw.push(vector);
    }

    pub fn add_sub_cohort(&self, sub_cohort: SubCohort) {
        self.write().sub_cohorts.insert(sub_cohort.id, sub_cohort);
    }

    // --- Fault injection ---

    /// Make the `n`th (1-based, counted from now) raw-vector load fail.
    pub fn fail_raw_load_on(&self, n: usize) {
        let done = self.calls.raw_loads.load(Ordering::SeqCst);
        self.faults.fail_raw_load_at.store(done + n, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.faults.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Sleep inside every raw-vector load.
    pub fn delay_raw_loads(&self, delay: Duration) {
        self.faults
            .raw_load_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// Store a second copy of every raw vector `probe` has in `experiment`.
    pub fn duplicate_raw_vectors(&self, experiment: ExperimentId, probe: ProbeId) {
        let mut state = self.write();
        let copies: Vec<RawVector> = state
            .raw
            .iter()
            .filter(|v| v.experiment == experiment && v.probe == probe)
            .cloned()
            .collect();
        state.raw.extend(copies);
    }

    pub fn clear_technology(&self, platform: PlatformId) {
        if let Some(p) = self.write().platforms.get_mut(&platform) {
            p.technology = None;
        }
    }

    /// Remove the presence vector of one probe.
    pub fn drop_presence(&self, experiment: ExperimentId, probe: ProbeId) {
        let mut state = self.write();
        let presence: HashSet<DescriptorId> = state
            .descriptors
            .get(&experiment)
            .into_iter()
            .flatten()
            .filter(|d| d.is_presence_call())
            .filter_map(|d| d.id)
            .collect();
        state.raw.retain(|v| {
            !(v.experiment == experiment && v.probe == probe && presence.contains(&v.descriptor))
        });
    }

    // --- Inspection ---

    pub fn raw_load_calls(&self) -> usize {
        self.calls.raw_loads.load(Ordering::SeqCst)
    }

    pub fn processed_load_calls(&self) -> usize {
        self.calls.processed_loads.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.calls.saves.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.calls.deletes.load(Ordering::SeqCst)
    }

    /// Stored processed vectors of an experiment, sorted by probe.
    pub fn processed(&self, experiment: ExperimentId) -> Vec<ProcessedVector> {
        let mut vectors = self
            .read()
            .processed
            .get(&experiment)
            .cloned()
            .unwrap_or_default();
        vectors.sort_by_key(|v| v.probe);
        vectors
    }

    /// Masked-preferred descriptors currently registered to an experiment.
    pub fn masked_preferred_descriptors(
        &self,
        experiment: ExperimentId,
    ) -> Vec<QuantitationDescriptor> {
        self.read()
            .descriptors
            .get(&experiment)
            .into_iter()
            .flatten()
            .filter(|d| d.is_masked_preferred)
            .cloned()
            .collect()
    }

    fn descriptor_ids(
        state: &State,
        experiments: &[ExperimentId],
        filter: DescriptorFilter,
    ) -> HashSet<DescriptorId> {
        experiments
            .iter()
            .filter_map(|e| state.descriptors.get(e))
            .flatten()
            .filter(|d| filter.matches(d))
            .filter_map(|d| d.id)
            .collect()
    }
}

impl IVectorStore for InMemoryStore {
    fn load_experiment(&self, id: ExperimentId) -> ExprResult<Option<Experiment>> {
        Ok(self.read().experiments.get(&id).cloned())
    }

    fn load_sub_cohort(&self, id: SubCohortId) -> ExprResult<Option<SubCohort>> {
        Ok(self.read().sub_cohorts.get(&id).cloned())
    }

    fn load_platforms(&self, ids: &[PlatformId]) -> ExprResult<Vec<Platform>> {
        let state = self.read();
        Ok(ids
            .iter()
            .filter_map(|id| state.platforms.get(id).cloned())
            .collect())
    }

    fn load_probe_ids(&self, platforms: &[PlatformId]) -> ExprResult<Vec<ProbeId>> {
        Ok(self
            .read()
            .probes
            .values()
            .filter(|p| platforms.contains(&p.platform))
            .map(|p| p.id)
            .collect())
    }

    fn load_dimensions(&self, ids: &[DimensionId]) -> ExprResult<Vec<SampleArrangement>> {
        let state = self.read();
        Ok(ids
            .iter()
            .filter_map(|id| state.dimensions.get(id).cloned())
            .collect())
    }

    fn load_descriptors(
        &self,
        experiment: ExperimentId,
    ) -> ExprResult<Vec<QuantitationDescriptor>> {
        Ok(self
            .read()
            .descriptors
            .get(&experiment)
            .cloned()
            .unwrap_or_default())
    }

    fn load_raw_vectors(
        &self,
        probes: &[ProbeId],
        experiments: &[ExperimentId],
        filter: DescriptorFilter,
    ) -> ExprResult<Vec<RawVector>> {
        let call = self.calls.raw_loads.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.faults.raw_load_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay as u64));
        }
        if self.faults.fail_raw_load_at.load(Ordering::SeqCst) == call {
            return Err(StorageError::Unavailable {
                reason: format!("injected failure on raw load {call}"),
            }
            .into());
        }

        let state = self.read();
        let descriptors = Self::descriptor_ids(&state, experiments, filter);
        let probes: HashSet<&ProbeId> = probes.iter().collect();
        Ok(state
            .raw
            .iter()
            .filter(|v| {
                probes.contains(&v.probe)
                    && experiments.contains(&v.experiment)
                    && descriptors.contains(&v.descriptor)
            })
            .cloned()
            .collect())
    }

    fn load_processed_vectors(
        &self,
        probes: &[ProbeId],
        experiments: &[ExperimentId],
    ) -> ExprResult<Vec<ProcessedVector>> {
        self.calls.processed_loads.fetch_add(1, Ordering::SeqCst);
        let state = self.read();
        let probes: HashSet<&ProbeId> = probes.iter().collect();
        Ok(experiments
            .iter()
            .filter_map(|e| state.processed.get(e))
            .flatten()
            .filter(|v| probes.contains(&v.probe))
            .cloned()
            .collect())
    }

    fn count_processed_vectors(&self, experiment: ExperimentId) -> ExprResult<usize> {
        Ok(self.read().processed.get(&experiment).map_or(0, Vec::len))
    }

    fn delete_processed_vectors(&self, experiment: ExperimentId) -> ExprResult<usize> {
        self.calls.deletes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.write();
        if let Some(descriptors) = state.descriptors.get_mut(&experiment) {
            descriptors.retain(|d| !d.is_masked_preferred);
        }
        Ok(state.processed.remove(&experiment).map_or(0, |v| v.len()))
    }

    fn save_processed_vectors(
        &self,
        experiment: ExperimentId,
        descriptor: &QuantitationDescriptor,
        vectors: &[ProcessedVector],
    ) -> ExprResult<DescriptorId> {
        self.calls.saves.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                reason: "injected save failure".to_string(),
            }
            .into());
        }

        let mut state = self.write();
        if !state.experiments.contains_key(&experiment) {
            return Err(StorageError::NotFound {
                entity: "experiment",
                id: experiment.to_string(),
            }
            .into());
        }
        let id = state.allocate_descriptor();

        let descriptors = state.descriptors.entry(experiment).or_default();
        descriptors.retain(|d| !d.is_masked_preferred);
        descriptors.push(QuantitationDescriptor {
            id: Some(id),
            ..descriptor.clone()
        });

        let stored = vectors
            .iter()
            .map(|v| ProcessedVector {
                descriptor: Some(id),
                ..v.clone()
            })
            .collect();
        state.processed.insert(experiment, stored);
        Ok(id)
    }

    fn load_gene_to_probe_map(
        &self,
        genes: &[GeneId],
        platforms: &[PlatformId],
    ) -> ExprResult<HashMap<GeneId, Vec<ProbeId>>> {
        let state = self.read();
        let wanted: HashSet<&GeneId> = genes.iter().collect();
        let mut map: HashMap<GeneId, Vec<ProbeId>> = HashMap::new();
        for probe in state.probes.values().filter(|p| platforms.contains(&p.platform)) {
            for gene in state.probe_genes.get(&probe.id).into_iter().flatten() {
                if wanted.contains(gene) {
                    map.entry(*gene).or_default().push(probe.id);
                }
            }
        }
        Ok(map)
    }

    fn load_probe_genes(
        &self,
        probes: &[ProbeId],
    ) -> ExprResult<HashMap<ProbeId, BTreeSet<GeneId>>> {
        let state = self.read();
        Ok(probes
            .iter()
            .filter_map(|p| state.probe_genes.get(p).map(|g| (*p, g.clone())))
            .collect())
    }
}
