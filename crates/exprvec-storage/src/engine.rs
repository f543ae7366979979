//! StorageEngine: owns the connection pool, runs migrations at open, and
//! implements `IVectorStore` plus the loader-side insert operations.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, info};

use exprvec_core::config::StorageConfig;
use exprvec_core::errors::{ExprResult, StorageError};
use exprvec_core::models::{Platform, Probe, TechnologyType};
use exprvec_core::{
    DescriptorFilter, DescriptorId, DimensionId, Experiment, ExperimentId, GeneId, IVectorStore,
    PlatformId, ProbeId, ProcessedVector, QuantitationDescriptor, RawVector, SampleArrangement,
    SubCohort, SubCohortId,
};

use crate::migrations;
use crate::pool::pragmas::verify_wal_mode;
use crate::pool::{ConnectionPool, ReadPool};
use crate::queries::{annotations, descriptors, entities, processed, raw};
use crate::to_storage_err;

pub struct StorageEngine {
    pool: ConnectionPool,
}

impl StorageEngine {
    /// Open (or create) a database file with default settings.
    pub fn open(path: &Path) -> ExprResult<Self> {
        Self::open_with_config(path, &StorageConfig::default())
    }

    /// Open the database file named by `config.db_path`.
    pub fn from_config(config: &StorageConfig) -> ExprResult<Self> {
        Self::open_with_config(Path::new(&config.db_path), config)
    }

    pub fn open_with_config(path: &Path, config: &StorageConfig) -> ExprResult<Self> {
        let pool = ConnectionPool::open(path, config)?;
        let readers = pool.readers.as_ref().map_or(0, ReadPool::size);
        let engine = Self { pool };
        engine.initialize()?;
        info!(path = %path.display(), readers, "storage opened");
        Ok(engine)
    }

    /// Private in-memory database; reads share the writer connection.
    pub fn open_in_memory() -> ExprResult<Self> {
        let engine = Self {
            pool: ConnectionPool::open_in_memory()?,
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> ExprResult<()> {
        self.pool.writer.with_conn(|conn| {
            let version = migrations::run_migrations(conn)?;
            debug!(version, "schema ready");
            Ok(())
        })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn schema_version(&self) -> ExprResult<u32> {
        self.with_reader(migrations::current_version)
    }

    /// Whether the writer runs in WAL mode. Always false in memory.
    pub fn is_wal(&self) -> ExprResult<bool> {
        self.pool.writer.with_conn(verify_wal_mode)
    }

    fn with_reader<F, T>(&self, f: F) -> ExprResult<T>
    where
        F: FnOnce(&Connection) -> ExprResult<T>,
    {
        match &self.pool.readers {
            Some(readers) => readers.with_conn(f),
            None => self.pool.writer.with_conn(f),
        }
    }

    /// Run `f` on the writer inside one transaction.
    fn write_tx<F, T>(&self, f: F) -> ExprResult<T>
    where
        F: FnOnce(&Connection) -> ExprResult<T>,
    {
        self.pool.writer.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| to_storage_err(format!("begin: {e}")))?;
            let out = f(&tx)?;
            tx.commit()
                .map_err(|e| to_storage_err(format!("commit: {e}")))?;
            Ok(out)
        })
    }

    // --- Loader operations ---

    pub fn insert_platform(&self, platform: &Platform) -> ExprResult<()> {
        self.pool
            .writer
            .with_conn(|conn| entities::insert_platform(conn, platform))
    }

    pub fn set_platform_technology(
        &self,
        platform: PlatformId,
        technology: Option<TechnologyType>,
    ) -> ExprResult<()> {
        self.pool
            .writer
            .with_conn(|conn| entities::set_technology(conn, platform, technology))
    }

    /// Insert a probe and replace its gene annotations.
    pub fn insert_probe(&self, probe: &Probe, genes: &[GeneId]) -> ExprResult<()> {
        self.write_tx(|conn| {
            entities::insert_probe(conn, probe)?;
            annotations::set_probe_genes(conn, probe.id, genes)
        })
    }

    pub fn insert_experiment(&self, experiment: &Experiment) -> ExprResult<()> {
        self.write_tx(|conn| entities::insert_experiment(conn, experiment))
    }

    pub fn insert_dimension(&self, dimension: &SampleArrangement) -> ExprResult<()> {
        self.write_tx(|conn| entities::insert_dimension(conn, dimension))
    }

    pub fn insert_descriptor(
        &self,
        experiment: ExperimentId,
        descriptor: &QuantitationDescriptor,
    ) -> ExprResult<DescriptorId> {
        self.write_tx(|conn| descriptors::insert_descriptor(conn, experiment, descriptor))
    }

    pub fn insert_raw_vector(&self, vector: &RawVector) -> ExprResult<()> {
        self.pool.writer.with_conn(|conn| {
            raw::insert_raw_vector(conn, vector)?;
            Ok(())
        })
    }

    /// Insert many raw vectors in one transaction.
    pub fn insert_raw_vectors(&self, vectors: &[RawVector]) -> ExprResult<usize> {
        self.write_tx(|conn| {
            for vector in vectors {
                raw::insert_raw_vector(conn, vector)?;
            }
            Ok(vectors.len())
        })
    }

    pub fn insert_sub_cohort(&self, sub_cohort: &SubCohort) -> ExprResult<()> {
        self.write_tx(|conn| entities::insert_sub_cohort(conn, sub_cohort))
    }
}

impl IVectorStore for StorageEngine {
    fn load_experiment(&self, id: ExperimentId) -> ExprResult<Option<Experiment>> {
        self.with_reader(|conn| entities::get_experiment(conn, id))
    }

    fn load_sub_cohort(&self, id: SubCohortId) -> ExprResult<Option<SubCohort>> {
        self.with_reader(|conn| entities::get_sub_cohort(conn, id))
    }

    fn load_platforms(&self, ids: &[PlatformId]) -> ExprResult<Vec<Platform>> {
        self.with_reader(|conn| entities::get_platforms(conn, ids))
    }

    fn load_probe_ids(&self, platforms: &[PlatformId]) -> ExprResult<Vec<ProbeId>> {
        self.with_reader(|conn| entities::get_probe_ids(conn, platforms))
    }

    fn load_dimensions(&self, ids: &[DimensionId]) -> ExprResult<Vec<SampleArrangement>> {
        self.with_reader(|conn| entities::get_dimensions(conn, ids))
    }

    fn load_descriptors(
        &self,
        experiment: ExperimentId,
    ) -> ExprResult<Vec<QuantitationDescriptor>> {
        self.with_reader(|conn| descriptors::get_descriptors(conn, experiment))
    }

    fn load_raw_vectors(
        &self,
        probes: &[ProbeId],
        experiments: &[ExperimentId],
        filter: DescriptorFilter,
    ) -> ExprResult<Vec<RawVector>> {
        self.with_reader(|conn| {
            let mut wanted = HashSet::new();
            for &experiment in experiments {
                wanted.extend(
                    descriptors::get_descriptors(conn, experiment)?
                        .iter()
                        .filter(|d| filter.matches(d))
                        .filter_map(|d| d.id),
                );
            }
            raw::get_raw_vectors(conn, probes, experiments, &wanted)
        })
    }

    fn load_processed_vectors(
        &self,
        probes: &[ProbeId],
        experiments: &[ExperimentId],
    ) -> ExprResult<Vec<ProcessedVector>> {
        self.with_reader(|conn| processed::get_processed_vectors(conn, probes, experiments))
    }

    fn count_processed_vectors(&self, experiment: ExperimentId) -> ExprResult<usize> {
        self.with_reader(|conn| processed::count_for_experiment(conn, experiment))
    }

    fn delete_processed_vectors(&self, experiment: ExperimentId) -> ExprResult<usize> {
        let removed = self.write_tx(|conn| {
            let removed = processed::delete_for_experiment(conn, experiment)?;
            descriptors::delete_masked_preferred(conn, experiment)?;
            Ok(removed)
        })?;
        debug!(experiment = %experiment, removed, "processed vectors deleted");
        Ok(removed)
    }

    fn save_processed_vectors(
        &self,
        experiment: ExperimentId,
        descriptor: &QuantitationDescriptor,
        vectors: &[ProcessedVector],
    ) -> ExprResult<DescriptorId> {
        let id = self.write_tx(|conn| {
            if entities::get_experiment(conn, experiment)?.is_none() {
                return Err(StorageError::NotFound {
                    entity: "experiment",
                    id: experiment.to_string(),
                }
                .into());
            }
            processed::delete_for_experiment(conn, experiment)?;
            descriptors::delete_masked_preferred(conn, experiment)?;
            let id = descriptors::insert_descriptor(
                conn,
                experiment,
                &QuantitationDescriptor {
                    id: None,
                    ..descriptor.clone()
                },
            )?;
            processed::insert_processed_vectors(conn, experiment, id, vectors)?;
            Ok(id)
        })?;
        debug!(
            experiment = %experiment,
            descriptor = %id,
            vectors = vectors.len(),
            "processed vectors saved"
        );
        Ok(id)
    }

    fn load_gene_to_probe_map(
        &self,
        genes: &[GeneId],
        platforms: &[PlatformId],
    ) -> ExprResult<HashMap<GeneId, Vec<ProbeId>>> {
        self.with_reader(|conn| annotations::gene_to_probes(conn, genes, platforms))
    }

    fn load_probe_genes(
        &self,
        probes: &[ProbeId],
    ) -> ExprResult<HashMap<ProbeId, BTreeSet<GeneId>>> {
        self.with_reader(|conn| annotations::probe_genes(conn, probes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_engine_migrates_to_latest() {
        let engine = StorageEngine::open_in_memory().unwrap();
        assert_eq!(engine.schema_version().unwrap(), migrations::LATEST_VERSION);
        assert!(!engine.is_wal().unwrap());
    }

    #[test]
    fn missing_entities_load_as_none() {
        let engine = StorageEngine::open_in_memory().unwrap();
        assert!(engine.load_experiment(ExperimentId(1)).unwrap().is_none());
        assert!(engine.load_sub_cohort(SubCohortId(1)).unwrap().is_none());
        assert!(engine.load_dimensions(&[DimensionId(1)]).unwrap().is_empty());
        assert_eq!(engine.count_processed_vectors(ExperimentId(1)).unwrap(), 0);
        assert_eq!(engine.delete_processed_vectors(ExperimentId(1)).unwrap(), 0);
    }
}
