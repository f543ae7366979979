//! Shared helpers for the storage integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;

use exprvec_core::models::{Platform, Probe};
use exprvec_core::{
    DescriptorId, Experiment, ExperimentId, GeneId, QuantitationDescriptor, RawVector,
    SampleArrangement, SubCohort,
};
use exprvec_storage::StorageEngine;
use test_fixtures::SeedStore;

/// Seeds a `StorageEngine` through its loader operations.
pub struct Sqlite<'a>(pub &'a StorageEngine);

impl SeedStore for Sqlite<'_> {
    fn seed_platform(&self, platform: Platform) {
        self.0.insert_platform(&platform).unwrap();
    }

    fn seed_probe(&self, probe: Probe, genes: Vec<GeneId>) {
        self.0.insert_probe(&probe, &genes).unwrap();
    }

    fn seed_experiment(&self, experiment: Experiment) {
        self.0.insert_experiment(&experiment).unwrap();
    }

    fn seed_dimension(&self, dimension: SampleArrangement) {
        self.0.insert_dimension(&dimension).unwrap();
    }

    fn seed_descriptor(
        &self,
        experiment: ExperimentId,
        descriptor: QuantitationDescriptor,
    ) -> DescriptorId {
        self.0.insert_descriptor(experiment, &descriptor).unwrap()
    }

    fn seed_raw_vector(&self, vector: RawVector) {
        self.0.insert_raw_vector(&vector).unwrap();
    }

    fn seed_sub_cohort(&self, sub_cohort: SubCohort) {
        self.0.insert_sub_cohort(&sub_cohort).unwrap();
    }
}

/// A database file in a fresh temp directory. Keep the `TempDir` alive.
pub fn temp_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exprvec.db");
    (dir, path)
}
