//! File-backed storage tests: schema, entity round trips, blob integrity,
//! and the processed-vector swap.

mod common;

use std::collections::BTreeSet;

use rusqlite::{params, Connection};

use exprvec_core::config::StorageConfig;
use exprvec_core::errors::StorageError;
use exprvec_core::models::TechnologyType;
use exprvec_core::{
    DescriptorFilter, ExperimentId, ExprError, GeneId, IVectorStore, PlatformId, ProbeId,
    ProcessedVector, QuantitationDescriptor, SampleId, SubCohortId,
};
use exprvec_storage::migrations::LATEST_VERSION;
use exprvec_storage::pool::ReadPool;
use exprvec_storage::StorageEngine;
use test_fixtures::{two_channel_scenario, Installed, ScenarioFixture};

use common::{temp_db, Sqlite};

fn seeded(engine: &StorageEngine) -> (ScenarioFixture, Installed) {
    let scenario = two_channel_scenario();
    let installed = scenario.install_into(&Sqlite(engine));
    (scenario, installed)
}

fn processed(installed: &Installed, probe: i64, values: &[f64]) -> ProcessedVector {
    ProcessedVector {
        experiment: installed.experiment,
        probe: ProbeId(probe),
        descriptor: None,
        dimension: installed.dimension,
        data: exprvec_codec::encode_doubles(values),
        rank_by_mean: Some(0.5),
        rank_by_max: None,
    }
}

fn masked_descriptor(engine: &StorageEngine, installed: &Installed) -> QuantitationDescriptor {
    engine
        .load_descriptors(installed.experiment)
        .unwrap()
        .into_iter()
        .find(|d| d.is_preferred)
        .unwrap()
        .derive_masked_preferred()
}

// ═══════════════════════════════════════════════════════════════════════════
// SCHEMA
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn file_database_runs_in_wal_mode_at_latest_schema() {
    let (_dir, path) = temp_db();
    let engine = StorageEngine::open(&path).unwrap();
    assert!(engine.is_wal().unwrap());
    assert_eq!(engine.schema_version().unwrap(), LATEST_VERSION);
}

#[test]
fn config_names_the_file_and_sizes_the_read_pool() {
    let (_dir, path) = temp_db();
    let config = StorageConfig {
        db_path: path.to_string_lossy().into_owned(),
        read_pool_size: 64,
        ..StorageConfig::default()
    };
    let engine = StorageEngine::from_config(&config).unwrap();
    assert!(path.exists());
    assert_eq!(engine.pool().db_path.as_deref(), Some(path.as_path()));
    assert_eq!(engine.pool().readers.as_ref().map(ReadPool::size), Some(16));
    assert_eq!(engine.schema_version().unwrap(), LATEST_VERSION);
}

#[test]
fn reopening_does_not_reapply_migrations() {
    let (_dir, path) = temp_db();
    drop(StorageEngine::open(&path).unwrap());
    drop(StorageEngine::open(&path).unwrap());

    let conn = Connection::open(&path).unwrap();
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, i64::from(LATEST_VERSION));
}

// ═══════════════════════════════════════════════════════════════════════════
// ENTITIES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn seeded_entities_load_back() {
    let (_dir, path) = temp_db();
    let engine = StorageEngine::open(&path).unwrap();
    let (scenario, installed) = seeded(&engine);

    let experiment = engine.load_experiment(installed.experiment).unwrap().unwrap();
    assert_eq!(experiment.short_name, scenario.short_name);
    assert_eq!(experiment.platforms, vec![installed.platform]);

    let platforms = engine.load_platforms(&[installed.platform, PlatformId(404)]).unwrap();
    assert_eq!(platforms.len(), 1);
    assert_eq!(platforms[0].technology, Some(TechnologyType::TwoColor));

    let dims = engine.load_dimensions(&[installed.dimension]).unwrap();
    assert_eq!(dims[0].samples, vec![SampleId(11), SampleId(12)]);

    let probes = engine.load_probe_ids(&[installed.platform]).unwrap();
    assert_eq!(probes, vec![ProbeId(1), ProbeId(2), ProbeId(3)]);

    let sub = engine.load_sub_cohort(SubCohortId(1)).unwrap().unwrap();
    assert_eq!(sub.source, installed.experiment);
    assert_eq!(sub.samples, vec![SampleId(12)]);

    let descriptors = engine.load_descriptors(installed.experiment).unwrap();
    assert_eq!(descriptors.len(), 2);
    assert!(descriptors.iter().any(|d| d.is_preferred));
    assert!(descriptors.iter().any(|d| d.is_presence_call()));
}

#[test]
fn gene_annotations_resolve_both_ways() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let (_, installed) = seeded(&engine);

    let map = engine
        .load_gene_to_probe_map(&[GeneId(200), GeneId(102), GeneId(999)], &[installed.platform])
        .unwrap();
    assert_eq!(map[&GeneId(200)], vec![ProbeId(1), ProbeId(3)]);
    assert_eq!(map[&GeneId(102)], vec![ProbeId(2)]);
    assert!(!map.contains_key(&GeneId(999)));

    // Annotations are platform-scoped.
    let other = engine
        .load_gene_to_probe_map(&[GeneId(200)], &[PlatformId(404)])
        .unwrap();
    assert!(other.is_empty());

    let genes = engine.load_probe_genes(&[ProbeId(1)]).unwrap();
    assert_eq!(genes[&ProbeId(1)], BTreeSet::from([GeneId(101), GeneId(200)]));
}

#[test]
fn technology_can_be_cleared() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let (_, installed) = seeded(&engine);
    engine
        .set_platform_technology(installed.platform, None)
        .unwrap();
    let platforms = engine.load_platforms(&[installed.platform]).unwrap();
    assert_eq!(platforms[0].technology, None);

    let err = engine
        .set_platform_technology(PlatformId(404), Some(TechnologyType::OneColor))
        .unwrap_err();
    assert!(matches!(
        err,
        ExprError::StorageError(StorageError::NotFound { .. })
    ));
}

// ═══════════════════════════════════════════════════════════════════════════
// RAW VECTORS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn raw_loads_honor_the_descriptor_filter() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let (_, installed) = seeded(&engine);
    let probes = [ProbeId(1), ProbeId(2), ProbeId(3)];
    let experiments = [installed.experiment];

    let preferred = engine
        .load_raw_vectors(&probes, &experiments, DescriptorFilter::Preferred)
        .unwrap();
    assert_eq!(preferred.len(), 3);
    assert!(preferred
        .iter()
        .all(|v| v.descriptor == installed.signal_descriptor));

    let presence = engine
        .load_raw_vectors(&probes, &experiments, DescriptorFilter::PresenceCall)
        .unwrap();
    assert_eq!(presence.len(), 3);

    let one = engine
        .load_raw_vectors(
            &[ProbeId(2)],
            &experiments,
            DescriptorFilter::Descriptor(installed.presence_descriptor),
        )
        .unwrap();
    assert_eq!(one.len(), 1);

    let elsewhere = engine
        .load_raw_vectors(&probes, &[ExperimentId(404)], DescriptorFilter::Preferred)
        .unwrap();
    assert!(elsewhere.is_empty());
}

#[test]
fn duplicate_raw_vectors_are_returned_as_stored() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let (_, installed) = seeded(&engine);
    let mut copy = engine
        .load_raw_vectors(&[ProbeId(3)], &[installed.experiment], DescriptorFilter::Preferred)
        .unwrap();
    engine.insert_raw_vectors(&copy).unwrap();
    copy = engine
        .load_raw_vectors(&[ProbeId(3)], &[installed.experiment], DescriptorFilter::Preferred)
        .unwrap();
    assert_eq!(copy.len(), 2);
}

#[test]
fn tampered_raw_blob_is_reported_as_corruption() {
    let (_dir, path) = temp_db();
    let engine = StorageEngine::open(&path).unwrap();
    let (_, installed) = seeded(&engine);

    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE raw_vectors SET data = ?1 WHERE probe_id = 2 AND descriptor_id = ?2",
        params![
            exprvec_codec::encode_doubles(&[3.0, 4.5]),
            installed.signal_descriptor.value()
        ],
    )
    .unwrap();

    let err = engine
        .load_raw_vectors(&[ProbeId(2)], &[installed.experiment], DescriptorFilter::Preferred)
        .unwrap_err();
    assert!(matches!(
        err,
        ExprError::StorageError(StorageError::Corruption { .. })
    ));
    assert!(err.is_store_error());

    // Untouched rows still load.
    assert_eq!(
        engine
            .load_raw_vectors(&[ProbeId(1)], &[installed.experiment], DescriptorFilter::Preferred)
            .unwrap()
            .len(),
        1
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// PROCESSED VECTORS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn save_replaces_vectors_and_masked_descriptor() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let (_, installed) = seeded(&engine);
    let masked = masked_descriptor(&engine, &installed);
    let experiment = installed.experiment;

    let first = engine
        .save_processed_vectors(
            experiment,
            &masked,
            &[processed(&installed, 1, &[1.0, 2.0]), processed(&installed, 2, &[3.0, f64::NAN])],
        )
        .unwrap();
    let second = engine
        .save_processed_vectors(experiment, &masked, &[processed(&installed, 3, &[5.0, 6.0])])
        .unwrap();
    assert_ne!(first, second);

    assert_eq!(engine.count_processed_vectors(experiment).unwrap(), 1);
    let loaded = engine
        .load_processed_vectors(&[ProbeId(1), ProbeId(2), ProbeId(3)], &[experiment])
        .unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].probe, ProbeId(3));
    assert_eq!(loaded[0].descriptor, Some(second));
    assert_eq!(loaded[0].rank_by_mean, Some(0.5));

    let masked_ids: Vec<_> = engine
        .load_descriptors(experiment)
        .unwrap()
        .into_iter()
        .filter(|d| d.is_masked_preferred)
        .filter_map(|d| d.id)
        .collect();
    assert_eq!(masked_ids, vec![second]);
}

#[test]
fn failed_save_leaves_previous_vectors_in_place() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let (_, installed) = seeded(&engine);
    let masked = masked_descriptor(&engine, &installed);
    let experiment = installed.experiment;

    let kept = engine
        .save_processed_vectors(experiment, &masked, &[processed(&installed, 1, &[1.0, 2.0])])
        .unwrap();

    // Probe 999 does not exist; the foreign key fails after the delete and
    // the first insert have already run.
    let err = engine
        .save_processed_vectors(
            experiment,
            &masked,
            &[processed(&installed, 2, &[3.0, 4.0]), processed(&installed, 999, &[0.0, 0.0])],
        )
        .unwrap_err();
    assert!(err.is_store_error());

    let loaded = engine
        .load_processed_vectors(&[ProbeId(1), ProbeId(2)], &[experiment])
        .unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].probe, ProbeId(1));
    assert_eq!(loaded[0].descriptor, Some(kept));
}

#[test]
fn save_to_unknown_experiment_is_not_found() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let (_, installed) = seeded(&engine);
    let masked = masked_descriptor(&engine, &installed);
    let err = engine
        .save_processed_vectors(ExperimentId(404), &masked, &[])
        .unwrap_err();
    assert!(matches!(
        err,
        ExprError::StorageError(StorageError::NotFound { .. })
    ));
}

#[test]
fn delete_removes_vectors_and_masked_descriptor_only() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let (_, installed) = seeded(&engine);
    let masked = masked_descriptor(&engine, &installed);
    engine
        .save_processed_vectors(
            installed.experiment,
            &masked,
            &[processed(&installed, 1, &[1.0, 2.0]), processed(&installed, 3, &[5.0, 6.0])],
        )
        .unwrap();

    assert_eq!(engine.delete_processed_vectors(installed.experiment).unwrap(), 2);
    assert_eq!(engine.delete_processed_vectors(installed.experiment).unwrap(), 0);

    let descriptors = engine.load_descriptors(installed.experiment).unwrap();
    assert_eq!(descriptors.len(), 2);
    assert!(descriptors.iter().all(|d| !d.is_masked_preferred));
}

#[test]
fn tampered_processed_blob_is_reported_as_corruption() {
    let (_dir, path) = temp_db();
    let engine = StorageEngine::open(&path).unwrap();
    let (_, installed) = seeded(&engine);
    let masked = masked_descriptor(&engine, &installed);
    engine
        .save_processed_vectors(installed.experiment, &masked, &[processed(&installed, 1, &[1.0, 2.0])])
        .unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute("UPDATE processed_vectors SET checksum = 'deadbeef'", [])
        .unwrap();

    let err = engine
        .load_processed_vectors(&[ProbeId(1)], &[installed.experiment])
        .unwrap_err();
    assert!(matches!(
        err,
        ExprError::StorageError(StorageError::Corruption { .. })
    ));
}

#[test]
fn processed_vectors_survive_restart() {
    let (_dir, path) = temp_db();
    let installed = {
        let engine = StorageEngine::open(&path).unwrap();
        let (_, installed) = seeded(&engine);
        let masked = masked_descriptor(&engine, &installed);
        engine
            .save_processed_vectors(
                installed.experiment,
                &masked,
                &[processed(&installed, 2, &[3.0, f64::NAN])],
            )
            .unwrap();
        installed
    };

    let engine = StorageEngine::open(&path).unwrap();
    let loaded = engine
        .load_processed_vectors(&[ProbeId(2)], &[installed.experiment])
        .unwrap();
    assert_eq!(loaded.len(), 1);
    let values = exprvec_codec::decode_doubles(&loaded[0].data).unwrap();
    assert_eq!(values[0], 3.0);
    assert!(values[1].is_nan());
}
