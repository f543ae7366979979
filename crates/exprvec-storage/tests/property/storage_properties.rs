//! Property tests: stored blobs are bit-exact and any tampering is caught.

use proptest::prelude::*;
use rusqlite::{params, Connection};

use exprvec_core::errors::StorageError;
use exprvec_core::models::{
    GeneralType, Platform, Probe, ScaleType, StandardQuantitationType, TechnologyType,
};
use exprvec_core::{
    DescriptorFilter, DimensionId, Experiment, ExperimentId, ExprError, IVectorStore, PlatformId,
    PrimitiveType, ProbeId, QuantitationDescriptor, RawVector, SampleArrangement, SampleId,
};
use exprvec_storage::StorageEngine;

fn seed(engine: &StorageEngine, blob: &[u8]) {
    engine
        .insert_platform(&Platform {
            id: PlatformId(1),
            short_name: "GPL1".to_string(),
            technology: Some(TechnologyType::OneColor),
        })
        .unwrap();
    engine
        .insert_probe(
            &Probe {
                id: ProbeId(1),
                platform: PlatformId(1),
                name: "p1".to_string(),
            },
            &[],
        )
        .unwrap();
    engine
        .insert_experiment(&Experiment {
            id: ExperimentId(1),
            short_name: "GSE1".to_string(),
            platforms: vec![PlatformId(1)],
        })
        .unwrap();
    engine
        .insert_dimension(&SampleArrangement::new(DimensionId(1), vec![SampleId(1)]))
        .unwrap();
    let descriptor = engine
        .insert_descriptor(
            ExperimentId(1),
            &QuantitationDescriptor {
                id: None,
                name: "VALUE".to_string(),
                description: String::new(),
                primitive_type: PrimitiveType::Double,
                general_type: GeneralType::Quantitative,
                quantitation_type: StandardQuantitationType::Amount,
                scale: ScaleType::Linear,
                is_preferred: true,
                is_masked_preferred: false,
                is_background: false,
                is_background_subtracted: false,
                is_normalized: false,
                is_ratio: false,
            },
        )
        .unwrap();
    engine
        .insert_raw_vector(&RawVector {
            experiment: ExperimentId(1),
            probe: ProbeId(1),
            descriptor,
            dimension: DimensionId(1),
            data: blob.to_vec(),
        })
        .unwrap();
}

fn load(engine: &StorageEngine) -> Result<Vec<RawVector>, ExprError> {
    engine.load_raw_vectors(&[ProbeId(1)], &[ExperimentId(1)], DescriptorFilter::Preferred)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_blobs_load_bit_exact(blob in prop::collection::vec(any::<u8>(), 1..256)) {
        let engine = StorageEngine::open_in_memory().unwrap();
        seed(&engine, &blob);
        let loaded = load(&engine).unwrap();
        prop_assert_eq!(loaded.len(), 1);
        prop_assert_eq!(&loaded[0].data, &blob);
    }

    #[test]
    fn prop_any_flipped_byte_is_corruption(
        blob in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prop.db");
        let engine = StorageEngine::open(&path).unwrap();
        seed(&engine, &blob);

        let mut tampered = blob.clone();
        let at = index.index(tampered.len());
        tampered[at] ^= mask;
        let conn = Connection::open(&path).unwrap();
        conn.execute("UPDATE raw_vectors SET data = ?1", params![tampered]).unwrap();

        let err = load(&engine).unwrap_err();
        prop_assert!(matches!(err, ExprError::StorageError(StorageError::Corruption { .. })), "expected Corruption error, got {:?}", err);
    }
}
