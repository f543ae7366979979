//! Integration test: invalidation racing concurrent readers and writers.

use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

use exprvec_cache::VectorCache;
use exprvec_core::models::{BioAssaySetId, DimensionId, SampleArrangement, SampleId};
use exprvec_core::{DecodedVector, ExperimentId, GeneId, ProbeId};

const EXPERIMENT: ExperimentId = ExperimentId(1);
const GENE: GeneId = GeneId(42);
const COLLECTION_LEN: usize = 25;

/// A collection whose every value carries `generation`, so a torn read
/// (vectors from two different puts) is detectable.
fn collection(generation: f64) -> Vec<DecodedVector> {
    let arrangement = Arc::new(SampleArrangement::new(
        DimensionId(1),
        vec![SampleId(1), SampleId(2), SampleId(3)],
    ));
    (0..COLLECTION_LEN as i64)
        .map(|p| DecodedVector {
            probe: ProbeId(p),
            experiment: EXPERIMENT,
            owner: BioAssaySetId::Experiment(EXPERIMENT),
            arrangement: Arc::clone(&arrangement),
            data: vec![generation; 3],
            genes: BTreeSet::from([GENE]),
            masked: true,
            rank_by_mean: None,
            rank_by_max: None,
            p_value: None,
        })
        .collect()
}

fn assert_whole(vectors: &[DecodedVector]) {
    assert_eq!(vectors.len(), COLLECTION_LEN, "partial collection");
    let generation = vectors[0].data[0];
    assert!(
        vectors.iter().all(|v| v.data.iter().all(|x| *x == generation)),
        "collection mixes generations"
    );
}

#[test]
fn invalidate_racing_100_readers_never_tears() {
    let cache = Arc::new(VectorCache::default());
    cache.put(EXPERIMENT, GENE, collection(1.0)).unwrap();

    let barrier = Arc::new(Barrier::new(101));
    let mut readers = Vec::new();
    for _ in 0..100 {
        let cache = Arc::clone(&cache);
        let barrier = Arc::clone(&barrier);
        readers.push(thread::spawn(move || {
            barrier.wait();
            match cache.get(EXPERIMENT, GENE) {
                Some(vectors) => {
                    assert_whole(&vectors);
                    true
                }
                None => false,
            }
        }));
    }

    barrier.wait();
    assert!(cache.invalidate(EXPERIMENT));

    for reader in readers {
        reader.join().expect("reader should not panic");
    }
    assert_eq!(cache.get(EXPERIMENT, GENE), None);
}

#[test]
fn readers_see_whole_collections_while_writers_and_invalidator_run() {
    let cache = Arc::new(VectorCache::default());

    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for generation in 0..200 {
                cache.put(EXPERIMENT, GENE, collection(generation as f64)).unwrap();
            }
        })
    };
    let invalidator = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for _ in 0..50 {
                cache.invalidate(EXPERIMENT);
                thread::yield_now();
            }
        })
    };
    let readers: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..200 {
                    if let Some(vectors) = cache.get(EXPERIMENT, GENE) {
                        assert_whole(&vectors);
                    }
                }
            })
        })
        .collect();

    writer.join().expect("writer should not panic");
    invalidator.join().expect("invalidator should not panic");
    for reader in readers {
        reader.join().expect("reader should not panic");
    }
}

#[test]
fn invalidate_then_get_is_miss_for_every_gene() {
    let cache = VectorCache::default();
    for g in 0..10 {
        cache.put(EXPERIMENT, GeneId(g), collection(g as f64)).unwrap();
    }
    cache.invalidate(EXPERIMENT);
    for g in 0..10 {
        assert!(cache.get(EXPERIMENT, GeneId(g)).is_none());
    }
    assert_eq!(cache.stats().partition_invalidations, 1);
}
