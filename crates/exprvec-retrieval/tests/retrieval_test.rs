//! Integration tests: rebuild, then retrieve through the cache.

use std::sync::Arc;
use std::thread;

use exprvec_cache::VectorCache;
use exprvec_core::{
    BioAssaySet, BioAssaySetId, Cancellation, ExperimentId, ExprConfig, ExprError, GeneId,
    IVectorStore, ProbeId, SampleId, SubCohortId,
};
use exprvec_processing::RebuildWorkflow;
use exprvec_retrieval::RetrievalCoordinator;
use test_fixtures::{assert_nan_eq, two_channel_scenario, InMemoryStore, Installed};

struct Engine {
    store: Arc<InMemoryStore>,
    cache: Arc<VectorCache>,
    rebuild: RebuildWorkflow,
    coordinator: RetrievalCoordinator,
    installed: Installed,
}

fn engine() -> Engine {
    let store = Arc::new(InMemoryStore::new());
    let installed = two_channel_scenario().install(&store);
    let cache = Arc::new(VectorCache::default());
    let config = ExprConfig::default();
    let dyn_store: Arc<dyn IVectorStore> = store.clone();
    let rebuild = RebuildWorkflow::new(Arc::clone(&dyn_store), Arc::clone(&cache), &config);
    let coordinator = RetrievalCoordinator::new(dyn_store, Arc::clone(&cache), &config);
    rebuild
        .run(installed.experiment, &Cancellation::new())
        .unwrap();
    Engine {
        store,
        cache,
        rebuild,
        coordinator,
        installed,
    }
}

impl Engine {
    fn experiment(&self) -> BioAssaySet {
        BioAssaySet::Experiment(self.installed.experiment)
    }

    fn sub_cohort(&self) -> BioAssaySet {
        BioAssaySet::SubCohort(self.installed.sub_cohorts[0].clone())
    }

    fn retrieve(&self, sets: &[BioAssaySet], genes: &[i64]) -> Vec<exprvec_core::DecodedVector> {
        let genes: Vec<GeneId> = genes.iter().copied().map(GeneId).collect();
        self.coordinator
            .retrieve(sets, &genes, &Cancellation::new())
            .unwrap()
    }
}

#[test]
fn masked_probe_is_served_with_nan() {
    let e = engine();
    let out = e.retrieve(&[e.experiment()], &[102]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].probe, ProbeId(2));
    assert!(out[0].masked);
    assert_nan_eq(&out[0].data, &[3.0, f64::NAN]);
    assert_eq!(out[0].arrangement.samples, vec![SampleId(11), SampleId(12)]);
}

#[test]
fn repeated_query_is_served_from_cache() {
    let e = engine();
    e.retrieve(&[e.experiment()], &[102, 103]);
    let loads = e.store.processed_load_calls();
    let again = e.retrieve(&[e.experiment()], &[102, 103]);
    assert_eq!(again.len(), 2);
    assert_eq!(e.store.processed_load_calls(), loads);
    assert!(e.cache.stats().hits >= 2);
}

#[test]
fn probe_shared_by_genes_is_returned_once() {
    let e = engine();
    // p1 carries genes 101 and 200; p3 carries 103 and 200.
    let out = e.retrieve(&[e.experiment()], &[101, 200]);
    let probes: Vec<ProbeId> = out.iter().map(|v| v.probe).collect();
    assert_eq!(probes, vec![ProbeId(1), ProbeId(3)]);
    assert!(e.cache.contains(e.installed.experiment, GeneId(101)));
    assert!(e.cache.contains(e.installed.experiment, GeneId(200)));
}

#[test]
fn sub_cohort_is_sliced_and_never_cached_under_its_own_identity() {
    let e = engine();
    let out = e.retrieve(&[e.experiment(), e.sub_cohort()], &[102]);
    assert_eq!(out.len(), 2);

    let full = out
        .iter()
        .find(|v| v.owner == BioAssaySetId::Experiment(e.installed.experiment))
        .unwrap();
    let sliced = out
        .iter()
        .find(|v| v.owner == BioAssaySetId::SubCohort(SubCohortId(1)))
        .unwrap();
    assert_nan_eq(&full.data, &[3.0, f64::NAN]);
    assert_nan_eq(&sliced.data, &[f64::NAN]);
    assert!(sliced.arrangement.is_derived());

    assert_eq!(e.cache.partition_count(), 1);
    let cached = e.cache.get(e.installed.experiment, GeneId(102)).unwrap();
    assert_eq!(cached[0].data.len(), 2);
}

#[test]
fn sub_cohort_alone_resolves_to_source_experiment() {
    let e = engine();
    let set = e.coordinator.sub_cohort(SubCohortId(1)).unwrap();
    let out = e.retrieve(&[set], &[101]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].data, vec![2.0]);
    assert!(e.cache.contains(e.installed.experiment, GeneId(101)));
}

#[test]
fn unknown_gene_is_an_empty_result() {
    let e = engine();
    let loads = e.store.processed_load_calls();
    assert!(e.retrieve(&[e.experiment()], &[9999]).is_empty());
    assert_eq!(e.store.processed_load_calls(), loads);
    assert!(e.retrieve(&[e.experiment()], &[]).is_empty());
}

#[test]
fn failed_rebuild_is_served_as_empty_not_stale() {
    let e = engine();
    assert_eq!(e.retrieve(&[e.experiment()], &[102]).len(), 1);

    e.store.duplicate_raw_vectors(e.installed.experiment, ProbeId(3));
    assert!(e
        .rebuild
        .run(e.installed.experiment, &Cancellation::new())
        .is_err());

    assert!(e.retrieve(&[e.experiment()], &[102]).is_empty());
}

#[test]
fn rebuild_drops_cached_genes() {
    let e = engine();
    e.retrieve(&[e.experiment()], &[102]);
    assert!(e.cache.contains(e.installed.experiment, GeneId(102)));
    e.rebuild
        .run(e.installed.experiment, &Cancellation::new())
        .unwrap();
    assert!(!e.cache.contains(e.installed.experiment, GeneId(102)));
}

#[test]
fn caller_annotations_do_not_leak_into_cache() {
    let e = engine();
    let mut first = e.retrieve(&[e.experiment()], &[102]);
    first[0].p_value = Some(0.001);
    let second = e.retrieve(&[e.experiment()], &[102]);
    assert_eq!(second[0].p_value, None);
}

#[test]
fn cancelled_retrieval_writes_nothing() {
    let e = engine();
    let cancel = Cancellation::new();
    cancel.cancel();
    let err = e
        .coordinator
        .retrieve(&[e.experiment()], &[GeneId(102)], &cancel)
        .unwrap_err();
    assert!(matches!(err, ExprError::Cancelled { .. }));
    assert!(!e.cache.contains(e.installed.experiment, GeneId(102)));
}

#[test]
fn whole_experiment_retrieval_bypasses_the_cache() {
    let e = engine();
    let all = e
        .coordinator
        .retrieve_experiment(&e.experiment(), &Cancellation::new())
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_nan_eq(&all[1].data, &[3.0, f64::NAN]);
    assert_eq!(e.cache.partition_len(e.installed.experiment), 0);

    let sliced = e
        .coordinator
        .retrieve_experiment(&e.sub_cohort(), &Cancellation::new())
        .unwrap();
    assert!(sliced.iter().all(|v| v.data.len() == 1));
}

#[test]
fn unknown_experiment_is_not_found() {
    let e = engine();
    let err = e
        .coordinator
        .retrieve(
            &[BioAssaySet::Experiment(ExperimentId(77))],
            &[GeneId(102)],
            &Cancellation::new(),
        )
        .unwrap_err();
    assert!(err.is_store_error());
}

#[test]
fn retrieval_racing_rebuilds_converges() {
    let e = Arc::new(engine());
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let e = Arc::clone(&e);
            thread::spawn(move || {
                for _ in 0..25 {
                    let out = e.retrieve(&[e.experiment()], &[102, 200]);
                    // Mid-rebuild a gene may come back empty, but a vector
                    // is never partial.
                    assert!(out.len() <= 3);
                    for v in &out {
                        assert_eq!(v.data.len(), 2, "torn vector for {}", v.probe);
                    }
                }
            })
        })
        .collect();
    let writer = {
        let e = Arc::clone(&e);
        thread::spawn(move || {
            for _ in 0..5 {
                e.rebuild
                    .run(e.installed.experiment, &Cancellation::new())
                    .unwrap();
            }
        })
    };
    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }

    let out = e.retrieve(&[e.experiment()], &[102, 200]);
    assert_eq!(out.len(), 3);
}
