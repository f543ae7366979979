//! RetrievalCoordinator: cache-first gene retrieval across experiments and
//! sub-cohorts.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use exprvec_cache::{PartitionHandle, VectorCache};
use exprvec_core::config::RetrievalConfig;
use exprvec_core::errors::{ExprResult, StorageError};
use exprvec_core::{
    BioAssaySet, Cancellation, DecodedVector, ExperimentId, ExprConfig, GeneId, IVectorStore,
    ProbeId, SubCohortId,
};
use exprvec_observability::retrieval_span;
use exprvec_processing::BatchRetriever;

use crate::decode::decode_all;
use crate::slicing::slice;

/// Per-experiment vectors keyed by gene, as served from cache or store.
type GeneVectors = BTreeMap<GeneId, Vec<DecodedVector>>;

/// Public read entry point. Cheap to share behind an `Arc`.
pub struct RetrievalCoordinator {
    store: Arc<dyn IVectorStore>,
    cache: Arc<VectorCache>,
    config: RetrievalConfig,
}

impl RetrievalCoordinator {
    pub fn new(store: Arc<dyn IVectorStore>, cache: Arc<VectorCache>, config: &ExprConfig) -> Self {
        Self {
            store,
            cache,
            config: config.retrieval.clone(),
        }
    }

    pub fn cache(&self) -> &VectorCache {
        &self.cache
    }

    /// Load a sub-cohort as a request element.
    pub fn sub_cohort(&self, id: SubCohortId) -> ExprResult<BioAssaySet> {
        self.store
            .load_sub_cohort(id)?
            .map(BioAssaySet::SubCohort)
            .ok_or_else(|| {
                StorageError::NotFound {
                    entity: "sub-cohort",
                    id: id.to_string(),
                }
                .into()
            })
    }

    /// Decoded vectors for `genes` in every element of `sets`.
    ///
    /// Sub-cohort elements are served by slicing their source experiment's
    /// vectors. The result is deduplicated by (probe, owner) and sorted by
    /// owner then probe. Genes with no data contribute nothing; that is not
    /// an error.
    pub fn retrieve(
        &self,
        sets: &[BioAssaySet],
        genes: &[GeneId],
        cancel: &Cancellation,
    ) -> ExprResult<Vec<DecodedVector>> {
        let _span = retrieval_span!(sets.len(), genes.len()).entered();
        let genes: BTreeSet<GeneId> = genes.iter().copied().collect();
        let sources: BTreeSet<ExperimentId> =
            sets.iter().map(BioAssaySet::source_experiment).collect();
        if genes.is_empty() || sources.is_empty() {
            return Ok(Vec::new());
        }

        let mut per_experiment: HashMap<ExperimentId, GeneVectors> = HashMap::new();
        for &experiment in &sources {
            let vectors = self.experiment_genes(experiment, &genes, cancel)?;
            per_experiment.insert(experiment, vectors);
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for set in sets {
            let Some(by_gene) = per_experiment.get(&set.source_experiment()) else {
                continue;
            };
            for vector in by_gene.values().flatten() {
                let view = match set {
                    BioAssaySet::Experiment(_) => vector.clone(),
                    BioAssaySet::SubCohort(sub) => slice(vector, sub),
                };
                if seen.insert(view.key()) {
                    out.push(view);
                }
            }
        }
        out.sort_by_key(|v| (v.owner, v.probe));

        info!(
            sets = sets.len(),
            genes = genes.len(),
            vectors = out.len(),
            "retrieval complete"
        );
        Ok(out)
    }

    /// Every processed vector of one experiment or sub-cohort, decoded.
    ///
    /// Not gene-keyed, so the cache is neither consulted nor populated.
    pub fn retrieve_experiment(
        &self,
        set: &BioAssaySet,
        cancel: &Cancellation,
    ) -> ExprResult<Vec<DecodedVector>> {
        let experiment = set.source_experiment();
        let entity = self.store.load_experiment(experiment)?.ok_or_else(|| {
            StorageError::NotFound {
                entity: "experiment",
                id: experiment.to_string(),
            }
        })?;
        let probes = self.store.load_probe_ids(&entity.platforms)?;
        let fetched = BatchRetriever::new(Arc::clone(&self.store), &self.config)
            .fetch(&probes, &[experiment], cancel)?;
        let decoded = decode_all(self.store.as_ref(), fetched)?;

        Ok(match set {
            BioAssaySet::Experiment(_) => decoded,
            BioAssaySet::SubCohort(sub) => decoded.iter().map(|v| slice(v, sub)).collect(),
        })
    }

    /// Cached and freshly fetched vectors for `genes` in one experiment.
    fn experiment_genes(
        &self,
        experiment: ExperimentId,
        genes: &BTreeSet<GeneId>,
        cancel: &Cancellation,
    ) -> ExprResult<GeneVectors> {
        // Acquired before any store read: if a rebuild invalidates the
        // partition meanwhile, writes through this handle are discarded.
        let handle = self.cache.partition(experiment);

        let mut found = GeneVectors::new();
        let mut misses = Vec::new();
        for &gene in genes {
            match handle.get(gene) {
                Some(vectors) => {
                    found.insert(gene, vectors);
                }
                None => misses.push(gene),
            }
        }
        debug!(
            experiment = %experiment,
            hits = found.len(),
            misses = misses.len(),
            "cache lookup"
        );

        if !misses.is_empty() {
            let fetched = self.fetch_misses(experiment, &misses, cancel)?;
            self.populate(&handle, &fetched, cancel)?;
            found.extend(fetched);
        }
        Ok(found)
    }

    /// Resolve missed genes to probes and fetch their vectors from the store.
    fn fetch_misses(
        &self,
        experiment: ExperimentId,
        misses: &[GeneId],
        cancel: &Cancellation,
    ) -> ExprResult<GeneVectors> {
        let entity = self.store.load_experiment(experiment)?.ok_or_else(|| {
            StorageError::NotFound {
                entity: "experiment",
                id: experiment.to_string(),
            }
        })?;
        let gene_probes = self
            .store
            .load_gene_to_probe_map(misses, &entity.platforms)?;

        let probes: Vec<ProbeId> = gene_probes
            .values()
            .flatten()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let decoded = if probes.is_empty() {
            Vec::new()
        } else {
            let fetched = BatchRetriever::new(Arc::clone(&self.store), &self.config)
                .fetch(&probes, &[experiment], cancel)?;
            decode_all(self.store.as_ref(), fetched)?
        };

        // A probe annotated to several genes lands under each of them.
        let mut by_gene = GeneVectors::new();
        for &gene in misses {
            let wanted: HashSet<ProbeId> =
                gene_probes.get(&gene).into_iter().flatten().copied().collect();
            let vectors = decoded
                .iter()
                .filter(|v| wanted.contains(&v.probe))
                .cloned()
                .collect();
            by_gene.insert(gene, vectors);
        }
        Ok(by_gene)
    }

    /// Write fetched collections into the partition, all or nothing with
    /// respect to cancellation.
    fn populate(
        &self,
        handle: &PartitionHandle,
        fetched: &GeneVectors,
        cancel: &Cancellation,
    ) -> ExprResult<()> {
        cancel.check("cache population")?;
        let mut stale = false;
        for (&gene, vectors) in fetched {
            stale |= !handle.put(gene, vectors.clone())?;
        }
        if stale {
            debug!(
                experiment = %handle.experiment(),
                "partition invalidated during retrieval; results not cached"
            );
        }
        Ok(())
    }
}
