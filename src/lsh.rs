//! End-to-end LSH pipeline over one dataset.
//!
//! [`LocalitySensitiveHashing`] owns the configuration, the samples and the
//! hash store, and runs the stages in order:
//!
//! 1. [`initialize_hash_store`](LocalitySensitiveHashing::initialize_hash_store):
//!    draw `r*b` hyperplanes from a caller-supplied generator.
//! 2. [`hash_all_data`](LocalitySensitiveHashing::hash_all_data): partition
//!    every sample against every hyperplane.
//! 3. [`nearest_neighbors`](LocalitySensitiveHashing::nearest_neighbors) or
//!    [`neighborhood_clusters`](LocalitySensitiveHashing::neighborhood_clusters):
//!    rebuild signatures and band buckets and extract neighborhoods.
//! 4. Merge, prune, evaluate.
//!
//! Stages 1 and 2 are done once; everything after is derived fresh per
//! call and never mutates earlier output.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cluster::{self, MergeStrategy, QualityReport};
use crate::dataset::Dataset;
use crate::error::{LshError, Result};
use crate::hash::{BandIndex, BitSignatureMatrix, HashStore, HyperplaneFamily};
use crate::neighbors::{self, Neighborhoods, SimilarityGroup};
use crate::params::LshParams;

/// An LSH index over one dataset.
#[derive(Debug, Clone)]
pub struct LocalitySensitiveHashing {
    params: LshParams,
    dataset: Dataset,
    family: Option<HyperplaneFamily>,
    store: Option<HashStore>,
}

impl LocalitySensitiveHashing {
    /// Validate the configuration against the dataset. Nothing is hashed yet.
    pub fn new(params: LshParams, dataset: Dataset) -> Result<Self> {
        params.validate()?;
        if dataset.dim() != params.dim {
            return Err(LshError::DataIntegrity(format!(
                "dataset vectors have dimension {} but dim is configured as {}",
                dataset.dim(),
                params.dim
            )));
        }
        Ok(Self {
            params,
            dataset,
            family: None,
            store: None,
        })
    }

    /// Create, initialize and hash in one step.
    ///
    /// Uses `params.seed` when set; otherwise draws a seed from entropy and
    /// logs it so the build can be reproduced.
    pub fn build(params: LshParams, dataset: Dataset) -> Result<Self> {
        let mut lsh = Self::new(params, dataset)?;
        let seed = lsh.params.seed.unwrap_or_else(|| rand::rng().random());
        tracing::debug!(seed, "seeding hyperplane generator");
        let mut rng = StdRng::seed_from_u64(seed);
        lsh.initialize_hash_store(&mut rng)?;
        lsh.hash_all_data()?;
        Ok(lsh)
    }

    pub fn params(&self) -> &LshParams {
        &self.params
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The hash store, once [`hash_all_data`](Self::hash_all_data) has run.
    pub fn hash_store(&self) -> Option<&HashStore> {
        self.store.as_ref()
    }

    /// Draw the `r*b` hyperplanes. Discards any previous hashing.
    pub fn initialize_hash_store<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let family =
            HyperplaneFamily::generate(self.params.dim, self.params.num_hashes(), rng)?;
        self.family = Some(family);
        self.store = None;
        Ok(())
    }

    /// Use a caller-built hyperplane family instead of a random one.
    pub fn initialize_hash_store_with(&mut self, family: HyperplaneFamily) -> Result<()> {
        if family.dim() != self.params.dim || family.len() != self.params.num_hashes() {
            return Err(LshError::Configuration(format!(
                "hyperplane family is {} x {} but the index needs {} x {}",
                family.len(),
                family.dim(),
                self.params.num_hashes(),
                self.params.dim
            )));
        }
        self.family = Some(family);
        self.store = None;
        Ok(())
    }

    /// Partition every sample against every hyperplane.
    ///
    /// The hyperplanes move into the hash store. Running this again rehashes
    /// with the same hyperplanes.
    pub fn hash_all_data(&mut self) -> Result<()> {
        let family = match (self.family.take(), self.store.take()) {
            (Some(family), _) => family,
            (None, Some(store)) => store.into_family(),
            (None, None) => {
                return Err(LshError::InvalidState(
                    "hash store not initialized; call initialize_hash_store first".to_string(),
                ))
            }
        };
        match HashStore::partition_all(&family, &self.dataset) {
            Ok(partitions) => {
                let store = HashStore::from_partitions(family, partitions, self.dataset.len());
                store.trace_bins(&self.dataset);
                self.store = Some(store);
                Ok(())
            }
            Err(e) => {
                self.family = Some(family);
                Err(e)
            }
        }
    }

    /// The hyperplanes, whether or not they have been applied yet.
    pub fn hyperplane_family(&self) -> Option<&HyperplaneFamily> {
        self.family
            .as_ref()
            .or_else(|| self.store.as_ref().map(HashStore::family))
    }

    fn require_store(&self) -> Result<&HashStore> {
        self.store.as_ref().ok_or_else(|| {
            LshError::InvalidState("data not hashed; call hash_all_data first".to_string())
        })
    }

    /// Signature matrix and band buckets for the current hash store.
    pub fn band_index(&self) -> Result<BandIndex> {
        let store = self.require_store()?;
        let matrix = BitSignatureMatrix::build(store)?;
        let index = BandIndex::build(&matrix, self.params.r, self.params.b)?;
        let ids: Vec<&str> = self.dataset.ids().collect();
        index.trace_buckets(&ids);
        Ok(index)
    }

    /// Sample -> neighborhood for point queries.
    pub fn nearest_neighbors(&self) -> Result<Neighborhoods> {
        let index = self.band_index()?;
        neighbors::extract_neighborhoods(&index, &self.dataset)
    }

    /// One `{sample} ∪ neighborhood` seed group per sample.
    pub fn neighborhood_clusters(&self) -> Result<Vec<SimilarityGroup>> {
        let index = self.band_index()?;
        let groups = neighbors::extract_similarity_groups(&index, &self.dataset)?;
        tracing::debug!(groups = groups.len(), "extracted similarity groups");
        Ok(groups)
    }

    /// Single-pass coalescence.
    pub fn merge_with_coalescence(&self, groups: &[SimilarityGroup]) -> Vec<SimilarityGroup> {
        cluster::coalesce(groups)
    }

    pub fn merge_with_l2_sample_based(
        &self,
        groups: &[SimilarityGroup],
    ) -> Result<Vec<SimilarityGroup>> {
        let k = self.params.require_expected_num_of_clusters()?;
        cluster::merge_l2_sample_based(groups, &self.dataset, k)
    }

    pub fn merge_with_l2_set_based(
        &self,
        groups: &[SimilarityGroup],
    ) -> Result<Vec<SimilarityGroup>> {
        let k = self.params.require_expected_num_of_clusters()?;
        cluster::merge_l2_set_based(groups, &self.dataset, k)
    }

    /// Run any merge strategy.
    pub fn merge(
        &self,
        strategy: MergeStrategy,
        groups: &[SimilarityGroup],
    ) -> Result<Vec<SimilarityGroup>> {
        match strategy {
            MergeStrategy::Coalescence => Ok(cluster::coalesce(groups)),
            MergeStrategy::CoalescenceToFixedPoint => Ok(cluster::coalesce_to_fixed_point(groups)),
            MergeStrategy::L2SampleBased => self.merge_with_l2_sample_based(groups),
            MergeStrategy::L2SetBased => self.merge_with_l2_set_based(groups),
        }
    }

    /// Drop groups at or below the configured size threshold.
    pub fn prune(&self, groups: &[SimilarityGroup]) -> Result<Vec<SimilarityGroup>> {
        let threshold = self.params.require_min_size_threshold()?;
        Ok(cluster::prune(groups, threshold))
    }

    /// Seed groups, merged with `strategy`, then pruned when a size
    /// threshold is configured.
    pub fn cluster(&self, strategy: MergeStrategy) -> Result<Vec<SimilarityGroup>> {
        let seeds = self.neighborhood_clusters()?;
        let merged = self.merge(strategy, &seeds)?;
        match self.params.similarity_group_min_size_threshold {
            Some(threshold) => Ok(cluster::prune(&merged, threshold)),
            None => Ok(merged),
        }
    }

    /// Label-purity report for a clustering of this dataset.
    pub fn evaluate(&self, groups: &[SimilarityGroup]) -> Result<QualityReport> {
        cluster::evaluate(groups, &self.dataset)
    }
}
