//! Neighborhood extraction from band buckets.
//!
//! The neighborhood of a sample is every other sample it shares a bucket
//! with, in any band. Two output modes:
//!
//! - [`extract_neighborhoods`]: sample -> neighborhood, for point queries.
//! - [`extract_similarity_groups`]: one group per sample,
//!   `{sample} ∪ neighborhood(sample)`, as cluster seeds. Groups are neither
//!   deduplicated nor merged here.
//!
//! Cost is the sum of squared bucket sizes (see
//! [`BandIndex::collision_work`]); a single bucket holding most of the data
//! makes this quadratic.

use std::collections::{BTreeMap, BTreeSet};

use crate::dataset::Dataset;
use crate::error::{LshError, Result};
use crate::hash::BandIndex;

/// A set of sample identifiers.
pub type SimilarityGroup = BTreeSet<String>;

/// Per-sample neighborhoods, keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighborhoods {
    map: BTreeMap<String, BTreeSet<String>>,
}

impl Neighborhoods {
    /// Neighborhood of one sample, or `None` if the identifier is unknown.
    pub fn lookup(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.map.get(id)
    }

    /// `(id, neighborhood)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> + '_ {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Fold each sample into its own neighborhood, in canonical order.
    pub fn into_similarity_groups(self) -> Vec<SimilarityGroup> {
        self.map
            .into_iter()
            .map(|(id, mut group)| {
                group.insert(id);
                group
            })
            .collect()
    }
}

/// Neighborhoods as sample positions. Entry `s` never contains `s`.
pub fn neighborhood_positions(index: &BandIndex) -> Vec<BTreeSet<usize>> {
    let mut neighborhoods = vec![BTreeSet::new(); index.num_samples()];
    for members in index.bucket_members() {
        if members.len() < 2 {
            continue;
        }
        for &s in members {
            neighborhoods[s].extend(members.iter().copied().filter(|&o| o != s));
        }
    }
    neighborhoods
}

/// Nearest-neighbor mode: sample identifier -> neighborhood.
pub fn extract_neighborhoods(index: &BandIndex, dataset: &Dataset) -> Result<Neighborhoods> {
    check_sample_count(index, dataset)?;
    let ids: Vec<&str> = dataset.ids().collect();
    let map = neighborhood_positions(index)
        .into_iter()
        .enumerate()
        .map(|(s, neighbors)| {
            let named = neighbors.into_iter().map(|o| ids[o].to_string()).collect();
            (ids[s].to_string(), named)
        })
        .collect();
    Ok(Neighborhoods { map })
}

/// Cluster-seed mode: one `{sample} ∪ neighborhood(sample)` group per sample,
/// in canonical sample order.
pub fn extract_similarity_groups(
    index: &BandIndex,
    dataset: &Dataset,
) -> Result<Vec<SimilarityGroup>> {
    Ok(extract_neighborhoods(index, dataset)?.into_similarity_groups())
}

fn check_sample_count(index: &BandIndex, dataset: &Dataset) -> Result<()> {
    if index.num_samples() != dataset.len() {
        return Err(LshError::InvalidState(format!(
            "band index covers {} samples but the dataset has {}",
            index.num_samples(),
            dataset.len()
        )));
    }
    Ok(())
}
