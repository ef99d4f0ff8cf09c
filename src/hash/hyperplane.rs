//! Random hyperplane hash functions.
//!
//! Each hash function is a unit normal vector `h` of a hyperplane through
//! the origin. A sample `x` hashes to 1 ("plus") when `h · x >= 0` and to 0
//! ("minus") otherwise. Two vectors at angle `θ` (radians) land on the same
//! side with probability `1 - θ/π`.
//!
//! ## Tie-break
//!
//! A projection of exactly zero goes to "plus". Bucket assignment downstream
//! depends on it, so it must stay fixed across versions.
//!
//! ## Ownership
//!
//! [`HyperplaneFamily`] owns the hyperplanes in generation order. Everything
//! downstream refers to a hyperplane by its position `0..r*b` in that order.

use std::collections::BTreeSet;

use rand::Rng;

use crate::dataset::Dataset;
use crate::distance;
use crate::error::{LshError, Result};

/// Which half-space a sample falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// `h · x >= 0`.
    Plus,
    /// `h · x < 0`.
    Minus,
}

/// A unit-norm hyperplane normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperplane {
    normal: Vec<f32>,
}

impl Hyperplane {
    /// Unit normal vector.
    pub fn normal(&self) -> &[f32] {
        &self.normal
    }

    /// Side of the hyperplane a vector falls on.
    #[inline]
    pub fn side(&self, v: &[f32]) -> Side {
        if distance::dot(&self.normal, v) >= 0.0 {
            Side::Plus
        } else {
            Side::Minus
        }
    }
}

/// The `r * b` hyperplanes of one index build.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperplaneFamily {
    dim: usize,
    hyperplanes: Vec<Hyperplane>,
}

impl HyperplaneFamily {
    /// Draw `num_hashes` hyperplanes of dimension `dim`.
    ///
    /// Each normal is sampled uniformly from `[-1, 1]^dim` and normalized.
    /// Pass a seeded generator (e.g. `StdRng::seed_from_u64`) for
    /// reproducible builds.
    pub fn generate<R: Rng>(dim: usize, num_hashes: usize, rng: &mut R) -> Result<Self> {
        if dim == 0 || num_hashes == 0 {
            return Err(LshError::Configuration(format!(
                "dim and number of hashes must be greater than 0 (dim={dim}, hashes={num_hashes})"
            )));
        }

        let mut hyperplanes = Vec::with_capacity(num_hashes);
        while hyperplanes.len() < num_hashes {
            let raw: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0f32..=1.0)).collect();
            // A zero draw has no direction; redraw.
            if let Some(normal) = distance::normalize(&raw) {
                hyperplanes.push(Hyperplane { normal });
            }
        }

        tracing::debug!(dim, num_hashes, "generated hyperplane family");
        Ok(Self { dim, hyperplanes })
    }

    /// Build a family from explicit normal directions (normalized here).
    pub fn from_vectors(dim: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if dim == 0 || vectors.is_empty() {
            return Err(LshError::Configuration(
                "dim and number of hyperplanes must be greater than 0".to_string(),
            ));
        }
        let mut hyperplanes = Vec::with_capacity(vectors.len());
        for (i, v) in vectors.into_iter().enumerate() {
            if v.len() != dim {
                return Err(LshError::Configuration(format!(
                    "hyperplane {i} has {} coordinates, expected {dim}",
                    v.len()
                )));
            }
            let normal = distance::normalize(&v).ok_or_else(|| {
                LshError::Configuration(format!("hyperplane {i} has zero norm"))
            })?;
            hyperplanes.push(Hyperplane { normal });
        }
        Ok(Self { dim, hyperplanes })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of hyperplanes.
    pub fn len(&self) -> usize {
        self.hyperplanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hyperplanes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Hyperplane> {
        self.hyperplanes.get(index)
    }

    /// Hyperplanes in generation order.
    pub fn iter(&self) -> std::slice::Iter<'_, Hyperplane> {
        self.hyperplanes.iter()
    }

    /// Split the dataset into the two half-spaces of hyperplane `index`.
    pub fn partition(&self, index: usize, dataset: &Dataset) -> Result<Partition> {
        let hyperplane = self.hyperplanes.get(index).ok_or_else(|| {
            LshError::InvalidState(format!(
                "hyperplane index {index} out of range (family has {})",
                self.len()
            ))
        })?;
        if dataset.dim() != self.dim {
            return Err(LshError::Configuration(format!(
                "dataset dim {} does not match hyperplane dim {}",
                dataset.dim(),
                self.dim
            )));
        }

        let mut partition = Partition::default();
        for (pos, v) in dataset.vectors().enumerate() {
            match hyperplane.side(v) {
                Side::Plus => partition.plus.insert(pos),
                Side::Minus => partition.minus.insert(pos),
            };
        }
        Ok(partition)
    }
}

/// The two half-spaces of one hyperplane, as sample positions in canonical
/// dataset order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub(crate) plus: BTreeSet<usize>,
    pub(crate) minus: BTreeSet<usize>,
}

impl Partition {
    pub fn plus(&self) -> &BTreeSet<usize> {
        &self.plus
    }

    pub fn minus(&self) -> &BTreeSet<usize> {
        &self.minus
    }

    /// Side of a sample, or `None` if it is in neither half.
    pub fn side_of(&self, sample: usize) -> Option<Side> {
        match (self.plus.contains(&sample), self.minus.contains(&sample)) {
            (true, false) => Some(Side::Plus),
            (false, true) => Some(Side::Minus),
            _ => None,
        }
    }
}

/// Hyperplanes plus their partitions of one dataset.
#[derive(Debug, Clone)]
pub struct HashStore {
    family: HyperplaneFamily,
    partitions: Vec<Partition>,
    num_samples: usize,
}

impl HashStore {
    /// Hash every sample against every hyperplane.
    pub fn build(family: HyperplaneFamily, dataset: &Dataset) -> Result<Self> {
        let partitions = Self::partition_all(&family, dataset)?;
        Ok(Self::from_partitions(family, partitions, dataset.len()))
    }

    /// One partition per hyperplane, in family order.
    pub(crate) fn partition_all(
        family: &HyperplaneFamily,
        dataset: &Dataset,
    ) -> Result<Vec<Partition>> {
        #[cfg(feature = "parallel")]
        let partitions = {
            use rayon::prelude::*;
            (0..family.len())
                .into_par_iter()
                .map(|h| family.partition(h, dataset))
                .collect::<Result<Vec<_>>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let partitions = (0..family.len())
            .map(|h| family.partition(h, dataset))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            hyperplanes = family.len(),
            samples = dataset.len(),
            "hashed all samples"
        );
        Ok(partitions)
    }

    pub(crate) fn from_partitions(
        family: HyperplaneFamily,
        partitions: Vec<Partition>,
        num_samples: usize,
    ) -> Self {
        Self {
            family,
            partitions,
            num_samples,
        }
    }

    pub fn family(&self) -> &HyperplaneFamily {
        &self.family
    }

    /// Give the hyperplanes back, dropping the partitions.
    pub fn into_family(self) -> HyperplaneFamily {
        self.family
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn partition(&self, hash: usize) -> Option<&Partition> {
        self.partitions.get(hash)
    }

    /// Plus-side samples of hash `hash`.
    pub fn plus(&self, hash: usize) -> Option<&BTreeSet<usize>> {
        self.partitions.get(hash).map(Partition::plus)
    }

    /// Minus-side samples of hash `hash`.
    pub fn minus(&self, hash: usize) -> Option<&BTreeSet<usize>> {
        self.partitions.get(hash).map(Partition::minus)
    }

    /// Number of hash functions.
    pub fn num_hashes(&self) -> usize {
        self.partitions.len()
    }

    /// Number of samples that were hashed.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[cfg(test)]
    pub(crate) fn replace_partition(&mut self, hash: usize, partition: Partition) {
        self.partitions[hash] = partition;
    }

    /// Log the contents of every plus/minus bin at trace level.
    pub fn trace_bins(&self, dataset: &Dataset) {
        if !tracing::enabled!(tracing::Level::TRACE) {
            return;
        }
        let ids: Vec<&str> = dataset.ids().collect();
        let name = |set: &BTreeSet<usize>| -> Vec<&str> {
            set.iter().filter_map(|&i| ids.get(i).copied()).collect()
        };
        for (h, (hyperplane, partition)) in self.family.iter().zip(&self.partitions).enumerate() {
            tracing::trace!(
                hash = h,
                normal = ?hyperplane.normal(),
                plus = ?name(&partition.plus),
                minus = ?name(&partition.minus),
                "hash bin"
            );
        }
    }
}
