//! Index configuration.
//!
//! An index is shaped by three required numbers: the dimensionality `dim`,
//! the rows per band `r`, and the number of bands `b`. The total number of
//! hyperplane hash functions is `r * b`.
//!
//! ## Choosing `r` and `b`
//!
//! A single random hyperplane separates two vectors at angle `d` degrees with
//! probability `d / 180`, so the base collision probability is
//!
//! ```text
//! p = (180 - d) / 180
//! ```
//!
//! Banding amplifies this into an S-curve:
//!
//! ```text
//! P = 1 - (1 - p^r)^b
//! ```
//!
//! Larger `r` suppresses false positives (all `r` bits of a band must agree),
//! larger `b` restores recall (any band agreeing is enough). Pick the pair so
//! that `P` is high at the similarity angle `d1` and low at the dissimilarity
//! angle `d2`.

use serde::{Deserialize, Serialize};

use crate::error::{LshError, Result};

/// Parameters for building an LSH index and merging its groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LshParams {
    /// Dimensionality of every sample vector.
    pub dim: usize,
    /// Rows (hash functions) per band.
    pub r: usize,
    /// Number of bands.
    pub b: usize,
    /// Target cluster count for the L2 merge strategies.
    #[serde(default)]
    pub expected_num_of_clusters: Option<usize>,
    /// Groups with at most this many members are dropped by pruning.
    #[serde(default)]
    pub similarity_group_min_size_threshold: Option<usize>,
    /// Seed for hyperplane generation. Drawn from entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl LshParams {
    /// Create parameters with the three required values.
    pub fn new(dim: usize, r: usize, b: usize) -> Self {
        Self {
            dim,
            r,
            b,
            expected_num_of_clusters: None,
            similarity_group_min_size_threshold: None,
            seed: None,
        }
    }

    /// Load parameters from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| LshError::Configuration(format!("invalid JSON config: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    #[must_use]
    pub fn with_expected_num_of_clusters(mut self, k: usize) -> Self {
        self.expected_num_of_clusters = Some(k);
        self
    }

    #[must_use]
    pub fn with_min_size_threshold(mut self, threshold: usize) -> Self {
        self.similarity_group_min_size_threshold = Some(threshold);
        self
    }

    /// Configure a deterministic seed for hyperplane generation.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check that every required parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(LshError::Configuration(
                "dim must be greater than 0".to_string(),
            ));
        }
        if self.r == 0 {
            return Err(LshError::Configuration(
                "r (rows per band) must be greater than 0".to_string(),
            ));
        }
        if self.b == 0 {
            return Err(LshError::Configuration(
                "b (number of bands) must be greater than 0".to_string(),
            ));
        }
        if self.r.checked_mul(self.b).is_none() {
            return Err(LshError::Configuration(format!(
                "r * b overflows: r={}, b={}",
                self.r, self.b
            )));
        }
        if self.expected_num_of_clusters == Some(0) {
            return Err(LshError::Configuration(
                "expected_num_of_clusters must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Total number of hyperplane hash functions, `r * b`.
    pub fn num_hashes(&self) -> usize {
        self.r * self.b
    }

    /// The cluster target, or a configuration error when unset.
    pub fn require_expected_num_of_clusters(&self) -> Result<usize> {
        match self.expected_num_of_clusters {
            Some(0) => Err(LshError::Configuration(
                "expected_num_of_clusters must be greater than 0".to_string(),
            )),
            Some(k) => Ok(k),
            None => Err(LshError::Configuration(
                "expected_num_of_clusters must be set for L2 merging".to_string(),
            )),
        }
    }

    /// The pruning threshold, or a configuration error when unset.
    pub fn require_min_size_threshold(&self) -> Result<usize> {
        self.similarity_group_min_size_threshold.ok_or_else(|| {
            LshError::Configuration(
                "similarity_group_min_size_threshold must be set for pruning".to_string(),
            )
        })
    }

    /// Amplified collision probability `1 - (1 - p^r)^b` for a base probability `p`.
    pub fn amplified_collision_probability(&self, p: f64) -> f64 {
        let p = p.clamp(0.0, 1.0);
        1.0 - (1.0 - p.powf(self.r as f64)).powf(self.b as f64)
    }

    /// Amplified collision probability for two vectors `angle_deg` apart.
    pub fn collision_probability_at_angle(&self, angle_deg: f64) -> f64 {
        self.amplified_collision_probability(base_collision_probability(angle_deg))
    }

    /// Approximate base probability at which the S-curve crosses 1/2.
    ///
    /// `(1/b)^(1/r)`
    pub fn threshold(&self) -> f64 {
        (1.0 / self.b as f64).powf(1.0 / self.r as f64)
    }
}

/// Probability that one random hyperplane puts two vectors `angle_deg` apart
/// on the same side: `(180 - d) / 180`.
pub fn base_collision_probability(angle_deg: f64) -> f64 {
    ((180.0 - angle_deg) / 180.0).clamp(0.0, 1.0)
}
