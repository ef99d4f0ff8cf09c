//! kinship: banded random-hyperplane LSH and best-effort clustering.
//!
//! Given samples (unique identifier -> fixed-dimension vector), kinship
//! finds each sample's approximate angular neighbors with Locality Sensitive
//! Hashing and can consolidate those neighborhoods into a target number of
//! clusters.
//!
//! - [`hash`]: hyperplane hash family, bit signatures, AND-OR band buckets
//! - [`neighbors`]: neighborhoods and seed similarity groups from buckets
//! - [`cluster`]: coalescence and L2 merging, pruning, purity evaluation
//! - [`LocalitySensitiveHashing`]: the whole pipeline over one dataset
//!
//! ```rust
//! use kinship::{Dataset, LocalitySensitiveHashing, LshParams};
//!
//! let ds = Dataset::from_samples(
//!     2,
//!     [("a", vec![1.0, 0.0]), ("b", vec![1.0, 0.01]), ("c", vec![-1.0, 0.0])],
//! )
//! .unwrap();
//! let params = LshParams::new(2, 4, 8).with_seed(42);
//! let lsh = LocalitySensitiveHashing::build(params, ds).unwrap();
//!
//! let neighbors = lsh.nearest_neighbors().unwrap();
//! // Opposite vectors are never on the same side of a hyperplane.
//! assert!(!neighbors.lookup("a").unwrap().contains("c"));
//! ```
//!
//! # Critical Nuances
//!
//! ## Non-transitivity
//!
//! The AND-OR neighbor relation is not transitive. Every clustering built on
//! it is a heuristic; [`cluster::coalesce`] in particular is a single,
//! order-dependent pass (see [`cluster::coalesce_to_fixed_point`]).
//!
//! ## Determinism
//!
//! Samples are processed in ascending identifier order, a zero projection
//! always hashes to "plus", and the `parallel` feature collects results in
//! index order. Same hyperplanes + same data = same buckets, bit for bit.
//!
//! ## Bucket blow-up
//!
//! Extraction cost is the sum of squared bucket sizes. Small `r` on
//! clustered data can put most samples in one bucket per band.

pub mod cluster;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod hash;
pub mod lsh;
pub mod neighbors;
pub mod params;

// Re-exports
pub use cluster::{MergeStrategy, QualityReport};
pub use dataset::Dataset;
pub use error::{ErrorKind, LshError, Result};
pub use lsh::LocalitySensitiveHashing;
pub use neighbors::{Neighborhoods, SimilarityGroup};
pub use params::LshParams;
