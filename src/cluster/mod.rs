//! Best-effort clustering on top of LSH neighborhoods.
//!
//! Strictly speaking this goes beyond what LSH promises. The AND-OR
//! neighbor relation is not transitive, so `x ~ y` and `y ~ z` say nothing
//! about `x` and `z`. The seed groups from
//! [`extract_similarity_groups`](crate::neighbors::extract_similarity_groups)
//! overlap heavily; the strategies here consolidate them.
//!
//! ```text
//! seed groups ──► merge (coalesce | L2 sample | L2 set) ──► prune ──► evaluate
//! ```

pub mod merge;
pub mod prune;
pub mod quality;

pub use merge::{
    centroid, coalesce, coalesce_to_fixed_point, merge_l2_sample_based, merge_l2_set_based,
};
pub use prune::prune;
pub use quality::{class_label, evaluate, ClusterQuality, QualityReport};

/// Which merge strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// One order-dependent coalescence pass.
    Coalescence,
    /// Coalescence repeated to a fixed point.
    CoalescenceToFixedPoint,
    /// Reassign straggler samples by L2 distance.
    L2SampleBased,
    /// Reassign straggler groups by L2 distance.
    L2SetBased,
}
