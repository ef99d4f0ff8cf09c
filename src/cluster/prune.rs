//! Size-based filtering of groups.

use crate::neighbors::SimilarityGroup;

/// Keep only groups with strictly more than `threshold` members.
pub fn prune(groups: &[SimilarityGroup], threshold: usize) -> Vec<SimilarityGroup> {
    let kept: Vec<SimilarityGroup> = groups
        .iter()
        .filter(|g| g.len() > threshold)
        .cloned()
        .collect();
    tracing::debug!(
        threshold,
        before = groups.len(),
        after = kept.len(),
        "pruned similarity groups"
    );
    kept
}
