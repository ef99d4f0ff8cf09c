//! Merging similarity groups into clusters.
//!
//! Three independent strategies, each taking the seed groups and returning a
//! new collection:
//!
//! | Strategy | Rule | Output count |
//! |----------|------|--------------|
//! | [`coalesce`] | union groups that share a member (one pass) | data dependent |
//! | [`merge_l2_sample_based`] | keep the `k` largest, move each straggler *sample* to the nearest centroid | `k` |
//! | [`merge_l2_set_based`] | keep the `k` largest, move each straggler *group* to the nearest centroid | `k` |
//!
//! ## Coalescence is single-pass
//!
//! [`coalesce`] walks the input once. Each input group is unioned into every
//! output group it intersects; output groups are never merged with each
//! other within the pass. Chains discovered late in the pass therefore stay
//! split, and the result depends on input order. Use
//! [`coalesce_to_fixed_point`] for the full transitive closure.
//!
//! ## L2 strategies
//!
//! Groups are ranked by size (ties keep input order); the `k` largest are
//! retained and the rest are stragglers. Centroids are computed once, before
//! any reassignment. When there are at most `k` groups the input is returned
//! unchanged.

use crate::dataset::Dataset;
use crate::distance;
use crate::error::{LshError, Result};
use crate::neighbors::SimilarityGroup;

/// One left-to-right coalescence pass.
pub fn coalesce(groups: &[SimilarityGroup]) -> Vec<SimilarityGroup> {
    let mut merged: Vec<SimilarityGroup> = Vec::new();
    for group in groups {
        let mut absorbed = false;
        for mgroup in merged.iter_mut() {
            if !mgroup.is_disjoint(group) {
                mgroup.extend(group.iter().cloned());
                absorbed = true;
            }
        }
        if !absorbed {
            merged.push(group.clone());
        }
    }
    tracing::debug!(
        input = groups.len(),
        output = merged.len(),
        "coalesced similarity groups"
    );
    merged
}

/// Repeat [`coalesce`] until nothing changes.
///
/// The result is pairwise disjoint. Each pass that merges anything shrinks
/// the group count, so this terminates after at most `groups.len()` passes.
pub fn coalesce_to_fixed_point(groups: &[SimilarityGroup]) -> Vec<SimilarityGroup> {
    let mut current = coalesce(groups);
    let mut passes = 1;
    loop {
        let next = coalesce(&current);
        if next == current {
            tracing::debug!(passes, groups = current.len(), "coalescence reached fixed point");
            return current;
        }
        current = next;
        passes += 1;
    }
}

/// Mean vector of a group's members.
pub fn centroid(group: &SimilarityGroup, dataset: &Dataset) -> Result<Vec<f32>> {
    if group.is_empty() {
        return Err(LshError::DataIntegrity(
            "cannot take the centroid of an empty group".to_string(),
        ));
    }
    let vectors = group
        .iter()
        .map(|id| dataset.require(id))
        .collect::<Result<Vec<_>>>()?;
    distance::mean(vectors, dataset.dim()).ok_or_else(|| {
        LshError::InternalInvariant("mean of a non-empty group was empty".to_string())
    })
}

/// Reassign straggler samples one by one to the nearest retained centroid.
pub fn merge_l2_sample_based(
    groups: &[SimilarityGroup],
    dataset: &Dataset,
    expected_num_of_clusters: usize,
) -> Result<Vec<SimilarityGroup>> {
    check_target(expected_num_of_clusters)?;
    if groups.len() <= expected_num_of_clusters {
        tracing::info!(
            groups = groups.len(),
            expected = expected_num_of_clusters,
            "no sample-based merging: group count does not exceed the target"
        );
        return Ok(groups.to_vec());
    }

    let (mut retained, stragglers) = split_by_size(groups, expected_num_of_clusters);
    let centroids = retained
        .iter()
        .map(|g| centroid(g, dataset))
        .collect::<Result<Vec<_>>>()?;

    let pooled: Vec<&String> = stragglers.iter().flat_map(|g| g.iter()).collect();
    let points = pooled
        .iter()
        .map(|id| dataset.require(id))
        .collect::<Result<Vec<_>>>()?;

    #[cfg(feature = "parallel")]
    let targets: Vec<usize> = {
        use rayon::prelude::*;
        points.par_iter().map(|p| nearest(p, &centroids)).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let targets: Vec<usize> = points.iter().map(|p| nearest(p, &centroids)).collect();

    for (id, target) in pooled.into_iter().zip(targets) {
        retained[target].insert(id.clone());
    }

    tracing::debug!(
        stragglers = stragglers.len(),
        clusters = retained.len(),
        "merged straggler samples by L2 distance"
    );
    Ok(retained)
}

/// Reassign each straggler group wholesale to the retained group with the
/// nearest centroid.
pub fn merge_l2_set_based(
    groups: &[SimilarityGroup],
    dataset: &Dataset,
    expected_num_of_clusters: usize,
) -> Result<Vec<SimilarityGroup>> {
    check_target(expected_num_of_clusters)?;
    if groups.len() <= expected_num_of_clusters {
        tracing::info!(
            groups = groups.len(),
            expected = expected_num_of_clusters,
            "no set-based merging: group count does not exceed the target"
        );
        return Ok(groups.to_vec());
    }

    let (mut retained, stragglers) = split_by_size(groups, expected_num_of_clusters);
    let retained_centroids = retained
        .iter()
        .map(|g| centroid(g, dataset))
        .collect::<Result<Vec<_>>>()?;
    let straggler_centroids = stragglers
        .iter()
        .map(|g| centroid(g, dataset))
        .collect::<Result<Vec<_>>>()?;

    #[cfg(feature = "parallel")]
    let targets: Vec<usize> = {
        use rayon::prelude::*;
        straggler_centroids
            .par_iter()
            .map(|c| nearest(c, &retained_centroids))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let targets: Vec<usize> = straggler_centroids
        .iter()
        .map(|c| nearest(c, &retained_centroids))
        .collect();

    for (group, target) in stragglers.iter().zip(targets) {
        tracing::trace!(target, size = group.len(), "straggler group joins retained group");
        retained[target].extend(group.iter().cloned());
    }

    tracing::debug!(
        stragglers = stragglers.len(),
        clusters = retained.len(),
        "merged straggler groups by L2 distance"
    );
    Ok(retained)
}

fn check_target(expected_num_of_clusters: usize) -> Result<()> {
    if expected_num_of_clusters == 0 {
        return Err(LshError::Configuration(
            "expected_num_of_clusters must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// `(k largest groups, the rest)`, largest first, ties in input order.
fn split_by_size(
    groups: &[SimilarityGroup],
    k: usize,
) -> (Vec<SimilarityGroup>, Vec<&SimilarityGroup>) {
    let mut order: Vec<usize> = (0..groups.len()).collect();
    // Stable sort keeps input order among equal sizes.
    order.sort_by(|&a, &b| groups[b].len().cmp(&groups[a].len()));
    let retained = order[..k].iter().map(|&i| groups[i].clone()).collect();
    let stragglers = order[k..].iter().map(|&i| &groups[i]).collect();
    (retained, stragglers)
}

/// Index of the nearest centroid; the first one wins ties.
fn nearest(point: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = distance::l2_distance(point, c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn g(ids: &[&str]) -> SimilarityGroup {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn line_dataset() -> Dataset {
        // Two clumps on the x axis: around 0 and around 10.
        Dataset::from_samples(
            1,
            [
                ("a", vec![0.0]),
                ("b", vec![0.5]),
                ("c", vec![1.0]),
                ("d", vec![10.0]),
                ("e", vec![10.5]),
                ("f", vec![9.0]),
                ("g", vec![6.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_coalesce_merges_overlaps() {
        let groups = vec![g(&["a", "b"]), g(&["c"]), g(&["b", "d"]), g(&["c", "e"])];
        let merged = coalesce(&groups);
        assert_eq!(merged, vec![g(&["a", "b", "d"]), g(&["c", "e"])]);
    }

    #[test]
    fn test_coalesce_is_single_pass() {
        // {a} and {b} are bridged only by the last group, which is unioned
        // into both without merging them together.
        let groups = vec![g(&["a"]), g(&["b"]), g(&["a", "b"])];
        let merged = coalesce(&groups);
        assert_eq!(merged, vec![g(&["a", "b"]), g(&["a", "b"])]);

        let full = coalesce_to_fixed_point(&groups);
        assert_eq!(full, vec![g(&["a", "b"])]);
    }

    #[test]
    fn test_coalesce_empty() {
        assert!(coalesce(&[]).is_empty());
        assert!(coalesce_to_fixed_point(&[]).is_empty());
    }

    #[test]
    fn test_centroid() {
        let ds = line_dataset();
        assert_eq!(centroid(&g(&["a", "c"]), &ds).unwrap(), vec![0.5]);
        assert_eq!(
            centroid(&g(&[]), &ds).unwrap_err().kind(),
            ErrorKind::DataIntegrity
        );
        assert_eq!(
            centroid(&g(&["zz"]), &ds).unwrap_err().kind(),
            ErrorKind::DataIntegrity
        );
    }

    #[test]
    fn test_sample_based_reassigns_each_sample() {
        let ds = line_dataset();
        // Straggler {c, g}: c is near the left clump, g (6.0) nearer the right.
        let groups = vec![g(&["a", "b"]), g(&["c", "g"]), g(&["d", "e", "f"])];
        let merged = merge_l2_sample_based(&groups, &ds, 2).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], g(&["d", "e", "f", "g"]));
        assert_eq!(merged[1], g(&["a", "b", "c"]));
    }

    #[test]
    fn test_set_based_moves_whole_groups() {
        let ds = line_dataset();
        // Straggler {c, g} has centroid 3.5, nearer the left clump (0.25)
        // than the right (9.83), so g travels with c.
        let groups = vec![g(&["a", "b"]), g(&["c", "g"]), g(&["d", "e", "f"])];
        let merged = merge_l2_set_based(&groups, &ds, 2).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], g(&["d", "e", "f"]));
        assert_eq!(merged[1], g(&["a", "b", "c", "g"]));
    }

    #[test]
    fn test_size_ties_keep_input_order() {
        let ds = line_dataset();
        let groups = vec![g(&["a"]), g(&["d"]), g(&["b"])];
        let merged = merge_l2_set_based(&groups, &ds, 2).unwrap();
        assert_eq!(merged, vec![g(&["a", "b"]), g(&["d"])]);
    }

    #[test]
    fn test_l2_noop_at_or_below_target() {
        let ds = line_dataset();
        let groups = vec![g(&["a", "d"]), g(&["b"])];
        assert_eq!(merge_l2_sample_based(&groups, &ds, 2).unwrap(), groups);
        assert_eq!(merge_l2_set_based(&groups, &ds, 5).unwrap(), groups);
    }

    #[test]
    fn test_l2_zero_target_is_configuration_error() {
        let ds = line_dataset();
        let groups = vec![g(&["a"])];
        assert_eq!(
            merge_l2_sample_based(&groups, &ds, 0).unwrap_err().kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            merge_l2_set_based(&groups, &ds, 0).unwrap_err().kind(),
            ErrorKind::Configuration
        );
    }

    fn arb_groups() -> impl Strategy<Value = Vec<SimilarityGroup>> {
        let names = ["a", "b", "c", "d", "e", "f", "g"];
        prop::collection::vec(
            prop::collection::btree_set(prop::sample::select(names.to_vec()), 1..4),
            0..10,
        )
        .prop_map(|groups| {
            groups
                .into_iter()
                .map(|s| s.into_iter().map(str::to_string).collect::<BTreeSet<_>>())
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_fixed_point_is_disjoint_and_stable(groups in arb_groups()) {
            let closed = coalesce_to_fixed_point(&groups);
            for (i, x) in closed.iter().enumerate() {
                for y in &closed[i + 1..] {
                    prop_assert!(x.is_disjoint(y));
                }
            }
            prop_assert_eq!(coalesce(&closed), closed.clone());

            let before: BTreeSet<&String> = groups.iter().flatten().collect();
            let after: BTreeSet<&String> = closed.iter().flatten().collect();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn prop_l2_output_count(groups in arb_groups(), k in 1usize..6) {
            let ds = line_dataset();
            let sample = merge_l2_sample_based(&groups, &ds, k).unwrap();
            let set = merge_l2_set_based(&groups, &ds, k).unwrap();
            if k < groups.len() {
                prop_assert_eq!(sample.len(), k);
                prop_assert_eq!(set.len(), k);
            } else {
                prop_assert_eq!(&sample, &groups);
                prop_assert_eq!(&set, &groups);
            }
        }
    }
}
