//! Label-based purity scoring.
//!
//! Only meaningful when identifiers embed a ground-truth class, as in
//! `sample3_7` (class `sample3`, seventh member). The class label is the part
//! of the identifier before the first `_`; identifiers without `_` are their
//! own class.
//!
//! Purely diagnostic: nothing here feeds back into merging.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::dataset::Dataset;
use crate::error::{LshError, Result};
use crate::neighbors::SimilarityGroup;

/// Ground-truth class embedded in a sample identifier.
pub fn class_label(id: &str) -> &str {
    id.split_once('_').map_or(id, |(label, _)| label)
}

/// Label distribution of one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterQuality {
    pub size: usize,
    /// class label -> member count
    pub label_counts: BTreeMap<String, usize>,
    /// All members share one class.
    pub pure: bool,
}

/// Quality of a whole clustering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityReport {
    /// Largest cluster first.
    pub clusters: Vec<ClusterQuality>,
    /// Classes present in the dataset.
    pub classes: BTreeSet<String>,
    /// Member count summed over clusters (counts overlaps twice).
    pub total_samples: usize,
}

impl QualityReport {
    pub fn num_pure(&self) -> usize {
        self.clusters.iter().filter(|c| c.pure).count()
    }

    pub fn all_pure(&self) -> bool {
        self.clusters.iter().all(|c| c.pure)
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total number of similarity groups tested: {}", self.clusters.len())?;
        for cluster in &self.clusters {
            let labels: Vec<&str> = cluster.label_counts.keys().map(String::as_str).collect();
            writeln!(f)?;
            writeln!(f, "Class labels in this similarity group: {labels:?}")?;
            writeln!(f, "    Distribution of class labels in similarity group:")?;
            for (label, count) in &cluster.label_counts {
                writeln!(f, "        {label} => {count}")?;
            }
            let purity = if cluster.pure { "pure" } else { "impure" };
            writeln!(f, "    Group purity level: {purity}")?;
        }
        writeln!(f)?;
        write!(
            f,
            "Total number of samples in the different clusters: {}",
            self.total_samples
        )
    }
}

/// Score each cluster by the class labels of its members.
pub fn evaluate(groups: &[SimilarityGroup], dataset: &Dataset) -> Result<QualityReport> {
    let classes: BTreeSet<String> = dataset.ids().map(|id| class_label(id).to_string()).collect();
    if classes.is_empty() {
        return Err(LshError::DataIntegrity(
            "unable to determine the classes of an empty dataset".to_string(),
        ));
    }

    let mut ordered: Vec<&SimilarityGroup> = groups.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()));

    let clusters: Vec<ClusterQuality> = ordered
        .into_iter()
        .map(|group| {
            let mut label_counts = BTreeMap::new();
            for id in group {
                *label_counts.entry(class_label(id).to_string()).or_insert(0) += 1;
            }
            ClusterQuality {
                size: group.len(),
                pure: label_counts.len() == 1,
                label_counts,
            }
        })
        .collect();
    let total_samples = clusters.iter().map(|c| c.size).sum();

    Ok(QualityReport {
        clusters,
        classes,
        total_samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn g(ids: &[&str]) -> SimilarityGroup {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn dataset() -> Dataset {
        Dataset::from_samples(
            1,
            ["sample0_0", "sample0_1", "sample1_0", "sample1_1", "sample1_2"]
                .into_iter()
                .map(|id| (id, vec![1.0])),
        )
        .unwrap()
    }

    #[test]
    fn test_class_label() {
        assert_eq!(class_label("sample3_4"), "sample3");
        assert_eq!(class_label("grp0_2"), "grp0");
        assert_eq!(class_label("loner"), "loner");
    }

    #[test]
    fn test_purity() {
        let ds = dataset();
        let groups = vec![
            g(&["sample0_0", "sample0_1"]),
            g(&["sample1_0", "sample1_1", "sample0_0"]),
        ];
        let report = evaluate(&groups, &ds).unwrap();
        assert_eq!(report.classes.len(), 2);
        assert_eq!(report.total_samples, 5);
        // Largest first.
        assert_eq!(report.clusters[0].size, 3);
        assert!(!report.clusters[0].pure);
        assert_eq!(report.clusters[0].label_counts["sample1"], 2);
        assert!(report.clusters[1].pure);
        assert_eq!(report.num_pure(), 1);
        assert!(!report.all_pure());

        let text = report.to_string();
        assert!(text.contains("Group purity level: impure"));
        assert!(text.contains("sample0 => 2"));
    }

    #[test]
    fn test_empty_dataset() {
        let ds = Dataset::new(1).unwrap();
        let err = evaluate(&[], &ds).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataIntegrity);
    }
}
