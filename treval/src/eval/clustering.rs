//! Clustering metrics: purity, NMI, Rand index, pairwise F-measure.
//!
//! A clustering run assigns every item (a run topic) to one cluster: the doc
//! id of its top entry. The item's true label is its relevant judgement in the
//! qrels (the first one in sorted order if there are several). Items with an
//! empty entry list are not part of the clustering.
//!
//! # Metric Summary
//!
//! | Metric | Counts | Zero case |
//! |--------|--------|-----------|
//! | purity | majority label per cluster | no items → 0 |
//! | NMI | (cluster, label) contingency table | no items or zero entropy → 0 |
//! | Rand index | agreeing item pairs | fewer than 2 items → 0 |
//! | F_β | same-cluster / same-label pairs | unguarded, [`Error::DivisionByZero`] |
//!
//! Pairwise metrics scan every unordered item pair, O(n²). Clustering
//! evaluations typically have hundreds to a few thousand items.

use super::types::Evaluation;
use crate::{Error, QRels, Result, Run};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One clustered item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Item id (run topic).
    pub item: String,
    /// Assigned cluster (top entry's doc id).
    pub cluster: String,
    /// Ground-truth label.
    pub label: String,
}

/// Cluster/label assignment of every item with at least one entry.
///
/// # Errors
///
/// [`Error::MissingLabel`] for an item with no relevant judgement.
pub fn assignments(run: &Run, qrels: &QRels) -> Result<Vec<ClusterAssignment>> {
    run.entries()
        .iter()
        .filter_map(|(item, entries)| entries.first().map(|top| (item, top)))
        .map(|(item, top)| {
            let label = qrels
                .all_relevants(item)
                .ok()
                .and_then(|labels| labels.into_iter().next())
                .ok_or_else(|| Error::missing_label(item.as_str()))?;
            Ok(ClusterAssignment {
                item: item.clone(),
                cluster: top.doc_id.clone(),
                label: label.to_string(),
            })
        })
        .collect()
}

/// Co-occurrence counts of clusters and labels.
#[derive(Debug, Clone, Default)]
pub struct Contingency {
    /// `cluster -> label -> count`.
    pub cells: BTreeMap<String, BTreeMap<String, usize>>,
    /// Items per cluster.
    pub cluster_sizes: BTreeMap<String, usize>,
    /// Items per label.
    pub label_sizes: BTreeMap<String, usize>,
    /// Total items.
    pub n: usize,
}

impl Contingency {
    /// Build the table from item assignments.
    #[must_use]
    pub fn from_assignments(assignments: &[ClusterAssignment]) -> Self {
        let mut table = Self::default();
        for a in assignments {
            *table
                .cells
                .entry(a.cluster.clone())
                .or_default()
                .entry(a.label.clone())
                .or_insert(0) += 1;
            *table.cluster_sizes.entry(a.cluster.clone()).or_insert(0) += 1;
            *table.label_sizes.entry(a.label.clone()).or_insert(0) += 1;
            table.n += 1;
        }
        table
    }

    /// Mutual information (natural log) over the non-empty cells.
    #[must_use]
    pub fn mutual_information(&self) -> f64 {
        let n = self.n as f64;
        let mut mi = 0.0;
        for (cluster, row) in &self.cells {
            let n_k = self.cluster_sizes[cluster] as f64;
            for (label, &count) in row {
                if count == 0 {
                    continue;
                }
                let n_j = self.label_sizes[label] as f64;
                let n_kj = count as f64;
                mi += n_kj / n * ((n * n_kj) / (n_k * n_j)).ln();
            }
        }
        mi
    }

    /// Entropy of the cluster partition.
    #[must_use]
    pub fn cluster_entropy(&self) -> f64 {
        entropy(self.cluster_sizes.values().copied(), self.n)
    }

    /// Entropy of the label partition.
    #[must_use]
    pub fn label_entropy(&self) -> f64 {
        entropy(self.label_sizes.values().copied(), self.n)
    }
}

fn entropy<I: IntoIterator<Item = usize>>(sizes: I, n: usize) -> f64 {
    let n = n as f64;
    -sizes
        .into_iter()
        .map(|s| {
            let p = s as f64 / n;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Majority label of one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMajority {
    /// Most frequent label (ties go to the smallest label).
    pub label: String,
    /// Members carrying that label.
    pub count: usize,
    /// Cluster size.
    pub size: usize,
}

/// Majority label of every cluster.
///
/// # Errors
///
/// [`Error::MissingLabel`] for an item with no relevant judgement.
pub fn purity_by_cluster(run: &Run, qrels: &QRels) -> Result<BTreeMap<String, ClusterMajority>> {
    let table = Contingency::from_assignments(&assignments(run, qrels)?);
    Ok(table
        .cells
        .iter()
        .filter_map(|(cluster, row)| {
            let mut best: Option<(&String, usize)> = None;
            for (label, &count) in row {
                if best.map_or(true, |(_, c)| count > c) {
                    best = Some((label, count));
                }
            }
            best.map(|(label, count)| {
                (
                    cluster.clone(),
                    ClusterMajority {
                        label: label.clone(),
                        count,
                        size: table.cluster_sizes[cluster],
                    },
                )
            })
        })
        .collect())
}

/// Purity: fraction of items carrying their cluster's majority label.
///
/// Details hold each cluster's own purity (majority count over size).
///
/// # Errors
///
/// [`Error::MissingLabel`] for an item with no relevant judgement.
pub fn purity(run: &Run, qrels: &QRels) -> Result<Evaluation> {
    let majorities = purity_by_cluster(run, qrels)?;
    let n: usize = majorities.values().map(|m| m.size).sum();
    if n == 0 {
        return Ok(Evaluation::scalar(0.0));
    }
    let correct: usize = majorities.values().map(|m| m.count).sum();
    let details = majorities
        .into_iter()
        .map(|(cluster, m)| (cluster, m.count as f64 / m.size as f64))
        .collect();
    Ok(Evaluation::new(correct as f64 / n as f64, details))
}

/// Normalized mutual information: `I / ((H(cluster) + H(label)) / 2)`.
///
/// # Errors
///
/// [`Error::MissingLabel`] for an item with no relevant judgement.
pub fn nmi(run: &Run, qrels: &QRels) -> Result<Evaluation> {
    let table = Contingency::from_assignments(&assignments(run, qrels)?);
    if table.n == 0 {
        return Ok(Evaluation::scalar(0.0));
    }
    let mean_entropy = (table.label_entropy() + table.cluster_entropy()) / 2.0;
    if mean_entropy == 0.0 {
        return Ok(Evaluation::scalar(0.0));
    }
    Ok(Evaluation::scalar(table.mutual_information() / mean_entropy))
}

/// Pair agreement counts between clustering and ground truth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCounts {
    /// Same label, same cluster.
    pub true_positive: usize,
    /// Different label, different cluster.
    pub true_negative: usize,
    /// Different label, same cluster.
    pub false_positive: usize,
    /// Same label, different cluster.
    pub false_negative: usize,
}

impl PairCounts {
    /// Classify every unordered pair of `assignments`.
    #[must_use]
    pub fn from_assignments(assignments: &[ClusterAssignment]) -> Self {
        let mut counts = Self::default();
        for (i, a) in assignments.iter().enumerate() {
            for b in &assignments[i + 1..] {
                let same_label = a.label == b.label;
                let same_cluster = a.cluster == b.cluster;
                match (same_label, same_cluster) {
                    (true, true) => counts.true_positive += 1,
                    (false, false) => counts.true_negative += 1,
                    (true, false) => counts.false_negative += 1,
                    (false, true) => counts.false_positive += 1,
                }
            }
        }
        counts
    }

    /// Number of pairs.
    #[must_use]
    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }
}

/// Pair counts of a clustering run.
///
/// # Errors
///
/// [`Error::MissingLabel`] for an item with no relevant judgement.
pub fn pair_counts(run: &Run, qrels: &QRels) -> Result<PairCounts> {
    Ok(PairCounts::from_assignments(&assignments(run, qrels)?))
}

/// Rand index: `(TP + TN) / all pairs`.
///
/// # Errors
///
/// [`Error::MissingLabel`] for an item with no relevant judgement.
pub fn rand_index(run: &Run, qrels: &QRels) -> Result<Evaluation> {
    let c = pair_counts(run, qrels)?;
    let total = c.total();
    if total == 0 {
        return Ok(Evaluation::scalar(0.0));
    }
    Ok(Evaluation::scalar(
        (c.true_positive + c.true_negative) as f64 / total as f64,
    ))
}

/// Pairwise F_β: `((β² + 1)·P·R) / (β²·P + R)` over same-cluster pairs.
///
/// # Errors
///
/// [`Error::DivisionByZero`] when no pair shares a cluster, no pair shares a
/// label, or there is no true-positive pair.
pub fn f_clustering(run: &Run, qrels: &QRels, beta: f64) -> Result<Evaluation> {
    let metric = format!("F{}_clustering", beta);
    let c = pair_counts(run, qrels)?;

    let predicted_pairs = c.true_positive + c.false_positive;
    if predicted_pairs == 0 {
        return Err(Error::division_by_zero(&metric, "no pair shares a cluster"));
    }
    let true_pairs = c.true_positive + c.false_negative;
    if true_pairs == 0 {
        return Err(Error::division_by_zero(&metric, "no pair shares a label"));
    }
    let p = c.true_positive as f64 / predicted_pairs as f64;
    let r = c.true_positive as f64 / true_pairs as f64;

    let beta2 = beta * beta;
    let denominator = beta2 * p + r;
    if denominator == 0.0 {
        return Err(Error::division_by_zero(&metric, "precision and recall are zero"));
    }
    Ok(Evaluation::scalar(((beta2 + 1.0) * p * r) / denominator))
}
