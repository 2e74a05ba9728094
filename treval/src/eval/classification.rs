//! Classification metrics over runs whose "documents" are class labels.
//!
//! Each run topic is a test instance. Its entries are the predicted classes
//! (one entry in single-label mode) and its qrels judgements are the real
//! classes. The class vocabulary is every document id judged anywhere in the
//! qrels.
//!
//! # Known limitation
//!
//! [`confusion_matrix`] increments every (predicted, real) pair of an instance.
//! With several predicted or real classes per instance the matrix no longer
//! means what a confusion matrix usually means; use the multi-label scores
//! ([`multi_label_scores`]) or [`retrieval_fscore`] for multi-label tasks.

use super::types::Evaluation;
use crate::{Error, QRels, Result, Run};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Confusion matrix: `predicted -> actual -> count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    cells: BTreeMap<String, BTreeMap<String, usize>>,
}

impl ConfusionMatrix {
    /// An all-zero matrix over `classes`.
    pub fn with_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes: Vec<String> = classes.into_iter().map(Into::into).collect();
        let row: BTreeMap<String, usize> = classes.iter().map(|c| (c.clone(), 0)).collect();
        let cells = classes.into_iter().map(|c| (c, row.clone())).collect();
        Self { cells }
    }

    /// Classes in sorted order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Number of classes.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.cells.len()
    }

    /// Count for a (predicted, actual) cell; 0 outside the vocabulary.
    #[must_use]
    pub fn count(&self, predicted: &str, actual: &str) -> usize {
        self.cells
            .get(predicted)
            .and_then(|row| row.get(actual))
            .copied()
            .unwrap_or(0)
    }

    /// Increment a cell.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownClass`] if either class is outside the vocabulary.
    pub fn increment(&mut self, predicted: &str, actual: &str) -> Result<()> {
        let row = self
            .cells
            .get_mut(predicted)
            .ok_or_else(|| Error::unknown_class(predicted))?;
        let cell = row
            .get_mut(actual)
            .ok_or_else(|| Error::unknown_class(actual))?;
        *cell += 1;
        Ok(())
    }

    /// Times `predicted` was predicted (true + false positives).
    #[must_use]
    pub fn predicted_total(&self, predicted: &str) -> usize {
        self.cells.get(predicted).map_or(0, |row| row.values().sum())
    }

    /// Times `actual` was the real class (true positives + false negatives).
    #[must_use]
    pub fn actual_total(&self, actual: &str) -> usize {
        self.cells
            .values()
            .map(|row| row.get(actual).copied().unwrap_or(0))
            .sum()
    }

    /// Sum of every cell.
    #[must_use]
    pub fn total(&self) -> usize {
        self.cells.values().flat_map(|row| row.values()).sum()
    }

    /// Tab-separated rendering; predicted rows are suffixed with `^`.
    #[must_use]
    pub fn to_table_string(&self) -> String {
        let classes: Vec<&str> = self.classes().collect();
        let mut s = format!("\t{}\n", classes.join("\t"));
        for predicted in &classes {
            let counts: Vec<String> = classes
                .iter()
                .map(|actual| self.count(predicted, actual).to_string())
                .collect();
            s.push_str(&format!("{}^\t{}\n", predicted, counts.join("\t")));
        }
        s
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_table_string())
    }
}

/// Build the confusion matrix of a classification run.
///
/// Instances with no prediction are skipped.
///
/// # Errors
///
/// - [`Error::Core`] (not found) for an instance without qrels judgements
/// - [`Error::UnknownClass`] for a predicted class never judged in the qrels
pub fn confusion_matrix(run: &Run, qrels: &QRels) -> Result<ConfusionMatrix> {
    let mut cm = ConfusionMatrix::with_classes(qrels.doc_ids());
    for (instance, entries) in run.entries() {
        if entries.is_empty() {
            continue;
        }
        let real = qrels.judgements_for(instance).ok_or_else(|| {
            treval_core::Error::not_found(format!("instance \"{}\" not in qrels", instance))
        })?;
        for predicted in entries {
            for actual in real.keys() {
                cm.increment(&predicted.doc_id, actual)?;
            }
        }
    }
    Ok(cm)
}

/// Per-class precision (diagonal over row total) and their unweighted mean.
///
/// Reuses `matrix` when given, otherwise builds it from the run.
///
/// # Errors
///
/// [`Error::DivisionByZero`] for a class never predicted, or when there are no
/// classes.
pub fn precision_classification(
    run: &Run,
    qrels: &QRels,
    matrix: Option<&ConfusionMatrix>,
) -> Result<Evaluation> {
    per_class("precision_classification", run, qrels, matrix, |cm, class| {
        cm.predicted_total(class)
    })
}

/// Per-class recall (diagonal over column total) and their unweighted mean.
///
/// # Errors
///
/// [`Error::DivisionByZero`] for a class that never occurs as real class, or
/// when there are no classes.
pub fn recall_classification(
    run: &Run,
    qrels: &QRels,
    matrix: Option<&ConfusionMatrix>,
) -> Result<Evaluation> {
    per_class("recall_classification", run, qrels, matrix, |cm, class| {
        cm.actual_total(class)
    })
}

fn per_class<F>(
    metric: &str,
    run: &Run,
    qrels: &QRels,
    matrix: Option<&ConfusionMatrix>,
    denominator: F,
) -> Result<Evaluation>
where
    F: Fn(&ConfusionMatrix, &str) -> usize,
{
    let owned;
    let cm = match matrix {
        Some(cm) => cm,
        None => {
            owned = confusion_matrix(run, qrels)?;
            &owned
        }
    };

    let mut details = BTreeMap::new();
    for class in cm.classes() {
        let total = denominator(cm, class);
        if total == 0 {
            return Err(Error::division_by_zero(metric, format!("class {}", class)));
        }
        details.insert(
            class.to_string(),
            cm.count(class, class) as f64 / total as f64,
        );
    }
    macro_average(metric, details)
}

fn macro_average(metric: &str, details: BTreeMap<String, f64>) -> Result<Evaluation> {
    if details.is_empty() {
        return Err(Error::division_by_zero(metric, "no classes"));
    }
    let mean = details.values().sum::<f64>() / details.len() as f64;
    Ok(Evaluation::new(mean, details))
}

// =============================================================================
// Multi-label
// =============================================================================

/// Averaged multi-label scores (set-overlap based, per instance).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiLabelScores {
    /// Mean of `|P ∩ R| / |P|`.
    pub precision: f64,
    /// Mean of `|P ∩ R| / |R|`.
    pub recall: f64,
    /// Mean of `|P ∩ R| / |P ∪ R|`.
    pub accuracy: f64,
    /// Fraction of instances with `P == R`.
    pub exact_match_ratio: f64,
    /// Number of instances averaged over.
    pub instances: usize,
}

fn predicted_set(run: &Run, instance: &str) -> BTreeSet<String> {
    run.entries_by(instance)
        .iter()
        .map(|e| e.doc_id.clone())
        .collect()
}

fn real_set(qrels: &QRels, instance: &str) -> BTreeSet<String> {
    qrels
        .all_relevants(instance)
        .map(|set| set.into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

fn overlap_ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn per_instance<F>(metric: &str, run: &Run, qrels: &QRels, score: F) -> Result<Evaluation>
where
    F: Fn(&BTreeSet<String>, &BTreeSet<String>) -> f64,
{
    let details: BTreeMap<String, f64> = run
        .topic_ids()
        .map(|instance| {
            let predicted = predicted_set(run, instance);
            let real = real_set(qrels, instance);
            (instance.to_string(), score(&predicted, &real))
        })
        .collect();
    if details.is_empty() {
        return Err(Error::division_by_zero(metric, "run has no instances"));
    }
    let mean = details.values().sum::<f64>() / details.len() as f64;
    Ok(Evaluation::new(mean, details))
}

/// Multi-label precision; an empty prediction scores 0.
///
/// # Errors
///
/// [`Error::DivisionByZero`] for a run without instances.
pub fn multi_label_precision(run: &Run, qrels: &QRels) -> Result<Evaluation> {
    per_instance("multi_label_precision", run, qrels, |p, r| {
        overlap_ratio(p.intersection(r).count(), p.len())
    })
}

/// Multi-label recall; an instance without real classes scores 0.
///
/// # Errors
///
/// [`Error::DivisionByZero`] for a run without instances.
pub fn multi_label_recall(run: &Run, qrels: &QRels) -> Result<Evaluation> {
    per_instance("multi_label_recall", run, qrels, |p, r| {
        overlap_ratio(p.intersection(r).count(), r.len())
    })
}

/// Multi-label accuracy (Jaccard of predicted and real sets).
///
/// # Errors
///
/// [`Error::DivisionByZero`] for a run without instances.
pub fn multi_label_accuracy(run: &Run, qrels: &QRels) -> Result<Evaluation> {
    per_instance("multi_label_accuracy", run, qrels, |p, r| {
        overlap_ratio(p.intersection(r).count(), p.union(r).count())
    })
}

/// Fraction of instances whose predicted set equals the real set.
///
/// # Errors
///
/// [`Error::DivisionByZero`] for a run without instances.
pub fn exact_match_ratio(run: &Run, qrels: &QRels) -> Result<Evaluation> {
    per_instance("exact_match_ratio", run, qrels, |p, r| {
        if p == r {
            1.0
        } else {
            0.0
        }
    })
}

/// All four multi-label scores at once.
///
/// # Errors
///
/// [`Error::DivisionByZero`] for a run without instances.
pub fn multi_label_scores(run: &Run, qrels: &QRels) -> Result<MultiLabelScores> {
    Ok(MultiLabelScores {
        precision: multi_label_precision(run, qrels)?.score,
        recall: multi_label_recall(run, qrels)?.score,
        accuracy: multi_label_accuracy(run, qrels)?.score,
        exact_match_ratio: exact_match_ratio(run, qrels)?.score,
        instances: run.num_topics(),
    })
}

/// Per-class F1 over the whole run, macro-averaged over the class vocabulary.
///
/// For class `c`: `2·|pred ∧ true| / (|true| + |pred|)`, where `|true|` counts
/// qrels instances judging `c` relevant and `|pred|` counts run instances
/// predicting `c`. A class neither judged relevant nor predicted scores 0.
///
/// # Errors
///
/// [`Error::DivisionByZero`] when the qrels has no classes.
pub fn retrieval_fscore(run: &Run, qrels: &QRels) -> Result<Evaluation> {
    // class -> (both, judged true, predicted)
    let mut counts: BTreeMap<&str, (usize, usize, usize)> =
        qrels.doc_ids().into_iter().map(|c| (c, (0, 0, 0))).collect();

    for instance in qrels.topic_ids() {
        for class in qrels.all_relevants(instance)? {
            if let Some(c) = counts.get_mut(class) {
                c.1 += 1;
            }
        }
    }
    for (instance, entries) in run.entries() {
        let predicted: BTreeSet<&str> = entries.iter().map(|e| e.doc_id.as_str()).collect();
        for class in predicted {
            if let Some(c) = counts.get_mut(class) {
                c.2 += 1;
                if qrels.is_relevant(instance, class) {
                    c.0 += 1;
                }
            }
        }
    }

    let details: BTreeMap<String, f64> = counts
        .into_iter()
        .map(|(class, (both, judged, predicted))| {
            (class.to_string(), overlap_ratio(2 * both, judged + predicted))
        })
        .collect();
    macro_average("retrieval_fscore", details)
}
