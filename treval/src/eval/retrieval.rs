//! Ranked-retrieval metrics: precision, recall, AP, P@k, NDCG.
//!
//! Every metric computes a score per topic of the run and averages by summing
//! those scores and dividing by the number of topics in the **qrels**. Topics
//! judged in the qrels but missing from the run therefore pull the aggregate
//! down without appearing in the details.
//!
//! Zero denominators are handled per metric, matching the reference protocol:
//!
//! | Metric | Zero case | Behavior |
//! |--------|-----------|----------|
//! | precision | no returned documents | [`Error::DivisionByZero`] |
//! | recall | no relevant documents | [`Error::DivisionByZero`] |
//! | AP | no relevant documents | topic scores 0 |
//! | P@k | short result list | divided by `k` anyway |
//! | NDCG | IDCG = 0 or no returned documents | [`Error::DivisionByZero`] |

use super::types::Evaluation;
use crate::{Error, QRels, Result, Run, RunEntry};
use std::collections::BTreeMap;

/// Number of entries judged relevant.
fn count_relevant<'a, I>(qrels: &QRels, topic: &str, entries: I) -> usize
where
    I: IntoIterator<Item = &'a RunEntry>,
{
    entries
        .into_iter()
        .filter(|e| qrels.is_relevant(topic, &e.doc_id))
        .count()
}

/// Sum per-topic scores and divide by the qrels topic count.
pub(crate) fn mean_over_qrels(
    metric: &str,
    run: &Run,
    qrels: &QRels,
    details: BTreeMap<String, f64>,
) -> Result<Evaluation> {
    let n_topics = qrels.n_topics();
    if n_topics == 0 {
        return Err(Error::division_by_zero(metric, "qrels has no topics"));
    }

    let unjudged = run.topic_ids().filter(|t| !qrels.contains_topic(t)).count();
    if unjudged > 0 {
        log::warn!(
            "{}: run '{}' has {} topic(s) absent from qrels",
            metric,
            run.name(),
            unjudged
        );
    }

    let mut sum = 0.0;
    for score in details.values() {
        sum += score;
    }
    let score = sum / n_topics as f64;
    log::debug!(
        "{} for run '{}': {:.4} ({} scored / {} judged topics)",
        metric,
        run.name(),
        score,
        details.len(),
        n_topics
    );
    Ok(Evaluation::new(score, details))
}

/// Precision: relevant returned documents over returned documents.
///
/// # Errors
///
/// [`Error::DivisionByZero`] if any topic of the run has an empty entry list.
pub fn precision(run: &Run, qrels: &QRels) -> Result<Evaluation> {
    let mut details = BTreeMap::new();
    for (topic, entries) in run.entries() {
        if entries.is_empty() {
            return Err(Error::division_by_zero(
                "precision",
                format!("topic {} returned no documents", topic),
            ));
        }
        let relevant = count_relevant(qrels, topic, entries);
        details.insert(topic.clone(), relevant as f64 / entries.len() as f64);
    }
    mean_over_qrels("precision", run, qrels, details)
}

/// Recall: relevant returned documents over all relevant documents.
///
/// # Errors
///
/// [`Error::DivisionByZero`] if a run topic has no relevant judgement.
pub fn recall(run: &Run, qrels: &QRels) -> Result<Evaluation> {
    let mut details = BTreeMap::new();
    for (topic, entries) in run.entries() {
        let total = qrels.n_relevant(topic);
        if total == 0 {
            return Err(Error::division_by_zero(
                "recall",
                format!("topic {} has no relevant documents", topic),
            ));
        }
        let found = count_relevant(qrels, topic, entries);
        details.insert(topic.clone(), found as f64 / total as f64);
    }
    mean_over_qrels("recall", run, qrels, details)
}

/// Average precision of a single ranked list.
///
/// Sums `relevant_so_far / rank` at every relevant rank and divides by the
/// topic's total number of relevant documents; 0 when there are none.
#[must_use]
pub fn topic_average_precision(qrels: &QRels, topic: &str, entries: &[RunEntry]) -> f64 {
    let mut sum_prec = 0.0;
    let mut num_rel = 0usize;
    for (idx, entry) in entries.iter().enumerate() {
        if qrels.is_relevant(topic, &entry.doc_id) {
            num_rel += 1;
            sum_prec += num_rel as f64 / (idx + 1) as f64;
        }
    }
    let total = qrels.n_relevant(topic);
    if total > 0 {
        sum_prec / total as f64
    } else {
        0.0
    }
}

/// Mean average precision.
///
/// # Errors
///
/// Only fails when the qrels has no topics.
pub fn average_precision(run: &Run, qrels: &QRels) -> Result<Evaluation> {
    let details: BTreeMap<String, f64> = run
        .entries()
        .iter()
        .map(|(topic, entries)| (topic.clone(), topic_average_precision(qrels, topic, entries)))
        .collect();
    mean_over_qrels("map", run, qrels, details)
}

/// Precision at a fixed rank cutoff.
///
/// Always divides by `k`: a topic returning fewer than `k` documents is
/// penalized for the missing ones.
///
/// # Errors
///
/// [`Error::InvalidInput`] when `k == 0`.
pub fn precision_at(run: &Run, qrels: &QRels, k: usize) -> Result<Evaluation> {
    if k == 0 {
        return Err(Error::invalid_input("precision cutoff must be at least 1"));
    }
    let details: BTreeMap<String, f64> = run
        .entries()
        .iter()
        .map(|(topic, entries)| {
            let relevant = count_relevant(qrels, topic, entries.iter().take(k));
            (topic.clone(), relevant as f64 / k as f64)
        })
        .collect();
    mean_over_qrels(&format!("P@{}", k), run, qrels, details)
}

/// Discounted cumulative gain: `rel[1] + Σ_{i>=2} rel[i] / log2(i)`.
///
/// Returns `None` for an empty sequence.
#[must_use]
pub fn dcg(relevances: &[f64]) -> Option<f64> {
    let (first, rest) = relevances.split_first()?;
    let tail: f64 = rest
        .iter()
        .enumerate()
        .map(|(idx, rel)| rel / ((idx + 2) as f64).log2())
        .sum();
    Some(first + tail)
}

/// Normalized DCG.
///
/// Relevance grades come from the qrels (unjudged documents count 0). The
/// ideal ordering is the same grades sorted descending, so only the returned
/// documents contribute to IDCG.
///
/// # Errors
///
/// [`Error::DivisionByZero`] when a topic returned nothing or none of its
/// returned documents has positive relevance.
pub fn ndcg(run: &Run, qrels: &QRels) -> Result<Evaluation> {
    let mut details = BTreeMap::new();
    for (topic, entries) in run.entries() {
        let mut relevances =
            qrels.relevance_scores(topic, entries.iter().map(|e| e.doc_id.as_str()), 0.0);
        let no_docs = || {
            Error::division_by_zero("ndcg", format!("topic {} returned no documents", topic))
        };
        let dcg_value = dcg(&relevances).ok_or_else(no_docs)?;

        relevances.sort_by(|a, b| b.total_cmp(a));
        let idcg = dcg(&relevances).ok_or_else(no_docs)?;
        if idcg == 0.0 {
            return Err(Error::division_by_zero(
                "ndcg",
                format!("topic {} has zero ideal DCG", topic),
            ));
        }
        details.insert(topic.clone(), dcg_value / idcg);
    }
    mean_over_qrels("ndcg", run, qrels, details)
}
