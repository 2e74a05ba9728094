//! Comparing runs: ranking, rank correlation, significance, per-topic deltas.

use super::metric::Metric;
use super::stats::{independent_t_test, kendall_tau, paired_t_test, KendallTau};
use crate::{Error, QRels, Result, Run};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A run with its aggregate score under some metric.
#[derive(Debug, Clone, Copy)]
pub struct RankedRun<'a> {
    /// The run.
    pub run: &'a Run,
    /// Aggregate score.
    pub score: f64,
}

impl RankedRun<'_> {
    /// Name of the run.
    #[must_use]
    pub fn name(&self) -> &str {
        self.run.name()
    }
}

/// Score every run and sort by descending score.
///
/// Runs with equal scores keep their input order.
///
/// # Errors
///
/// The first metric error of any run.
pub fn rank_runs<'a>(
    runs: &'a [Run],
    qrels: &QRels,
    metric: &Metric,
) -> Result<Vec<RankedRun<'a>>> {
    let mut ranked = runs
        .iter()
        .map(|run| {
            Ok(RankedRun {
                run,
                score: metric.score(run, qrels)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    ranked.sort_by(|a, b| (b.score + 0.0).total_cmp(&(a.score + 0.0)));
    log::info!(
        "ranked {} runs by {}: best {}",
        ranked.len(),
        metric.name(),
        ranked.first().map_or("-", |r| r.name())
    );
    Ok(ranked)
}

/// Kendall's tau between two rankings of the same runs.
///
/// Positions are matched by run name: the first ranking defines positions
/// `0..n`, the second is mapped onto them.
///
/// # Errors
///
/// - [`Error::Core`] (`NotFound`) when a run of `second` is absent from `first`.
/// - [`Error::InvalidInput`] for rankings of different length or fewer than two runs.
pub fn rank_similarity(first: &[RankedRun<'_>], second: &[RankedRun<'_>]) -> Result<KendallTau> {
    let positions: BTreeMap<&str, usize> = first
        .iter()
        .enumerate()
        .map(|(i, r)| (r.name(), i))
        .collect();
    let x: Vec<f64> = (0..first.len()).map(|i| i as f64).collect();
    let y = second
        .iter()
        .map(|r| {
            positions
                .get(r.name())
                .map(|&p| p as f64)
                .ok_or_else(|| {
                    let missing = format!("run '{}' in first ranking", r.name());
                    Error::from(treval_core::Error::not_found(missing))
                })
        })
        .collect::<Result<Vec<f64>>>()?;
    kendall_tau(&x, &y)
}

/// Which t-test [`significance_test`] runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Related samples: per-topic scores of both runs are paired.
    #[default]
    Paired,
    /// Independent samples with pooled variance.
    Independent,
}

/// Two-sided t-test of `reference` against each of `others`.
///
/// Scores are paired by topic, in the order of the reference's per-topic
/// details. Returns `run name -> p-value`; the p-value is `NaN` when fewer
/// than two topics are scored.
///
/// # Errors
///
/// - [`Error::Core`] (`NotFound`) when another run lacks a topic scored for
///   the reference.
/// - Metric errors.
pub fn significance_test(
    reference: &Run,
    others: &[Run],
    qrels: &QRels,
    metric: &Metric,
    test: TestKind,
) -> Result<BTreeMap<String, f64>> {
    let reference_details = metric.evaluate(reference, qrels)?.details;
    let topics: Vec<&String> = reference_details.keys().collect();
    let reference_scores: Vec<f64> = reference_details.values().copied().collect();

    let mut result = BTreeMap::new();
    for other in others {
        let details = metric.evaluate(other, qrels)?.details;
        let scores = topics
            .iter()
            .map(|&topic| {
                details.get(topic).copied().ok_or_else(|| {
                    Error::from(treval_core::Error::not_found(format!(
                        "topic {} in {} of run {}",
                        topic,
                        metric.name(),
                        other.name()
                    )))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        if scores.len() < 2 {
            log::warn!(
                "{} vs {} on {}: {} topic(s), p-value undefined",
                reference.name(),
                other.name(),
                metric.name(),
                scores.len()
            );
            result.insert(other.name().to_string(), f64::NAN);
            continue;
        }
        let outcome = match test {
            TestKind::Paired => paired_t_test(&reference_scores, &scores)?,
            TestKind::Independent => independent_t_test(&reference_scores, &scores)?,
        };
        log::info!(
            "{} vs {} on {}: t = {:.4}, p = {:.4}",
            reference.name(),
            other.name(),
            metric.name(),
            outcome.t_statistic,
            outcome.p_value
        );
        result.insert(other.name().to_string(), outcome.p_value);
    }
    Ok(result)
}

/// Per-topic score minus the run's aggregate.
///
/// # Errors
///
/// Metric errors.
pub fn difference_from_average(
    run: &Run,
    qrels: &QRels,
    metric: &Metric,
) -> Result<BTreeMap<String, f64>> {
    let (average, details) = metric.evaluate(run, qrels)?.into_parts();
    Ok(details
        .into_iter()
        .map(|(topic, score)| (topic, score - average))
        .collect())
}

/// For each of `others`, per qrels topic, `other − target`.
///
/// A topic without a score in either run counts as 0 for that run. Returns
/// `run name -> topic -> difference`.
///
/// # Errors
///
/// Metric errors.
pub fn difference_with(
    target: &Run,
    others: &[Run],
    qrels: &QRels,
    metric: &Metric,
) -> Result<BTreeMap<String, BTreeMap<String, f64>>> {
    let baseline = metric.evaluate(target, qrels)?.details;
    others
        .iter()
        .map(|other| {
            let details = metric.evaluate(other, qrels)?.details;
            let deltas = qrels
                .topic_ids()
                .map(|topic| {
                    let theirs = details.get(topic).copied().unwrap_or(0.0);
                    let ours = baseline.get(topic).copied().unwrap_or(0.0);
                    (topic.to_string(), theirs - ours)
                })
                .collect();
            Ok((other.name().to_string(), deltas))
        })
        .collect()
}
