//! Evaluating runs against metric sets, plus bulk run I/O and inspection
//! helpers.

use super::compare::significance_test;
use super::config::EvalConfig;
use super::metric::{Metric, MetricSet};
use super::types::{NamedEvaluation, RunEvaluation};
use crate::{QRels, Result, Run};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Evaluate one run with every metric of `measures`.
///
/// # Errors
///
/// The first metric error.
pub fn evaluate(run: &Run, qrels: &QRels, measures: &MetricSet) -> Result<Vec<NamedEvaluation>> {
    let results = measures
        .iter()
        .map(|metric| {
            Ok(NamedEvaluation {
                metric: metric.name(),
                evaluation: metric.evaluate(run, qrels)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    log::debug!(
        "evaluated {} with {} metrics ({})",
        run.name(),
        results.len(),
        measures.name()
    );
    Ok(results)
}

fn evaluate_one(run: &Run, qrels: &QRels, measures: &MetricSet) -> Result<RunEvaluation> {
    Ok(RunEvaluation {
        run: run.name().to_string(),
        results: evaluate(run, qrels, measures)?,
    })
}

/// Evaluate several runs, in input order.
///
/// With the `parallel` feature runs are evaluated on the rayon pool; the
/// results are identical to sequential evaluation.
///
/// # Errors
///
/// The first metric error of any run.
pub fn evaluate_runs(
    runs: &[Run],
    qrels: &QRels,
    measures: &MetricSet,
) -> Result<Vec<RunEvaluation>> {
    evaluate_all(runs, qrels, measures)
}

#[cfg(feature = "parallel")]
fn evaluate_all(runs: &[Run], qrels: &QRels, measures: &MetricSet) -> Result<Vec<RunEvaluation>> {
    use rayon::prelude::*;
    runs.par_iter()
        .map(|run| evaluate_one(run, qrels, measures))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate_all(runs: &[Run], qrels: &QRels, measures: &MetricSet) -> Result<Vec<RunEvaluation>> {
    evaluate_sequential(runs, qrels, measures)
}

fn evaluate_sequential(
    runs: &[Run],
    qrels: &QRels,
    measures: &MetricSet,
) -> Result<Vec<RunEvaluation>> {
    runs.iter()
        .map(|run| evaluate_one(run, qrels, measures))
        .collect()
}

/// Evaluate several runs as described by `config`.
///
/// Parallel only when both `config.parallel` and the `parallel` feature are on.
///
/// # Errors
///
/// The first metric error of any run.
pub fn evaluate_with_config(
    runs: &[Run],
    qrels: &QRels,
    config: &EvalConfig,
) -> Result<Vec<RunEvaluation>> {
    let measures = config.measures();
    if config.parallel {
        evaluate_runs(runs, qrels, &measures)
    } else {
        evaluate_sequential(runs, qrels, &measures)
    }
}

/// [`significance_test`] with the test kind chosen by `config.significance`.
///
/// # Errors
///
/// As [`significance_test`].
pub fn significance_with_config(
    reference: &Run,
    others: &[Run],
    qrels: &QRels,
    metric: &Metric,
    config: &EvalConfig,
) -> Result<BTreeMap<String, f64>> {
    significance_test(reference, others, qrels, metric, config.significance)
}

/// Write a tab-separated table: one header row, one row per run.
///
/// ```text
/// run name	map	ndcg
/// bm25	0.2931	0.5120
/// ```
///
/// # Errors
///
/// Metric errors and write failures.
pub fn write_summary<W: Write>(
    runs: &[Run],
    qrels: &QRels,
    measures: &MetricSet,
    out: &mut W,
) -> Result<()> {
    let mut header = vec!["run name".to_string()];
    header.extend(measures.names());
    writeln!(out, "{}", header.join("\t"))?;

    for evaluation in evaluate_runs(runs, qrels, measures)? {
        let mut row = vec![evaluation.run];
        row.extend(evaluation.results.iter().map(|r| r.evaluation.score.to_string()));
        writeln!(out, "{}", row.join("\t"))?;
    }
    Ok(())
}

/// Write each run to `dir/<run name>`. Returns the written paths.
///
/// # Errors
///
/// [`crate::Error::Io`] if a file cannot be created or written.
pub fn write_all(runs: &[Run], dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    runs.iter()
        .map(|run| {
            let path = dir.join(run.name());
            let mut out = BufWriter::new(File::create(&path)?);
            run.write(&mut out)?;
            out.flush()?;
            Ok(path)
        })
        .collect()
}

/// Load runs from files, naming each after its file.
///
/// # Errors
///
/// The first I/O or parse error.
pub fn load_all<I, P>(paths: I) -> Result<Vec<Run>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths
        .into_iter()
        .map(|p| Ok(Run::from_path(p, None)?))
        .collect()
}

/// Print `topic rank doc relevance` lines for the first `top_n` entries of a
/// topic; relevance is `?` for unjudged documents.
///
/// # Errors
///
/// Write failures.
pub fn show_relevance_scores<W: Write>(
    run: &Run,
    qrels: &QRels,
    topic: &str,
    top_n: usize,
    out: &mut W,
) -> Result<()> {
    for (i, entry) in run.entries_by(topic).iter().take(top_n).enumerate() {
        let relevance = qrels
            .relevance_score(topic, &entry.doc_id)
            .map_or_else(|| "?".to_string(), |s| s.to_string());
        writeln!(out, "{}\t{}\t{}\t{}", topic, i + 1, entry.doc_id, relevance)?;
    }
    Ok(())
}

/// One row of [`relevance_table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceRow {
    /// Topic id.
    pub topic: String,
    /// 1-based rank.
    pub rank: usize,
    /// Document id.
    pub doc_id: String,
    /// Run annotation.
    pub annotation: String,
    /// Judged relevance, or the `non_judged` fill value.
    pub relevance: f64,
}

/// Relevance of the first `top_n` entries of every run topic, with
/// unjudged documents filled in from `config.non_judged`.
#[must_use]
pub fn relevance_table_with_config(
    run: &Run,
    qrels: &QRels,
    top_n: usize,
    config: &EvalConfig,
) -> Vec<RelevanceRow> {
    relevance_table(run, qrels, top_n, config.non_judged)
}

/// Relevance of the first `top_n` entries of every run topic.
#[must_use]
pub fn relevance_table(
    run: &Run,
    qrels: &QRels,
    top_n: usize,
    non_judged: f64,
) -> Vec<RelevanceRow> {
    run.entries()
        .iter()
        .flat_map(|(topic, entries)| {
            entries.iter().take(top_n).enumerate().map(move |(i, e)| RelevanceRow {
                topic: topic.clone(),
                rank: i + 1,
                doc_id: e.doc_id.clone(),
                annotation: e.annotation.clone(),
                relevance: qrels.relevance_score(topic, &e.doc_id).unwrap_or(non_judged),
            })
        })
        .collect()
}

/// Copy of `run` keeping only topics judged in `qrels`, named
/// `<name>_only_qrels_topics`.
#[must_use]
pub fn keep_qrels_topics(run: &Run, qrels: &QRels) -> Run {
    Run::from_entries(
        format!("{}_only_qrels_topics", run.name()),
        run.entries()
            .iter()
            .filter(|(topic, _)| qrels.contains_topic(topic))
            .map(|(topic, entries)| (topic.clone(), entries.clone())),
    )
}
