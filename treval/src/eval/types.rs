//! Evaluation result types shared by every metric family.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of one metric over one run: the aggregate plus per-unit scores.
///
/// The unit is a topic for retrieval metrics, a class for classification
/// metrics and a cluster for purity. Metrics without a meaningful breakdown
/// (NMI, Rand index, pairwise F) leave `details` empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Aggregate score.
    pub score: f64,
    /// Per-unit scores.
    pub details: BTreeMap<String, f64>,
}

impl Evaluation {
    /// Create an evaluation from its parts.
    #[must_use]
    pub fn new(score: f64, details: BTreeMap<String, f64>) -> Self {
        Self { score, details }
    }

    /// An aggregate-only evaluation.
    #[must_use]
    pub fn scalar(score: f64) -> Self {
        Self {
            score,
            details: BTreeMap::new(),
        }
    }

    /// Per-unit score, if present.
    #[must_use]
    pub fn get(&self, unit: &str) -> Option<f64> {
        self.details.get(unit).copied()
    }

    /// Split into `(aggregate, details)`.
    #[must_use]
    pub fn into_parts(self) -> (f64, BTreeMap<String, f64>) {
        (self.score, self.details)
    }
}

/// An evaluation tagged with the metric that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEvaluation {
    /// Short metric name (e.g. `map`, `P@10`).
    pub metric: String,
    /// The result.
    pub evaluation: Evaluation,
}

/// Per-run results for a whole metric set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvaluation {
    /// Run name.
    pub run: String,
    /// One result per metric, in metric-set order.
    pub results: Vec<NamedEvaluation>,
}

impl RunEvaluation {
    /// Aggregate score of a metric by short name.
    #[must_use]
    pub fn score_of(&self, metric: &str) -> Option<f64> {
        self.results
            .iter()
            .find(|r| r.metric == metric)
            .map(|r| r.evaluation.score)
    }
}
