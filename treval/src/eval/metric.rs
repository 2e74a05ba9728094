//! Metric dispatch: one enum for every metric, sets of metrics, and a
//! name-based registry.
//!
//! ```
//! use treval::eval::{Metric, MetricRegistry, MetricSet};
//!
//! let registry = MetricRegistry::with_standard_metrics();
//! let set = registry.resolve(["map", "P@10", "ndcg"]).unwrap();
//! assert_eq!(set.len(), 3);
//! assert_eq!(MetricSet::standard().names(), vec!["map", "ndcg"]);
//! assert_eq!("P@5".parse::<Metric>().unwrap(), Metric::PrecisionAt(5));
//! ```

use super::clustering::{f_clustering, nmi, purity, rand_index};
use super::classification::{
    exact_match_ratio, multi_label_accuracy, multi_label_precision, multi_label_recall,
    retrieval_fscore,
};
use super::retrieval::{average_precision, ndcg, precision, precision_at, recall};
use super::types::Evaluation;
use crate::{Error, QRels, Result, Run};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Every metric the library computes.
///
/// Serialized as its short name (see [`Metric::name`]), so configuration files
/// list metrics as `["map", "P@10", "F1_clustering"]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Metric {
    /// Fraction of returned documents that are relevant.
    Precision,
    /// Fraction of relevant documents that are returned.
    Recall,
    /// Mean average precision.
    AveragePrecision,
    /// Precision over the first `k` positions.
    PrecisionAt(usize),
    /// Normalized discounted cumulative gain.
    Ndcg,
    /// Macro-averaged per-class F1 for multi-label runs.
    RetrievalFScore,
    /// Per-instance `|P ∩ R| / |P|`, averaged.
    MultiLabelPrecision,
    /// Per-instance `|P ∩ R| / |R|`, averaged.
    MultiLabelRecall,
    /// Per-instance `|P ∩ R| / |P ∪ R|`, averaged.
    MultiLabelAccuracy,
    /// Fraction of instances whose predicted set equals the real set.
    ExactMatch,
    /// Cluster purity.
    Purity,
    /// Normalized mutual information.
    Nmi,
    /// Rand index.
    RandIndex,
    /// Pairwise clustering F-measure.
    FClustering {
        /// Weight of recall relative to precision.
        beta: f64,
    },
}

impl Metric {
    /// Precision at cutoff `k`.
    #[must_use]
    pub fn precision_at(k: usize) -> Self {
        Metric::PrecisionAt(k)
    }

    /// Pairwise clustering F_β.
    #[must_use]
    pub fn f_clustering(beta: f64) -> Self {
        Metric::FClustering { beta }
    }

    /// Evaluate a run, with per-unit details.
    ///
    /// # Errors
    ///
    /// Whatever the underlying metric reports (zero denominators, missing
    /// labels, unknown classes).
    pub fn evaluate(&self, run: &Run, qrels: &QRels) -> Result<Evaluation> {
        match *self {
            Metric::Precision => precision(run, qrels),
            Metric::Recall => recall(run, qrels),
            Metric::AveragePrecision => average_precision(run, qrels),
            Metric::PrecisionAt(k) => precision_at(run, qrels, k),
            Metric::Ndcg => ndcg(run, qrels),
            Metric::RetrievalFScore => retrieval_fscore(run, qrels),
            Metric::MultiLabelPrecision => multi_label_precision(run, qrels),
            Metric::MultiLabelRecall => multi_label_recall(run, qrels),
            Metric::MultiLabelAccuracy => multi_label_accuracy(run, qrels),
            Metric::ExactMatch => exact_match_ratio(run, qrels),
            Metric::Purity => purity(run, qrels),
            Metric::Nmi => nmi(run, qrels),
            Metric::RandIndex => rand_index(run, qrels),
            Metric::FClustering { beta } => f_clustering(run, qrels, beta),
        }
    }

    /// Aggregate score only.
    ///
    /// # Errors
    ///
    /// See [`Metric::evaluate`].
    pub fn score(&self, run: &Run, qrels: &QRels) -> Result<f64> {
        self.evaluate(run, qrels).map(|e| e.score)
    }

    /// Short identifier (`map`, `P@10`, `F0.5_clustering`).
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Metric::Precision => "precision".into(),
            Metric::Recall => "recall".into(),
            Metric::AveragePrecision => "map".into(),
            Metric::PrecisionAt(k) => format!("P@{}", k),
            Metric::Ndcg => "ndcg".into(),
            Metric::RetrievalFScore => "retrieval_fscore".into(),
            Metric::MultiLabelPrecision => "multi_label_precision".into(),
            Metric::MultiLabelRecall => "multi_label_recall".into(),
            Metric::MultiLabelAccuracy => "multi_label_accuracy".into(),
            Metric::ExactMatch => "exact_match_ratio".into(),
            Metric::Purity => "purity".into(),
            Metric::Nmi => "nmi".into(),
            Metric::RandIndex => "rand_index".into(),
            Metric::FClustering { beta } => format!("F{}_clustering", beta),
        }
    }

    /// Human-readable label, for report headers and chart axes.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Metric::Precision => "Precision".into(),
            Metric::Recall => "Recall".into(),
            Metric::AveragePrecision => "Mean Average Precision".into(),
            Metric::PrecisionAt(k) => format!("Precision at {}", k),
            Metric::Ndcg => "Normalized Discounted Cumulative Gain".into(),
            Metric::RetrievalFScore => "Retrieval F-score".into(),
            Metric::MultiLabelPrecision => "Multi-label Precision".into(),
            Metric::MultiLabelRecall => "Multi-label Recall".into(),
            Metric::MultiLabelAccuracy => "Multi-label Accuracy".into(),
            Metric::ExactMatch => "Exact Match Ratio".into(),
            Metric::Purity => "Purity".into(),
            Metric::Nmi => "Normalized Mutual Information".into(),
            Metric::RandIndex => "Rand Index".into(),
            Metric::FClustering { beta } => format!("F{} Clustering", beta),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let metric = match s {
            "precision" | "P" => Metric::Precision,
            "recall" => Metric::Recall,
            "map" | "average_precision" | "avg_prec" => Metric::AveragePrecision,
            "ndcg" => Metric::Ndcg,
            "retrieval_fscore" => Metric::RetrievalFScore,
            "multi_label_precision" => Metric::MultiLabelPrecision,
            "multi_label_recall" => Metric::MultiLabelRecall,
            "multi_label_accuracy" => Metric::MultiLabelAccuracy,
            "exact_match_ratio" | "exact_match" => Metric::ExactMatch,
            "purity" => Metric::Purity,
            "nmi" => Metric::Nmi,
            "rand_index" => Metric::RandIndex,
            _ => {
                if let Some(k) = s.strip_prefix("P@") {
                    let k: usize = k.parse().map_err(|_| Error::unknown_metric(s))?;
                    if k == 0 {
                        return Err(Error::invalid_input("precision cutoff must be at least 1"));
                    }
                    return Ok(Metric::PrecisionAt(k));
                }
                if let Some(beta) = s
                    .strip_prefix('F')
                    .and_then(|rest| rest.strip_suffix("_clustering"))
                {
                    let beta: f64 = beta.parse().map_err(|_| Error::unknown_metric(s))?;
                    if !beta.is_finite() || beta < 0.0 {
                        return Err(Error::unknown_metric(s));
                    }
                    return Ok(Metric::FClustering { beta });
                }
                return Err(Error::unknown_metric(s));
            }
        };
        Ok(metric)
    }
}

impl TryFrom<String> for Metric {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Metric> for String {
    fn from(m: Metric) -> Self {
        m.name()
    }
}

/// An ordered, named collection of metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    name: String,
    metrics: Vec<Metric>,
}

impl MetricSet {
    /// Create a metric set.
    #[must_use]
    pub fn new(name: impl Into<String>, metrics: Vec<Metric>) -> Self {
        Self {
            name: name.into(),
            metrics,
        }
    }

    /// MAP and NDCG.
    #[must_use]
    pub fn standard() -> Self {
        Self::new("standard", vec![Metric::AveragePrecision, Metric::Ndcg])
    }

    /// A set holding one metric, named after it.
    #[must_use]
    pub fn single(metric: Metric) -> Self {
        Self::new(metric.name(), vec![metric])
    }

    /// Set name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Metrics in evaluation order.
    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Short names of the metrics.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.metrics.iter().map(Metric::name).collect()
    }

    /// Append a metric.
    pub fn push(&mut self, metric: Metric) {
        self.metrics.push(metric);
    }

    /// Number of metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Iterate over metrics.
    pub fn iter(&self) -> impl Iterator<Item = &Metric> {
        self.metrics.iter()
    }
}

impl Default for MetricSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl From<Metric> for MetricSet {
    fn from(metric: Metric) -> Self {
        Self::single(metric)
    }
}

impl<'a> IntoIterator for &'a MetricSet {
    type Item = &'a Metric;
    type IntoIter = std::slice::Iter<'a, Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.iter()
    }
}

/// Cutoffs registered for precision-at-k by [`MetricRegistry::with_standard_metrics`].
pub const STANDARD_CUTOFFS: [usize; 6] = [5, 10, 15, 20, 30, 100];

/// Name → metric lookup, filled by the caller.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    metrics: BTreeMap<String, Metric>,
}

impl MetricRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every fixed metric, the standard precision cutoffs and
    /// `F1_clustering`.
    #[must_use]
    pub fn with_standard_metrics() -> Self {
        let mut registry = Self::new();
        for metric in [
            Metric::Precision,
            Metric::Recall,
            Metric::AveragePrecision,
            Metric::Ndcg,
            Metric::RetrievalFScore,
            Metric::MultiLabelPrecision,
            Metric::MultiLabelRecall,
            Metric::MultiLabelAccuracy,
            Metric::ExactMatch,
            Metric::Purity,
            Metric::Nmi,
            Metric::RandIndex,
            Metric::f_clustering(1.0),
        ] {
            registry.register_metric(metric);
        }
        for k in STANDARD_CUTOFFS {
            registry.register_metric(Metric::precision_at(k));
        }
        registry
    }

    /// Register a metric under an explicit name, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, metric: Metric) {
        self.metrics.insert(name.into(), metric);
    }

    /// Register a metric under its short name.
    pub fn register_metric(&mut self, metric: Metric) {
        self.register(metric.name(), metric);
    }

    /// Look up a metric.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Metric> {
        self.metrics.get(name).copied()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    /// Number of registered metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Resolve names into a metric set, preserving order.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownMetric`] for the first name not in the registry.
    pub fn resolve<I, S>(&self, names: I) -> Result<MetricSet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let metrics = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).ok_or_else(|| Error::unknown_metric(name))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(MetricSet::new("resolved", metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RunEntry;

    #[test]
    fn test_names_parse_back() {
        let all = [
            Metric::Precision,
            Metric::Recall,
            Metric::AveragePrecision,
            Metric::precision_at(10),
            Metric::Ndcg,
            Metric::RetrievalFScore,
            Metric::MultiLabelPrecision,
            Metric::MultiLabelRecall,
            Metric::MultiLabelAccuracy,
            Metric::ExactMatch,
            Metric::Purity,
            Metric::Nmi,
            Metric::RandIndex,
            Metric::f_clustering(0.5),
        ];
        for metric in all {
            assert_eq!(metric.name().parse::<Metric>().unwrap(), metric);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "P@", "P@x", "Fx_clustering", "F-1_clustering", "bleu"] {
            assert!(
                matches!(bad.parse::<Metric>(), Err(Error::UnknownMetric(_))),
                "{:?} should not parse",
                bad
            );
        }
        assert!(matches!("P@0".parse::<Metric>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Metric::precision_at(10).display_name(), "Precision at 10");
        assert_eq!(Metric::f_clustering(1.0).name(), "F1_clustering");
        assert_eq!(Metric::AveragePrecision.to_string(), "map");
    }

    #[test]
    fn test_evaluate_dispatch() {
        let run = Run::from_entries(
            "r",
            vec![("t1", vec![RunEntry::new("d1", 2.0), RunEntry::new("d2", 1.0)])],
        );
        let qrels = QRels::from_judgements(vec![("t1", vec![("d2", 1.0)])]);
        assert!((Metric::AveragePrecision.score(&run, &qrels).unwrap() - 0.5).abs() < 1e-12);
        assert!((Metric::precision_at(1).score(&run, &qrels).unwrap()).abs() < 1e-12);
        let eval = Metric::Precision.evaluate(&run, &qrels).unwrap();
        assert_eq!(eval.get("t1"), Some(0.5));
    }

    #[test]
    fn test_multi_label_metrics_dispatch_and_resolve() {
        let run = Run::from_entries(
            "r",
            vec![
                ("i1", vec![RunEntry::new("sports", 2.0), RunEntry::new("news", 1.0)]),
                ("i2", vec![RunEntry::new("news", 1.0)]),
            ],
        );
        let qrels = QRels::from_judgements(vec![
            ("i1", vec![("sports", 1.0)]),
            ("i2", vec![("news", 1.0)]),
        ]);
        // i1: P = {sports, news}, R = {sports}; i2: exact
        assert_eq!(Metric::MultiLabelPrecision.score(&run, &qrels).unwrap(), 0.75);
        assert_eq!(Metric::MultiLabelRecall.score(&run, &qrels).unwrap(), 1.0);
        assert_eq!(Metric::MultiLabelAccuracy.score(&run, &qrels).unwrap(), 0.75);
        assert_eq!(Metric::ExactMatch.score(&run, &qrels).unwrap(), 0.5);

        let registry = MetricRegistry::with_standard_metrics();
        let set = registry
            .resolve([
                "multi_label_precision",
                "multi_label_recall",
                "multi_label_accuracy",
                "exact_match_ratio",
            ])
            .unwrap();
        assert_eq!(
            set.metrics(),
            &[
                Metric::MultiLabelPrecision,
                Metric::MultiLabelRecall,
                Metric::MultiLabelAccuracy,
                Metric::ExactMatch
            ]
        );
        assert_eq!("exact_match".parse::<Metric>().unwrap(), Metric::ExactMatch);
    }

    #[test]
    fn test_registry_resolve() {
        let registry = MetricRegistry::with_standard_metrics();
        assert_eq!(registry.get("P@10"), Some(Metric::PrecisionAt(10)));
        assert_eq!(registry.get("F1_clustering"), Some(Metric::f_clustering(1.0)));

        let set = registry.resolve(["ndcg", "map"]).unwrap();
        assert_eq!(set.metrics(), &[Metric::Ndcg, Metric::AveragePrecision]);

        let err = registry.resolve(["map", "P@7"]).unwrap_err();
        assert!(matches!(err, Error::UnknownMetric(name) if name == "P@7"));
    }

    #[test]
    fn test_registry_custom_names() {
        let mut registry = MetricRegistry::new();
        assert!(registry.is_empty());
        registry.register("P_7", Metric::precision_at(7));
        assert_eq!(registry.resolve(vec!["P_7".to_string()]).unwrap().len(), 1);
        assert!(registry.resolve(["map"]).is_err());
    }

    #[test]
    fn test_metric_set_defaults() {
        let set = MetricSet::default();
        assert_eq!(set.name(), "standard");
        assert_eq!(set.names(), vec!["map", "ndcg"]);
        let single: MetricSet = Metric::Nmi.into();
        assert_eq!(single.name(), "nmi");
        assert_eq!((&single).into_iter().count(), 1);
    }
}
