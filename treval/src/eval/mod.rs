//! Evaluation of runs against qrels.
//!
//! # Metric families
//!
//! | Module | Metrics | Unit of `details` |
//! |--------|---------|-------------------|
//! | [`retrieval`] | precision, recall, MAP, P@k, NDCG | topic |
//! | [`classification`] | confusion matrix, macro P/R, multi-label, F-score | class / instance |
//! | [`clustering`] | purity, NMI, Rand index, pairwise F_β | cluster (purity only) |
//!
//! Every metric returns an [`Evaluation`]: the aggregate score plus the
//! per-unit breakdown. [`Metric`] dispatches over all of them by value.
//!
//! # Comparing runs
//!
//! [`compare`] ranks runs, correlates rankings (Kendall's tau) and tests
//! per-topic differences for significance ([`stats`]).
//!
//! # Example
//!
//! ```rust
//! use treval::eval::{evaluate, MetricSet};
//! use treval::{QRels, Run, RunEntry};
//!
//! let qrels = QRels::from_judgements(vec![("t1", vec![("d1", 1.0), ("d3", 1.0)])]);
//! let run = Run::from_entries(
//!     "system",
//!     vec![(
//!         "t1",
//!         vec![
//!             RunEntry::new("d1", 3.0),
//!             RunEntry::new("d2", 2.0),
//!             RunEntry::new("d3", 1.0),
//!         ],
//!     )],
//! );
//!
//! let results = evaluate(&run, &qrels, &MetricSet::standard()).unwrap();
//! assert_eq!(results[0].metric, "map");
//! assert!((results[0].evaluation.score - 5.0 / 6.0).abs() < 1e-12);
//! ```

pub mod classification;
pub mod cluster_align;
pub mod clustering;
pub mod compare;
pub mod config;
pub mod curve;
pub mod evaluator;
pub mod metric;
pub mod retrieval;
pub mod stats;
pub mod types;

pub use classification::{
    confusion_matrix, exact_match_ratio, multi_label_accuracy, multi_label_precision,
    multi_label_recall, multi_label_scores, precision_classification, recall_classification,
    retrieval_fscore, ConfusionMatrix, MultiLabelScores,
};
pub use cluster_align::{clusters_of, jaccard_index, jaccard_map, max_jaccard, Clusters};
pub use clustering::{
    f_clustering, nmi, pair_counts, purity, purity_by_cluster, rand_index, ClusterAssignment,
    ClusterMajority, PairCounts,
};
pub use compare::{
    difference_from_average, difference_with, rank_runs, rank_similarity, significance_test,
    RankedRun, TestKind,
};
pub use config::{EvalConfig, EvalConfigBuilder};
pub use curve::{average_interpolated_precision, interpolated_precision, RECALL_LEVELS};
pub use evaluator::{
    evaluate, evaluate_runs, evaluate_with_config, keep_qrels_topics, load_all, relevance_table,
    relevance_table_with_config, show_relevance_scores, significance_with_config, write_all,
    write_summary, RelevanceRow,
};
pub use metric::{Metric, MetricRegistry, MetricSet};
pub use retrieval::{average_precision, dcg, ndcg, precision, precision_at, recall};
pub use stats::{KendallTau, TTest};
pub use types::{Evaluation, NamedEvaluation, RunEvaluation};
