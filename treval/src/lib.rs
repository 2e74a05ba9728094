//! # treval
//!
//! Offline evaluation of retrieval, classification and clustering runs.
//!
//! - **Retrieval**: precision, recall, MAP, P@k, NDCG
//! - **Classification**: confusion matrix, macro P/R, multi-label scores
//! - **Clustering**: purity, NMI, Rand index, pairwise F_β, Jaccard alignment
//! - **Comparison**: ranking runs, Kendall's tau, paired t-tests
//!
//! Runs and judgements come from [`treval_core`] and are re-exported here.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use treval::eval::{write_summary, MetricSet};
//! use treval::{QRels, Run};
//!
//! let qrels = QRels::from_path("qrels.txt")?;
//! let runs = vec![
//!     Run::from_path("bm25.trecrun", None)?,
//!     Run::from_path("dense.trecrun", None)?,
//! ];
//! write_summary(&runs, &qrels, &MetricSet::standard(), &mut std::io::stdout())?;
//! # Ok::<(), treval::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! ```toml
//! [dependencies]
//! treval = "0.1"                                       # sequential
//! treval = { version = "0.1", features = ["parallel"] } # + rayon over runs
//! ```
//!
//! ## Conventions
//!
//! - A document is relevant when its judgement is at least [`RELEVANCE_THRESHOLD`].
//! - Retrieval aggregates divide by the number of **qrels** topics.
//! - Zero denominators a metric does not guard are reported as
//!   [`Error::DivisionByZero`], never as `NaN`.
//! - Topics, classes and clusters are iterated in sorted order, so results are
//!   deterministic.

#![warn(missing_docs)]

pub mod error;
pub mod eval;

pub use error::{Error, Result};
pub use treval_core::{
    run_name_from_path, Judgement, QRels, Run, RunEntry, RELEVANCE_THRESHOLD, RUN_EXTENSION,
};
