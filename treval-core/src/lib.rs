//! # treval-core
//!
//! Data model for TREC-style evaluation, shared by every treval crate.
//!
//! - **Runs**: [`Run`], ranked system output per topic
//! - **Judgements**: [`QRels`], ground-truth relevance per (topic, document)
//! - **Flat files**: TREC run / qrels parsing and writing
//!
//! # Example
//!
//! ```rust
//! use treval_core::{QRels, Run, RunEntry};
//!
//! let qrels = QRels::from_judgements(vec![("t1", vec![("d1", 1.0), ("d2", 0.0)])]);
//! let run = Run::from_entries(
//!     "bm25",
//!     vec![("t1", vec![RunEntry::new("d2", 0.4), RunEntry::new("d1", 0.8)])],
//! );
//!
//! assert_eq!(run.entries_by("t1")[0].doc_id, "d1");
//! assert!(qrels.is_relevant("t1", "d1"));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod qrels;
pub mod run;

pub use error::{Error, Result};
pub use qrels::{Judgement, QRels, RELEVANCE_THRESHOLD};
pub use run::{run_name_from_path, Run, RunEntry, RUN_EXTENSION};
