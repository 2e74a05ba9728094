//! Ranked system output ("runs").
//!
//! A run maps each topic to the documents a system returned for it. Entries are
//! kept sorted by score, highest first; documents with equal scores keep the
//! order they were given in, so rank positions are reproducible.
//!
//! # File format
//!
//! ```text
//! topicId <TAB> Q0 <TAB> docId <TAB> rank <TAB> score [<TAB> annotation]
//! ```
//!
//! The rank column is ignored when reading: ranks are re-derived from the score
//! order. A missing annotation is read as the empty string.

use crate::qrels::QRels;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Extension recognised when deriving a run name from its file name.
pub const RUN_EXTENSION: &str = "trecrun";

/// One retrieved document for a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    /// Identifier of the returned document (or class / cluster label).
    pub doc_id: String,
    /// System score; higher ranks first.
    pub score: f64,
    /// Free-form annotation carried through from the run file.
    pub annotation: String,
}

impl RunEntry {
    /// Create an entry without annotation.
    #[must_use]
    pub fn new(doc_id: impl Into<String>, score: f64) -> Self {
        Self {
            doc_id: doc_id.into(),
            score,
            annotation: String::new(),
        }
    }

    /// Attach an annotation.
    #[must_use]
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = annotation.into();
        self
    }
}

impl From<(&str, f64, &str)> for RunEntry {
    fn from((doc_id, score, annotation): (&str, f64, &str)) -> Self {
        Self::new(doc_id, score).with_annotation(annotation)
    }
}

/// The ranked output of one system over a set of topics.
#[derive(Debug, Clone, Serialize)]
pub struct Run {
    name: String,
    entries: BTreeMap<String, Vec<RunEntry>>,
}

impl Run {
    /// Build a run from an in-memory mapping `topic -> entries`.
    ///
    /// Entry lists need not be sorted; they are sorted by score (descending,
    /// stable) before this returns.
    pub fn from_entries<I, T>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (T, Vec<RunEntry>)>,
        T: Into<String>,
    {
        let mut map: BTreeMap<String, Vec<RunEntry>> = BTreeMap::new();
        for (topic, list) in entries {
            map.entry(topic.into()).or_default().extend(list);
        }
        let mut run = Self {
            name: name.into(),
            entries: map,
        };
        run.sort_entries();
        run
    }

    /// Load a run file.
    ///
    /// When `name` is `None` (or empty) the run is named after the file: the
    /// file stem for `*.trecrun` files, the full file name otherwise.
    ///
    /// # Errors
    ///
    /// Fails on IO errors and on the first malformed line; nothing is skipped.
    pub fn from_path(path: impl AsRef<Path>, name: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let name = match name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => run_name_from_path(path),
        };
        let run = Self::from_reader(BufReader::new(file), name)?;
        log::debug!(
            "loaded run '{}' from {} ({} topics)",
            run.name,
            path.display(),
            run.num_topics()
        );
        Ok(run)
    }

    /// Parse a run from any buffered reader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for a line with neither 5 nor 6 fields or an
    /// unparsable score.
    pub fn from_reader<R: BufRead>(reader: R, name: impl Into<String>) -> Result<Self> {
        let mut map: BTreeMap<String, Vec<RunEntry>> = BTreeMap::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let (topic, doc_id, score, annotation) = match fields.as_slice() {
                [topic, _q0, doc_id, _rank, score, annotation] => {
                    (*topic, *doc_id, *score, *annotation)
                }
                [topic, _q0, doc_id, _rank, score] => (*topic, *doc_id, *score, ""),
                other => {
                    return Err(Error::parse(
                        idx + 1,
                        format!(
                            "unparsable run line: expected 5 or 6 tab-separated fields, found {}",
                            other.len()
                        ),
                    ))
                }
            };
            let score: f64 = score
                .trim()
                .parse()
                .map_err(|e| Error::parse(idx + 1, format!("invalid score '{}': {}", score, e)))?;

            map.entry(topic.to_string())
                .or_default()
                .push(RunEntry::new(doc_id, score).with_annotation(annotation));
        }

        Ok(Self::from_entries(name, map))
    }

    fn sort_entries(&mut self) {
        for list in self.entries.values_mut() {
            // sort_by is stable: equal scores keep their input order.
            // Adding 0.0 folds -0.0 into 0.0 so signed zeros tie.
            list.sort_by(|a, b| (b.score + 0.0).total_cmp(&(a.score + 0.0)));
        }
    }

    /// Display name of the run.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read view of the whole `topic -> entries` mapping.
    #[must_use]
    pub fn entries(&self) -> &BTreeMap<String, Vec<RunEntry>> {
        &self.entries
    }

    /// Entries for `topic`, best first. Unknown topics yield an empty slice.
    #[must_use]
    pub fn entries_by(&self, topic: &str) -> &[RunEntry] {
        self.entries.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Score the run assigned to `doc` for `topic`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the topic is not in the run or the document was
    /// not returned for it.
    pub fn score(&self, topic: &str, doc: &str) -> Result<f64> {
        let list = self
            .entries
            .get(topic)
            .ok_or_else(|| Error::not_found(format!("topic \"{}\" not in run", topic)))?;
        list.iter()
            .find(|e| e.doc_id == doc)
            .map(|e| e.score)
            .ok_or_else(|| {
                Error::not_found(format!("invalid docId \"{}\" for topic \"{}\"", doc, topic))
            })
    }

    /// Topic identifiers in iteration order.
    pub fn topic_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of topics with an entry list (possibly empty).
    #[must_use]
    pub fn num_topics(&self) -> usize {
        self.entries.len()
    }

    /// Whether the run carries an entry list for `topic`.
    #[must_use]
    pub fn contains_topic(&self, topic: &str) -> bool {
        self.entries.contains_key(topic)
    }

    /// Remove every entry of `topic`, returning them if the topic existed.
    pub fn remove_entries(&mut self, topic: &str) -> Option<Vec<RunEntry>> {
        self.entries.remove(topic)
    }

    /// Drop all topics that have no judgements in `qrels`.
    ///
    /// Returns the number of topics removed.
    pub fn restrict_topics_to(&mut self, qrels: &QRels) -> usize {
        let before = self.entries.len();
        self.entries.retain(|topic, _| qrels.contains_topic(topic));
        let removed = before - self.entries.len();
        if removed > 0 {
            log::warn!(
                "run '{}': dropped {} topic(s) without judgements",
                self.name,
                removed
            );
        }
        removed
    }

    /// Write the run in TREC format, ranks starting at 1.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        for (topic, list) in &self.entries {
            for (rank, entry) in list.iter().enumerate() {
                writeln!(
                    out,
                    "{}\tQ0\t{}\t{}\t{}\t{}",
                    topic,
                    entry.doc_id,
                    rank + 1,
                    entry.score,
                    entry.annotation
                )?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Derive a run name from its file path.
#[must_use]
pub fn run_name_from_path(path: &Path) -> String {
    let is_run_file = path
        .extension()
        .map_or(false, |ext| ext == RUN_EXTENSION);
    let name = if is_run_file {
        path.file_stem()
    } else {
        path.file_name()
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
