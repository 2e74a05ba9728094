//! Relevance judgements ("qrels").
//!
//! Scores are floating point:
//!
//! | score | meaning |
//! |-------|---------|
//! | `< 0` | should be judged, but is not |
//! | `0` | judged not relevant |
//! | `(0, 1)` | probability of being relevant; *not* relevant for binary metrics |
//! | `>= 1` | relevant (graded metrics use the value itself) |
//!
//! # File format
//!
//! ```text
//! topicId <TAB> 0 <TAB> docId <TAB> relevance
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Threshold at or above which a judgement counts as relevant.
pub const RELEVANCE_THRESHOLD: f64 = 1.0;

/// Categorical view of a raw judgement score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Judgement {
    /// Negative score: the pair should be judged but is not.
    Unjudged,
    /// Zero: judged not relevant.
    NotRelevant,
    /// Strictly between 0 and 1: a relevance probability.
    Probable,
    /// At least 1: relevant.
    Relevant,
}

impl Judgement {
    /// Classify a raw qrels score.
    #[must_use]
    pub fn classify(score: f64) -> Self {
        if score >= RELEVANCE_THRESHOLD {
            Self::Relevant
        } else if score > 0.0 {
            Self::Probable
        } else if score == 0.0 {
            Self::NotRelevant
        } else {
            Self::Unjudged
        }
    }
}

/// Ground-truth judgements: `topic -> doc -> relevance`.
///
/// Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QRels {
    judgements: BTreeMap<String, BTreeMap<String, f64>>,
}

impl QRels {
    /// Build qrels from an in-memory mapping.
    ///
    /// A repeated (topic, doc) pair keeps the last score.
    pub fn from_judgements<I, T, J, D>(judgements: I) -> Self
    where
        I: IntoIterator<Item = (T, J)>,
        T: Into<String>,
        J: IntoIterator<Item = (D, f64)>,
        D: Into<String>,
    {
        let mut map: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for (topic, docs) in judgements {
            let topic_map = map.entry(topic.into()).or_default();
            for (doc, score) in docs {
                topic_map.insert(doc.into(), score);
            }
        }
        Self { judgements: map }
    }

    /// Load a qrels file.
    ///
    /// # Errors
    ///
    /// Fails on IO errors and on the first malformed line.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let qrels = Self::from_reader(BufReader::new(File::open(path)?))?;
        log::debug!(
            "loaded qrels from {} ({} topics)",
            path.display(),
            qrels.n_topics()
        );
        Ok(qrels)
    }

    /// Parse qrels from any buffered reader.
    ///
    /// Fields after the fourth are ignored.
    ///
    /// # Errors
    ///
    /// [`Error::Parse`] for lines with fewer than 4 fields or a non-numeric
    /// relevance.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut map: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 4 {
                return Err(Error::parse(
                    idx + 1,
                    format!(
                        "unparsable qrels line: expected 4 tab-separated fields, found {}",
                        fields.len()
                    ),
                ));
            }
            let score: f64 = fields[3].trim().parse().map_err(|e| {
                Error::parse(idx + 1, format!("invalid relevance '{}': {}", fields[3], e))
            })?;
            map.entry(fields[0].to_string())
                .or_default()
                .insert(fields[2].to_string(), score);
        }

        Ok(Self { judgements: map })
    }

    /// Number of relevant documents for `topic` (0 for unknown topics).
    #[must_use]
    pub fn n_relevant(&self, topic: &str) -> usize {
        self.judgements.get(topic).map_or(0, |docs| {
            docs.values()
                .filter(|&&s| s >= RELEVANCE_THRESHOLD)
                .count()
        })
    }

    /// Whether `doc` is relevant for `topic`. Missing pairs are not relevant.
    #[must_use]
    pub fn is_relevant(&self, topic: &str, doc: &str) -> bool {
        self.relevance_score(topic, doc)
            .map_or(false, |s| s >= RELEVANCE_THRESHOLD)
    }

    /// All relevant documents of `topic`, sorted.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the topic has no judgements at all.
    pub fn all_relevants(&self, topic: &str) -> Result<BTreeSet<&str>> {
        let docs = self
            .judgements
            .get(topic)
            .ok_or_else(|| Error::not_found(format!("topic \"{}\" not in qrels", topic)))?;
        Ok(docs
            .iter()
            .filter(|&(_, &s)| s >= RELEVANCE_THRESHOLD)
            .map(|(d, _)| d.as_str())
            .collect())
    }

    /// Raw score for a (topic, doc) pair, `None` when not present.
    #[must_use]
    pub fn relevance_score(&self, topic: &str, doc: &str) -> Option<f64> {
        self.judgements.get(topic)?.get(doc).copied()
    }

    /// Scores for `docs` in order, substituting `non_judged` for missing pairs.
    #[must_use]
    pub fn relevance_scores<'a, I>(&self, topic: &str, docs: I, non_judged: f64) -> Vec<f64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        docs.into_iter()
            .map(|d| self.relevance_score(topic, d).unwrap_or(non_judged))
            .collect()
    }

    /// Judgements recorded for `topic`.
    #[must_use]
    pub fn judgements_for(&self, topic: &str) -> Option<&BTreeMap<String, f64>> {
        self.judgements.get(topic)
    }

    /// Read view of every judgement.
    #[must_use]
    pub fn judgements(&self) -> &BTreeMap<String, BTreeMap<String, f64>> {
        &self.judgements
    }

    /// Topic identifiers in iteration order.
    pub fn topic_ids(&self) -> impl Iterator<Item = &str> {
        self.judgements.keys().map(String::as_str)
    }

    /// Number of judged topics.
    #[must_use]
    pub fn n_topics(&self) -> usize {
        self.judgements.len()
    }

    /// Whether `topic` has any judgement.
    #[must_use]
    pub fn contains_topic(&self, topic: &str) -> bool {
        self.judgements.contains_key(topic)
    }

    /// Sorted union of all judged document ids.
    ///
    /// In classification mode documents are class labels, so this is the class
    /// vocabulary.
    #[must_use]
    pub fn doc_ids(&self) -> BTreeSet<&str> {
        self.judgements
            .values()
            .flat_map(|docs| docs.keys().map(String::as_str))
            .collect()
    }

    /// Write the qrels in TREC format.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        for (topic, docs) in &self.judgements {
            for (doc, score) in docs {
                writeln!(out, "{}\t0\t{}\t{}", topic, doc, score)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> QRels {
        QRels::from_judgements(vec![
            ("t1", vec![("d1", 1.0), ("d2", 0.0), ("d3", 2.0), ("d4", 0.5)]),
            ("t2", vec![("d9", -1.0)]),
        ])
    }

    #[test]
    fn test_relevance_predicate_uses_threshold() {
        let q = sample();
        assert!(q.is_relevant("t1", "d1"));
        assert!(q.is_relevant("t1", "d3"));
        assert!(!q.is_relevant("t1", "d2"));
        assert!(!q.is_relevant("t1", "d4"), "probabilities are not relevant");
        assert!(!q.is_relevant("t1", "missing"));
        assert!(!q.is_relevant("t3", "d1"));
    }

    #[test]
    fn test_counts_and_sets() {
        let q = sample();
        assert_eq!(q.n_relevant("t1"), 2);
        assert_eq!(q.n_relevant("t2"), 0);
        assert_eq!(q.n_relevant("zzz"), 0);
        let rel: Vec<&str> = q.all_relevants("t1").unwrap().into_iter().collect();
        assert_eq!(rel, vec!["d1", "d3"]);
        assert!(matches!(q.all_relevants("zzz"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_relevance_scores_default() {
        let q = sample();
        assert_eq!(q.relevance_score("t1", "d3"), Some(2.0));
        assert_eq!(q.relevance_score("t1", "nope"), None);
        assert_eq!(
            q.relevance_scores("t1", ["d3", "nope", "d2"], 0.0),
            vec![2.0, 0.0, 0.0]
        );
        assert_eq!(q.relevance_scores("zzz", ["a"], -1.0), vec![-1.0]);
    }

    #[test]
    fn test_doc_ids_union() {
        let q = sample();
        let ids: Vec<&str> = q.doc_ids().into_iter().collect();
        assert_eq!(ids, vec!["d1", "d2", "d3", "d4", "d9"]);
    }

    #[test]
    fn test_judgement_classify() {
        assert_eq!(Judgement::classify(-1.0), Judgement::Unjudged);
        assert_eq!(Judgement::classify(0.0), Judgement::NotRelevant);
        assert_eq!(Judgement::classify(0.3), Judgement::Probable);
        assert_eq!(Judgement::classify(1.0), Judgement::Relevant);
        assert_eq!(Judgement::classify(3.0), Judgement::Relevant);
    }

    #[test]
    fn test_parse_and_write() {
        let data = "t1\t0\td1\t1\nt1\t0\td2\t0\n\nt2\t0\td3\t2.5\textra\n";
        let q = QRels::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(q.n_topics(), 2);
        assert_eq!(q.relevance_score("t2", "d3"), Some(2.5));

        let mut out = Vec::new();
        q.write(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "t1\t0\td1\t1\nt1\t0\td2\t0\nt2\t0\td3\t2.5\n"
        );
    }

    #[test]
    fn test_parse_rejects_short_line() {
        let err = QRels::from_reader(Cursor::new("t1\t0\td1\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }
}
