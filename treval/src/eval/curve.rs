//! Eleven-point interpolated precision/recall curve.

use crate::{Error, QRels, Result, Run};

/// Recall levels of the curve.
pub const RECALL_LEVELS: [f64; 11] = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Interpolated precision of one topic at each of [`RECALL_LEVELS`].
///
/// Walks the ranked list, recording the best precision seen in each recall
/// bucket (`floor(recall * 10)`). A point that lands exactly on a bucket
/// boundary also counts for the bucket below. The result is the right-to-left
/// running maximum, so it never increases with recall.
///
/// A topic absent from the run yields all zeros.
///
/// # Errors
///
/// - [`Error::DivisionByZero`] if the topic has entries but no relevant documents.
/// - [`Error::InvalidInput`] if recall exceeds 1 (duplicate doc ids in the run).
pub fn interpolated_precision(run: &Run, qrels: &QRels, topic: &str) -> Result<[f64; 11]> {
    let entries = run.entries_by(topic);
    let n_relevant = qrels.n_relevant(topic);
    let mut buckets = [0.0f64; 11];

    if !entries.is_empty() && n_relevant == 0 {
        return Err(Error::division_by_zero("interpolated precision", topic));
    }

    let mut retrieved_relevant = 0usize;
    for (i, entry) in entries.iter().enumerate() {
        if qrels.is_relevant(topic, &entry.doc_id) {
            retrieved_relevant += 1;
        }
        let recall = retrieved_relevant as f64 / n_relevant as f64;
        let precision = retrieved_relevant as f64 / (i + 1) as f64;

        let level = (recall * 10.0) as usize;
        if level >= buckets.len() {
            return Err(Error::invalid_input(format!(
                "recall {} > 1 for topic '{}' (duplicate documents?)",
                recall, topic
            )));
        }
        if precision > buckets[level] {
            buckets[level] = precision;
        }
        if level > 0 && recall == level as f64 / 10.0 && buckets[level - 1] < precision {
            buckets[level - 1] = precision;
        }
    }

    let mut envelope = 0.0f64;
    for p in buckets.iter_mut().rev() {
        envelope = envelope.max(*p);
        *p = envelope;
    }
    Ok(buckets)
}

/// Mean interpolated precision over the qrels topics.
///
/// # Errors
///
/// Propagates [`interpolated_precision`] errors; [`Error::DivisionByZero`]
/// for a qrels without topics.
pub fn average_interpolated_precision(run: &Run, qrels: &QRels) -> Result<[f64; 11]> {
    let n_topics = qrels.n_topics();
    if n_topics == 0 {
        return Err(Error::division_by_zero("interpolated precision", "qrels has no topics"));
    }
    let mut sums = [0.0f64; 11];
    for topic in qrels.topic_ids() {
        let curve = interpolated_precision(run, qrels, topic)?;
        for (sum, p) in sums.iter_mut().zip(curve) {
            *sum += p;
        }
    }
    for sum in &mut sums {
        *sum /= n_topics as f64;
    }
    log::debug!("interpolated precision curve of {}: {:?}", run.name(), sums);
    Ok(sums)
}
