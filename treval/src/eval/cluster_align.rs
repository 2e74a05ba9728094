//! Aligning two clusterings by Jaccard overlap.
//!
//! Used to compare the output of two clustering runs (or a run against a
//! reference clustering): every cluster of the first partition is matched to
//! the cluster of the second that shares the largest fraction of members.

use crate::{Error, Result, Run};
use std::collections::{BTreeMap, BTreeSet};

/// Clusters of a run: `cluster id -> member items`.
pub type Clusters = BTreeMap<String, BTreeSet<String>>;

/// Group the items of a clustering run by their top entry.
///
/// Items with an empty entry list belong to no cluster.
#[must_use]
pub fn clusters_of(run: &Run) -> Clusters {
    let mut clusters = Clusters::new();
    for (item, entries) in run.entries() {
        if let Some(top) = entries.first() {
            clusters
                .entry(top.doc_id.clone())
                .or_default()
                .insert(item.clone());
        }
    }
    clusters
}

/// `|a ∩ b| / |a ∪ b|`; two empty sets are identical (1.0).
#[must_use]
pub fn jaccard_index<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 1.0;
    }
    intersection as f64 / union as f64
}

/// Best-overlapping cluster of `clusters` for `cluster`, as `(jaccard, id)`.
///
/// Ties go to the smallest cluster id. `None` when `clusters` is empty.
#[must_use]
pub fn max_jaccard<'a>(
    cluster: &BTreeSet<String>,
    clusters: &'a Clusters,
) -> Option<(f64, &'a str)> {
    let mut best: Option<(f64, &str)> = None;
    for (id, members) in clusters {
        let j = jaccard_index(cluster, members);
        if best.map_or(true, |(b, _)| j > b) {
            best = Some((j, id.as_str()));
        }
    }
    best
}

/// Match every cluster of `first` to its best cluster in `second`.
///
/// Returns `first id -> (second id, jaccard)`.
///
/// # Errors
///
/// [`Error::InvalidInput`] when `second` is empty and `first` is not.
pub fn jaccard_map(first: &Clusters, second: &Clusters) -> Result<BTreeMap<String, (String, f64)>> {
    first
        .iter()
        .map(|(id, members)| {
            let (j, best) = max_jaccard(members, second).ok_or_else(|| {
                Error::invalid_input(format!("no cluster to align '{}' with", id))
            })?;
            Ok((id.clone(), (best.to_string(), j)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RunEntry;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn clustering(name: &str, items: &[(&str, &str)]) -> Run {
        Run::from_entries(
            name,
            items
                .iter()
                .map(|(item, cluster)| (item.to_string(), vec![RunEntry::new(*cluster, 1.0)])),
        )
    }

    #[test]
    fn test_clusters_of_skips_empty_items() {
        let mut run = clustering("r", &[("i1", "a"), ("i2", "a"), ("i3", "b")]);
        let run2 = Run::from_entries(
            "r",
            run.entries()
                .clone()
                .into_iter()
                .chain(std::iter::once(("i4".to_string(), Vec::new()))),
        );
        run.remove_entries("i3");
        assert_eq!(clusters_of(&run).len(), 1);

        let clusters = clusters_of(&run2);
        assert_eq!(clusters["a"], set(&["i1", "i2"]));
        assert_eq!(clusters["b"], set(&["i3"]));
        assert_eq!(clusters.values().map(BTreeSet::len).sum::<usize>(), 3);
    }

    #[test]
    fn test_jaccard_index() {
        assert!((jaccard_index(&set(&["a", "b"]), &set(&["b", "c"])) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(jaccard_index(&set(&["a"]), &set(&["a"])), 1.0);
        assert_eq!(jaccard_index(&set(&["a"]), &set(&["b"])), 0.0);
        assert_eq!(jaccard_index(&set(&[]), &set(&[])), 1.0);
    }

    #[test]
    fn test_max_jaccard_ties_smallest_id() {
        let mut clusters = Clusters::new();
        clusters.insert("z".into(), set(&["a"]));
        clusters.insert("m".into(), set(&["b"]));
        let (j, id) = max_jaccard(&set(&["a", "b"]), &clusters).unwrap();
        assert_eq!(id, "m");
        assert!((j - 0.5).abs() < 1e-12);
        assert!(max_jaccard(&set(&["a"]), &Clusters::new()).is_none());
    }

    #[test]
    fn test_jaccard_map() {
        let first = clusters_of(&clustering("a", &[("i1", "x"), ("i2", "x"), ("i3", "y")]));
        let second = clusters_of(&clustering("b", &[("i1", "p"), ("i2", "q"), ("i3", "q")]));
        let map = jaccard_map(&first, &second).unwrap();
        assert_eq!(map["x"].0, "p");
        assert!((map["x"].1 - 0.5).abs() < 1e-12);
        assert_eq!(map["y"].0, "q");
        assert!((map["y"].1 - 0.5).abs() < 1e-12);

        assert!(jaccard_map(&first, &Clusters::new()).is_err());
        assert!(jaccard_map(&Clusters::new(), &Clusters::new()).unwrap().is_empty());
    }
}
