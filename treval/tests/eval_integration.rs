//! End-to-end evaluation over TREC files on disk.

use std::fs;
use std::path::Path;
use treval::eval::{
    average_interpolated_precision, keep_qrels_topics, load_all, rank_runs, write_all,
    write_summary, EvalConfig, Metric, MetricSet,
};
use treval::{Error, QRels, Run, RunEntry};

const QRELS: &str = "\
t1\t0\td1\t1\n\
t1\t0\td2\t0\n\
t1\t0\td3\t1\n\
t2\t0\td5\t2\n\
t2\t0\td6\t0\n\
";

const RUN_A: &str = "\
t1\tQ0\td1\t1\t0.9\ta\n\
t1\tQ0\td4\t2\t0.8\ta\n\
t1\tQ0\td3\t3\t0.5\ta\n\
t2\tQ0\td6\t1\t0.7\ta\n\
t2\tQ0\td5\t2\t0.6\ta\n\
";

const RUN_B: &str = "\
t1\tQ0\td4\t1\t0.9\tb\n\
t1\tQ0\td2\t2\t0.8\tb\n\
t2\tQ0\td5\t1\t0.9\tb\n\
t3\tQ0\td9\t1\t0.1\tb\n\
";

fn write_fixture(dir: &Path) -> (QRels, Vec<Run>) {
    let qrels_path = dir.join("qrels.txt");
    fs::write(&qrels_path, QRELS).unwrap();
    let a = dir.join("system_a.trecrun");
    let b = dir.join("system_b.trecrun");
    fs::write(&a, RUN_A).unwrap();
    fs::write(&b, RUN_B).unwrap();

    let qrels = QRels::from_path(&qrels_path).unwrap();
    let runs = load_all([a, b]).unwrap();
    (qrels, runs)
}

#[test]
fn test_worked_example() {
    let qrels = QRels::from_judgements(vec![("t1", vec![("d1", 1.0), ("d2", 0.0), ("d3", 1.0)])]);
    let run = Run::from_entries(
        "example",
        vec![(
            "t1",
            vec![
                RunEntry::from(("d1", 0.9, "")),
                RunEntry::from(("d4", 0.8, "")),
                RunEntry::from(("d3", 0.5, "")),
            ],
        )],
    );

    assert_eq!(Metric::precision_at(1).score(&run, &qrels).unwrap(), 1.0);
    assert_eq!(Metric::Recall.score(&run, &qrels).unwrap(), 1.0);
    let ap = Metric::AveragePrecision.score(&run, &qrels).unwrap();
    assert!((ap - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
    let p = Metric::Precision.score(&run, &qrels).unwrap();
    assert!((p - 2.0 / 3.0).abs() < 1e-12);

    let ndcg = Metric::Ndcg.score(&run, &qrels).unwrap();
    let expected = (1.0 + 1.0 / 3.0f64.log2()) / 2.0;
    assert!((ndcg - expected).abs() < 1e-12);
}

#[test]
fn test_files_load_and_names() {
    let dir = tempfile::tempdir().unwrap();
    let (qrels, runs) = write_fixture(dir.path());
    assert_eq!(qrels.n_topics(), 2);
    assert_eq!(qrels.n_relevant("t2"), 1);
    assert_eq!(runs[0].name(), "system_a");
    assert_eq!(runs[1].name(), "system_b");
    assert_eq!(runs[1].num_topics(), 3);
}

#[test]
fn test_summary_table() {
    let dir = tempfile::tempdir().unwrap();
    let (qrels, runs) = write_fixture(dir.path());

    let measures = MetricSet::new("table", vec![Metric::AveragePrecision, Metric::precision_at(1)]);
    let mut out = Vec::new();
    write_summary(&runs, &qrels, &measures, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "run name\tmap\tP@1");
    // a: t1 AP = 5/6, t2 AP = 1/2 → (5/6 + 1/2) / 2
    let a: Vec<&str> = lines[1].split('\t').collect();
    assert_eq!(a[0], "system_a");
    let map_a: f64 = a[1].parse().unwrap();
    assert!((map_a - (5.0 / 6.0 + 0.5) / 2.0).abs() < 1e-12);
    assert_eq!(a[2], "0.5");
    // b: t1 AP = 0, t2 AP = 1, t3 unjudged (not counted in the denominator)
    assert_eq!(lines[2], "system_b\t0.5\t0.5");
}

#[test]
fn test_missing_topics_penalize_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    let (qrels, runs) = write_fixture(dir.path());
    let only_t1 = Run::from_entries("partial", vec![("t1", runs[0].entries_by("t1").to_vec())]);

    let eval = Metric::AveragePrecision.evaluate(&only_t1, &qrels).unwrap();
    assert_eq!(eval.details.len(), 1);
    assert!((eval.score - (5.0 / 6.0) / 2.0).abs() < 1e-12);
}

#[test]
fn test_keep_qrels_topics_then_precision() {
    let dir = tempfile::tempdir().unwrap();
    let (qrels, runs) = write_fixture(dir.path());

    let kept = keep_qrels_topics(&runs[1], &qrels);
    assert_eq!(kept.name(), "system_b_only_qrels_topics");
    assert!(!kept.contains_topic("t3"));
    // t1: 0/2, t2: 1/1
    assert_eq!(Metric::Precision.score(&kept, &qrels).unwrap(), 0.5);
}

#[test]
fn test_rank_runs_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let (qrels, runs) = write_fixture(dir.path());

    let config_path = dir.path().join("eval.toml");
    fs::write(&config_path, "metrics = [\"map\"]\nsignificance = \"paired\"\n").unwrap();
    let config = EvalConfig::from_path(&config_path).unwrap();

    let ranked = rank_runs(&runs, &qrels, &config.metrics[0]).unwrap();
    assert_eq!(ranked[0].name(), "system_a");
    assert!(ranked[0].score > ranked[1].score);
}

#[test]
fn test_write_all_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let (qrels, runs) = write_fixture(dir.path());
    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();

    let paths = write_all(&runs, &out_dir).unwrap();
    assert_eq!(paths[0].file_name().unwrap(), "system_a");
    let reloaded = load_all(&paths).unwrap();
    for (before, after) in runs.iter().zip(&reloaded) {
        assert_eq!(before.name(), after.name());
        assert_eq!(before.entries(), after.entries());
        assert_eq!(
            Metric::AveragePrecision.score(before, &qrels).unwrap(),
            Metric::AveragePrecision.score(after, &qrels).unwrap()
        );
    }
}

#[test]
fn test_interpolated_curve_over_files() {
    let dir = tempfile::tempdir().unwrap();
    let (qrels, runs) = write_fixture(dir.path());
    let curve = average_interpolated_precision(&runs[0], &qrels).unwrap();
    assert!(curve.windows(2).all(|w| w[0] >= w[1]));
    // t1 starts at P = 1 (d1), t2 at P = 1/2 (d5 at rank 2)
    assert!((curve[0] - 0.75).abs() < 1e-12);
}

#[test]
fn test_bad_run_line_reports_line_number() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.trecrun");
    fs::write(&path, "t1\tQ0\td1\t1\t0.9\tx\nt1\tQ0\td2\t2\n").unwrap();
    let err = load_all([&path]).unwrap_err();
    match err {
        Error::Core(treval_core::Error::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("unexpected error: {}", other),
    }
}
