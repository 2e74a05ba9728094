//! Comparing runs and serializing results.

use serde_json::json;
use treval::eval::stats::{independent_t_test, kendall_tau, paired_t_test};
use treval::eval::{
    difference_with, evaluate_runs, rank_runs, rank_similarity, significance_test,
    significance_with_config, EvalConfig, Evaluation, Metric, MetricRegistry, MetricSet,
    RunEvaluation, TestKind,
};
use treval::{Error, QRels, Run, RunEntry};

fn qrels() -> QRels {
    QRels::from_judgements(
        (1..=4).map(|t| (format!("t{}", t), vec![("rel".to_string(), 1.0)])),
    )
}

/// One run: for each topic, the relevant doc at the given 1-based rank.
fn system(name: &str, ranks: [usize; 4]) -> Run {
    Run::from_entries(
        name,
        ranks.iter().enumerate().map(|(t, &rank)| {
            let entries = (1..=rank)
                .map(|i| {
                    let doc = if i == rank { "rel".to_string() } else { format!("junk{}", i) };
                    RunEntry::new(doc, 100.0 - i as f64)
                })
                .collect::<Vec<_>>();
            (format!("t{}", t + 1), entries)
        }),
    )
}

fn systems() -> Vec<Run> {
    vec![
        system("strong", [1, 1, 1, 2]),
        system("weak", [3, 4, 2, 5]),
        system("medium", [1, 2, 2, 2]),
    ]
}

#[test]
fn test_evaluation_json_shape() {
    let eval = Metric::AveragePrecision
        .evaluate(&system("s", [1, 2, 1, 1]), &qrels())
        .unwrap();
    let value = serde_json::to_value(&eval).unwrap();
    assert_eq!(
        value,
        json!({
            "score": 0.875,
            "details": {"t1": 1.0, "t2": 0.5, "t3": 1.0, "t4": 1.0}
        })
    );
    let back: Evaluation = serde_json::from_value(value).unwrap();
    assert_eq!(back, eval);
}

#[test]
fn test_run_evaluations_serialize_with_metric_names() {
    let runs = systems();
    let measures =
        MetricSet::new("report", vec![Metric::AveragePrecision, Metric::precision_at(1)]);
    let results = evaluate_runs(&runs, &qrels(), &measures).unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].run, "strong");
    assert_eq!(results[0].score_of("P@1"), Some(0.75));

    let text = serde_json::to_string(&results).unwrap();
    let back: Vec<RunEvaluation> = serde_json::from_str(&text).unwrap();
    assert_eq!(back, results);
    assert!(text.contains("\"metric\":\"P@1\""));
}

#[test]
fn test_metric_serializes_as_short_name() {
    assert_eq!(serde_json::to_string(&Metric::precision_at(10)).unwrap(), "\"P@10\"");
    let parsed: Vec<Metric> = serde_json::from_str(r#"["map", "ndcg", "F1_clustering"]"#).unwrap();
    assert_eq!(parsed, vec![Metric::AveragePrecision, Metric::Ndcg, Metric::f_clustering(1.0)]);
    assert!(serde_json::from_str::<Metric>("\"bogus\"").is_err());
}

#[test]
fn test_registry_resolves_config_names() {
    let registry = MetricRegistry::with_standard_metrics();
    let set = registry.resolve(["map", "P@10", "purity"]).unwrap();
    assert_eq!(set.names(), vec!["map", "P@10", "purity"]);

    let err = registry.resolve(["map", "P@7"]).unwrap_err();
    assert!(matches!(err, Error::UnknownMetric(ref name) if name == "P@7"));
}

#[test]
fn test_ranking_and_rank_correlation() {
    let runs = systems();
    let q = qrels();

    let by_map = rank_runs(&runs, &q, &Metric::AveragePrecision).unwrap();
    let names: Vec<&str> = by_map.iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["strong", "medium", "weak"]);

    let by_ndcg = rank_runs(&runs, &q, &Metric::Ndcg).unwrap();
    let agreement = rank_similarity(&by_map, &by_ndcg).unwrap();
    assert_eq!(agreement.tau, 1.0);
    // n = 3, no discordant pair: 2 * 1/6
    assert!((agreement.p_value - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_significance_against_reference() {
    let runs = systems();
    let config =
        EvalConfig::from_toml_str("metrics = [\"map\"]\nsignificance = \"independent\"\n")
            .unwrap();
    let metric = &config.metrics[0];

    let q = qrels();
    let paired = significance_test(&runs[0], &runs[1..], &q, metric, TestKind::Paired).unwrap();
    let independent =
        significance_test(&runs[0], &runs[1..], &q, metric, config.significance).unwrap();

    assert_eq!(paired.keys().collect::<Vec<_>>(), vec!["medium", "weak"]);
    assert!(paired["weak"] < 0.05, "p = {}", paired["weak"]);
    assert!(paired["medium"] > paired["weak"]);
    assert!(independent["weak"] < 0.05);
}

#[test]
fn test_configured_test_kind_changes_p_values() {
    let runs = systems();
    let q = qrels();
    let paired = EvalConfig::from_toml_str("significance = \"paired\"").unwrap();
    let independent = EvalConfig::from_toml_str("significance = \"independent\"").unwrap();
    let metric = Metric::AveragePrecision;

    let p_paired = significance_with_config(&runs[0], &runs[1..], &q, &metric, &paired).unwrap();
    let p_independent =
        significance_with_config(&runs[0], &runs[1..], &q, &metric, &independent).unwrap();
    assert_eq!(
        p_paired,
        significance_test(&runs[0], &runs[1..], &q, &metric, TestKind::Paired).unwrap()
    );
    assert_ne!(p_paired["weak"], p_independent["weak"]);
}

#[test]
fn test_rank_runs_by_multi_label_metric() {
    let q = QRels::from_judgements(vec![
        ("doc1", vec![("sports", 1.0)]),
        ("doc2", vec![("news", 1.0), ("politics", 1.0)]),
    ]);
    fn labels(tags: &[&str]) -> Vec<RunEntry> {
        tags.iter().map(|t| RunEntry::new(*t, 1.0)).collect()
    }
    fn tagger(name: &str, doc1: &[&str], doc2: &[&str]) -> Run {
        Run::from_entries(name, vec![("doc1", labels(doc1)), ("doc2", labels(doc2))])
    }
    let runs = vec![
        tagger("loose", &["sports", "news"], &["news"]),
        tagger("exact", &["sports"], &["news", "politics"]),
    ];
    let config = EvalConfig::from_toml_str("metrics = [\"exact_match_ratio\"]").unwrap();
    let ranked = rank_runs(&runs, &q, &config.metrics[0]).unwrap();
    assert_eq!(ranked[0].name(), "exact");
    assert_eq!(ranked[0].score, 1.0);
    assert_eq!(ranked[1].score, 0.0);
}

#[test]
fn test_difference_with_reference() {
    let runs = systems();
    let diffs = difference_with(&runs[0], &runs[1..], &qrels(), &Metric::precision_at(1)).unwrap();
    let medium = &diffs["medium"];
    assert_eq!(medium["t1"], 0.0);
    assert_eq!(medium["t2"], -1.0);
    assert_eq!(medium["t4"], 0.0);
    assert_eq!(diffs["weak"].values().sum::<f64>(), -3.0);
}

#[test]
fn test_paired_t_test_reference_values() {
    let a = [0.5, 0.6, 0.7, 0.8];
    let b = [0.4, 0.6, 0.5, 0.6];
    let result = paired_t_test(&a, &b).unwrap();
    // differences 0.1, 0, 0.2, 0.2: mean 0.125, sd sqrt(0.0275 / 3)
    let expected_t = 0.125 / ((0.0275 / 3.0) / 4.0f64).sqrt();
    assert!((result.t_statistic - expected_t).abs() < 1e-9);
    assert_eq!(result.df, 3.0);
    // between the two-sided 10% (2.353) and 5% (3.182) critical values
    assert!(result.p_value > 0.05 && result.p_value < 0.10, "p = {}", result.p_value);
    assert!(!result.significant(0.05));
    assert!(result.significant(0.1));
}

#[test]
fn test_independent_t_test_identical_samples() {
    let result = independent_t_test(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(result.t_statistic, 0.0);
    assert!((result.p_value - 1.0).abs() < 1e-12);
}

#[test]
fn test_kendall_exact_small_sample() {
    let x = [1.0, 2.0, 3.0, 4.0, 5.0];
    let y = [3.0, 1.0, 2.0, 5.0, 4.0];
    let result = kendall_tau(&x, &y).unwrap();
    // 7 concordant, 3 discordant
    assert!((result.tau - 0.4).abs() < 1e-12);
    // permutations of 5 with <= 3 inversions: 1 + 4 + 9 + 15 = 29
    assert!((result.p_value - 2.0 * 29.0 / 120.0).abs() < 1e-12);
}

#[test]
fn test_kendall_ties_use_tau_b() {
    let x = [1.0, 1.0, 2.0, 3.0];
    let y = [1.0, 2.0, 3.0, 4.0];
    let result = kendall_tau(&x, &y).unwrap();
    // 5 concordant pairs, one tied in x: 5 / sqrt(5 * 6)
    assert!((result.tau - 5.0 / 30.0f64.sqrt()).abs() < 1e-12);
    assert!(result.p_value > 0.0 && result.p_value < 1.0);
}
