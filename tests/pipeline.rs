#[path = "common/mod.rs"]
mod common;

use common::*;
use debatenet::DebateAnalysis;
use std::fs;

fn csv_rows(path: &std::path::Path) -> Vec<csv::StringRecord> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    rdr.records().map(|r| r.unwrap()).collect()
}

/// Full run over the eight-thread corpus with charts off and k = 2:
/// - thread authors, AutoModerator and the two-thread lurker never reach the graph.
/// - the 14 regular commenters share all 8 threads, so the graph is complete.
/// Outcome: every report exists and agrees with the returned outcome.
#[test]
fn end_to_end_without_plots() {
    let data = make_pipeline_corpus();
    let out = tempfile::tempdir().unwrap();

    let outcome = DebateAnalysis::new()
        .data_dir(data.path())
        .output_dir(out.path())
        .topics(2)
        .plots(false)
        .progress(false)
        .run()
        .unwrap();

    assert_eq!(outcome.sampled.len(), 8);
    assert_eq!(outcome.model.num_topics(), 2);
    assert_eq!(outcome.activity_year, 2015);
    assert_eq!(outcome.graph.node_count(), 14);
    assert_eq!(outcome.graph.graph.edge_count(), 14 * 13 / 2);

    let names = commenter_names(14);
    for rec in &outcome.centrality {
        assert!(names.contains(&rec.user), "unexpected user {}", rec.user);
        assert_eq!(rec.degree, 13);
        assert_eq!(rec.strength, 13 * 8);
        assert!((rec.eigenvector - 1.0).abs() < 1e-6);
        assert!(rec.dominant_topic.is_some());
    }

    for name in ["vocabulary.csv", "topic_terms.csv", "topic_documents.csv", "centrality.csv", "summary.json"] {
        assert!(out.path().join(name).exists(), "{name} missing");
    }
    assert!(!out.path().join("user_network.png").exists());

    assert_eq!(csv_rows(&out.path().join("topic_terms.csv")).len(), 2 * 10);
    assert_eq!(csv_rows(&out.path().join("topic_documents.csv")).len(), 2 * 5);
    assert_eq!(csv_rows(&out.path().join("centrality.csv")).len(), 14);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["num_topics"], 2);
    assert_eq!(summary["graph_users"], 14);
    assert_eq!(summary["sampled_threads"], 8);
    assert_eq!(summary["cleaning"]["debate_threads"], 8);
}

/// The same run with charts on writes every PNG alongside the reports.
#[test]
fn end_to_end_with_plots() {
    let data = make_pipeline_corpus();
    let out = tempfile::tempdir().unwrap();

    let outcome = DebateAnalysis::new()
        .data_dir(data.path())
        .output_dir(out.path())
        .topics(2)
        .layout(7, 50)
        .progress(false)
        .run()
        .unwrap();

    for name in [
        "upvote_distribution.png",
        "commenter_distribution.png",
        "thread_activity.png",
        "topic_terms.png",
        "topic_preference_density.png",
        "user_network.png",
    ] {
        let path = out.path().join(name);
        let len = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        assert!(len > 0, "{name} missing or empty");
        assert!(outcome.artifacts.iter().any(|a| a.ends_with(name)), "{name} not listed");
    }
    assert!(out.path().join("centrality.csv").exists());
}

/// Two runs over the same input with the same seed produce identical models and reports.
#[test]
fn reruns_are_reproducible() {
    let data = make_pipeline_corpus();
    let out1 = tempfile::tempdir().unwrap();
    let out2 = tempfile::tempdir().unwrap();
    let run = |dir: &std::path::Path| {
        DebateAnalysis::new()
            .data_dir(data.path())
            .output_dir(dir)
            .topics(2)
            .plots(false)
            .progress(false)
            .run()
            .unwrap()
    };
    let a = run(out1.path());
    let b = run(out2.path());
    assert_eq!(a.model.beta, b.model.beta);
    assert_eq!(a.centrality, b.centrality);
    assert_eq!(
        fs::read_to_string(out1.path().join("topic_terms.csv")).unwrap(),
        fs::read_to_string(out2.path().join("topic_terms.csv")).unwrap()
    );
}

/// Thresholds nothing can pass abort the run before any model is fitted.
#[test]
fn unreachable_sample_thresholds_fail() {
    let data = make_pipeline_corpus();
    let out = tempfile::tempdir().unwrap();
    let err = DebateAnalysis::new()
        .data_dir(data.path())
        .output_dir(out.path())
        .sample_thresholds(1000, 11)
        .plots(false)
        .progress(false)
        .run()
        .unwrap_err();
    assert!(err.to_string().contains("nothing to model"), "{err}");
    assert!(!out.path().join("topic_terms.csv").exists());
}
