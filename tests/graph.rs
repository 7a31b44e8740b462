#[path = "common/mod.rs"]
mod common;

use debatenet::{
    affiliations, build_user_graph, busiest_year, centrality, dominant_topics, fit_lda, fruchterman_reingold,
    select_active, tokenize_threads, ActivityBand, Affiliation, BipartiteGraph, Comment, DocTermMatrix, LayoutConfig,
    LdaConfig, LdaModel, Lexicon, Thread,
};
use std::collections::BTreeMap;

fn aff(user: &str, thread: &str) -> Affiliation {
    Affiliation { user: user.to_string(), thread: thread.to_string(), year: 2015 }
}

fn comment(id: &str, thread: &str, author: &str, year: i32) -> Comment {
    Comment { id: id.to_string(), thread: thread.to_string(), author: author.to_string(), timestamp: 0, year }
}

fn doc(id: &str, text: &str) -> Thread {
    Thread {
        id: id.to_string(),
        title: String::new(),
        text: text.to_string(),
        timestamp: common::TS_2015,
        year: 2015,
        month: 4,
        week: 17,
        ups: 50,
        downs: 0,
        author: "op".to_string(),
        unique_commenters: 20,
    }
}

fn two_topic_model() -> (Vec<Thread>, LdaModel) {
    let docs = vec![
        doc("A", "apple banana cherry apple cherry banana apple"),
        doc("B", "engine piston turbine engine turbine piston engine"),
    ];
    let lex = Lexicon::builtin().unwrap();
    let dtm = DocTermMatrix::from_tokens(&tokenize_threads(&docs, &lex, 0.0)).unwrap();
    let model = fit_lda(&dtm, &LdaConfig { num_topics: 2, progress: false, ..LdaConfig::default() }).unwrap();
    (docs, model)
}

/// X and Y both comment on T1 and T2, Z only on T3.
/// Outcome: edge (X, Y) has weight 2 and Z is isolated.
#[test]
fn projection_counts_shared_threads() {
    let a = vec![aff("x", "T1"), aff("x", "T2"), aff("y", "T1"), aff("y", "T2"), aff("z", "T3")];
    let bip = BipartiteGraph::build(&a);
    assert_eq!(bip.graph.node_count(), 6);
    assert_eq!(bip.graph.edge_count(), 5);

    let pg = bip.project(&BTreeMap::new());
    assert_eq!(pg.weight("x", "y"), Some(2));
    assert_eq!(pg.weight("y", "x"), Some(2));
    assert_eq!(pg.weight("x", "z"), None);
    assert_eq!(pg.weight("y", "z"), None);
    assert_eq!(pg.graph.edge_count(), 1);
    assert_eq!(pg.graph.neighbors(pg.index["z"]).count(), 0);
}

/// The co-membership matrix counts each user's threads on its diagonal;
/// the projected matrix is symmetric with a zero diagonal.
#[test]
fn projected_matrix_is_symmetric_without_self_loops() {
    let a = vec![aff("x", "T1"), aff("x", "T2"), aff("y", "T2"), aff("y", "T3"), aff("z", "T3"), aff("z", "T1")];
    let bip = BipartiteGraph::build(&a);
    let raw = bip.co_membership();
    assert_eq!((raw[0][0], raw[1][1], raw[2][2]), (2, 2, 2));

    let pg = bip.project(&BTreeMap::new());
    let n = pg.matrix.len();
    for i in 0..n {
        assert_eq!(pg.matrix[i][i], 0);
        for j in 0..n {
            assert_eq!(pg.matrix[i][j], pg.matrix[j][i]);
        }
    }
    assert_eq!(pg.graph.edge_count(), 3);
}

/// Affiliations come only from sampled threads and are unique per (user, thread),
/// with case-insensitive user names.
#[test]
fn affiliations_follow_sampled_threads() {
    let sampled = vec![doc("A", "x"), doc("B", "y")];
    let comments = vec![
        comment("1", "A", "Ann", 2015),
        comment("2", "A", "ann", 2015),
        comment("3", "B", "ann", 2015),
        comment("4", "C", "ann", 2015),
    ];
    let a = affiliations(&comments, &sampled);
    assert_eq!(a, vec![aff("ann", "A"), aff("ann", "B")]);
}

/// Activity year and band:
/// - 2016 rows outnumber 2015 rows, so 2016 is chosen; on a tie the earlier year wins.
/// - only users with a yearly count strictly inside the band stay.
#[test]
fn activity_year_and_band() {
    let mut a = Vec::new();
    for t in 0..7 {
        a.push(Affiliation { user: "busy".into(), thread: format!("T{t}"), year: 2016 });
    }
    for t in 0..6 {
        a.push(Affiliation { user: "six".into(), thread: format!("T{t}"), year: 2016 });
    }
    for t in 0..3 {
        a.push(Affiliation { user: "old".into(), thread: format!("T{t}"), year: 2015 });
    }
    assert_eq!(busiest_year(&a), Some(2016));
    assert_eq!(busiest_year(&[]), None);
    let tie = vec![
        Affiliation { user: "u".into(), thread: "a".into(), year: 2017 },
        Affiliation { user: "u".into(), thread: "b".into(), year: 2014 },
    ];
    assert_eq!(busiest_year(&tie), Some(2014));

    let active = select_active(&a, 2016, ActivityBand::default());
    assert_eq!(active.len(), 7);
    assert!(active.iter().all(|x| x.user == "busy"));

    let wide = select_active(&a, 2016, ActivityBand { min_exclusive: 5, max_exclusive: 7 });
    assert!(wide.iter().all(|x| x.user == "six"));
}

/// Dominant topic is the topic with the highest mean membership over a user's
/// modelled threads; users on unmodelled threads get none.
#[test]
fn dominant_topic_per_user() {
    let (_, model) = two_topic_model();
    let a = vec![aff("fruit_fan", "A"), aff("gearhead", "B"), aff("ghost", "unmodelled")];
    let dom = dominant_topics(&a, &model);

    let argmax = |id: &str| {
        let g = model.membership(id).unwrap();
        if g[0] >= g[1] { 1 } else { 2 }
    };
    assert_eq!(dom["fruit_fan"].topic, argmax("A"));
    assert_eq!(dom["gearhead"].topic, argmax("B"));
    assert_ne!(dom["fruit_fan"].topic, dom["gearhead"].topic);
    assert!(!dom.contains_key("ghost"));
}

/// A user graph where no one falls inside the activity band is an error.
#[test]
fn empty_band_is_an_error() {
    let (docs, model) = two_topic_model();
    let comments = vec![comment("1", "A", "solo", 2015), comment("2", "B", "solo", 2015)];
    let err = build_user_graph(&comments, &docs, &model, None, ActivityBand::default()).unwrap_err();
    assert!(err.to_string().contains("2015"), "{err}");

    let (pg, year) = build_user_graph(&comments, &docs, &model, Some(2015), ActivityBand { min_exclusive: 1, max_exclusive: 3 }).unwrap();
    assert_eq!(year, 2015);
    assert_eq!(pg.node_count(), 1);
    assert!(pg.graph[pg.index["solo"]].dominant_topic.is_some());
}

/// Path a - b - c with unit weights.
/// Outcome: b carries all betweenness, closeness is reachable / total distance,
/// eigenvector centrality is (1/sqrt 2, 1, 1/sqrt 2).
#[test]
fn centrality_on_a_path() {
    let pg = BipartiteGraph::build(&[aff("a", "t1"), aff("b", "t1"), aff("b", "t2"), aff("c", "t2")])
        .project(&BTreeMap::new());
    let recs = centrality(&pg);
    let by: BTreeMap<&str, _> = recs.iter().map(|r| (r.user.as_str(), r)).collect();

    assert_eq!((by["a"].degree, by["b"].degree, by["c"].degree), (1, 2, 1));
    assert_eq!(by["b"].strength, 2);
    assert!((by["b"].betweenness - 1.0).abs() < 1e-9);
    assert!(by["a"].betweenness.abs() < 1e-9);
    assert!((by["b"].closeness - 1.0).abs() < 1e-9);
    assert!((by["a"].closeness - 2.0 / 3.0).abs() < 1e-9);
    assert!((by["b"].eigenvector - 1.0).abs() < 1e-6);
    assert!((by["a"].eigenvector - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    assert!((by["c"].eigenvector - by["a"].eigenvector).abs() < 1e-9);
}

/// Weighted shortest paths use distance 1 / weight:
/// a-b and b-c share 4 threads, a-c shares 1, so a reaches c more cheaply through b.
#[test]
fn betweenness_uses_inverse_weight_distance() {
    let mut a = Vec::new();
    for t in 0..4 {
        a.push(aff("a", &format!("ab{t}")));
        a.push(aff("b", &format!("ab{t}")));
        a.push(aff("b", &format!("bc{t}")));
        a.push(aff("c", &format!("bc{t}")));
    }
    a.push(aff("a", "ac"));
    a.push(aff("c", "ac"));
    let pg = BipartiteGraph::build(&a).project(&BTreeMap::new());
    assert_eq!(pg.weight("a", "c"), Some(1));
    let recs = centrality(&pg);
    let b = recs.iter().find(|r| r.user == "b").unwrap();
    assert!((b.betweenness - 1.0).abs() < 1e-9);
    assert_eq!(b.strength, 8);
}

/// An isolated user has zero closeness and betweenness; the layout is deterministic
/// for a fixed seed and stays inside the unit square.
#[test]
fn isolated_users_and_layout() {
    let pg = BipartiteGraph::build(&[aff("x", "t1"), aff("y", "t1"), aff("z", "t2")]).project(&BTreeMap::new());
    let recs = centrality(&pg);
    let z = recs.iter().find(|r| r.user == "z").unwrap();
    assert_eq!((z.degree, z.closeness, z.betweenness), (0, 0.0, 0.0));

    let cfg = LayoutConfig { seed: 7, iterations: 50, progress: false };
    let p1 = fruchterman_reingold(&pg, &cfg);
    let p2 = fruchterman_reingold(&pg, &cfg);
    assert_eq!(p1, p2);
    assert_eq!(p1.len(), 3);
    assert!(p1.iter().all(|&(x, y)| (0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y)));
}
