use cra_rs::eval::{self, EvalReport, EvalSettings};
use cra_rs::query::QueryDescriptor;
use cra_rs::{Post, ResultPayload, SearchError, Transport};
use tempfile::tempdir;

/// Returns posts whose relevance scores depend on the topic.
struct ScoredTransport;

impl Transport for ScoredTransport {
    fn fetch(&self, q: &QueryDescriptor) -> Result<ResultPayload, SearchError> {
        let scores: &[f64] = match q.topic() {
            "bitcoin" => &[0.9, 0.05, 0.4],
            "ethereum" => &[0.01, 0.02],
            "down" => return Err(SearchError::Transport("HTTP error! status: 503".into())),
            _ => &[],
        };
        let posts = scores
            .iter()
            .enumerate()
            .map(|(i, s)| Post {
                id: format!("{i}"),
                title: format!("t{i}"),
                text: String::new(),
                author: "a".into(),
                subreddit: "s".into(),
                flair: None,
                url: String::new(),
                upvotes: 1,
                num_comments: 0,
                relevance_score: *s,
            })
            .collect::<Vec<_>>();
        Ok(ResultPayload {
            query: Some(q.topic().to_string()),
            total_results: posts.len() as u64,
            posts,
        })
    }
}

fn settings(queries: &[&str]) -> EvalSettings {
    EvalSettings {
        queries: queries.iter().map(|q| q.to_string()).collect(),
        ks: vec![1, 3],
        ..EvalSettings::default()
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn defaults_match_published_setup() {
    let s = EvalSettings::default();
    assert_eq!(s.queries.len(), 10);
    assert_eq!(s.ks, vec![1, 3, 5, 10, 15, 20]);
    assert_eq!(s.n_results, 20);
    assert!(close(s.threshold, 0.10));
}

#[test]
fn binarize_uses_inclusive_threshold() {
    assert_eq!(eval::binarize(&[0.1, 0.0999, 0.5], 0.1), vec![1, 0, 1]);
}

#[test]
fn evaluate_aggregates_per_k_and_per_query() {
    let report = eval::evaluate(&ScoredTransport, &settings(&["bitcoin", "ethereum"])).unwrap();

    let btc = &report.per_query["bitcoin"];
    assert_eq!(btc.relevance, vec![1, 0, 1]);
    assert!(close(btc.precision["P@1"], 1.0));
    assert!(close(btc.precision["P@3"], 2.0 / 3.0));
    assert!(close(btc.similarity["Sim@3"], (0.9 + 0.05 + 0.4) / 3.0));

    let eth = &report.per_query["ethereum"];
    assert!(close(eth.precision["P@1"], 0.0));
    assert!(close(eth.similarity["Sim@3"], 0.03 / 3.0));

    assert!(close(report.precision_per_k["P@1"], 0.5));
    assert!(close(report.precision_per_k["P@3"], 1.0 / 3.0));
    assert!(close(report.avg_precision_per_query["bitcoin"], (1.0 + 2.0 / 3.0) / 2.0));
    assert!(close(report.avg_precision_per_query["ethereum"], 0.0));
    assert_eq!(report.queries, vec!["bitcoin", "ethereum"]);
}

#[test]
fn query_without_posts_scores_zero() {
    let report = eval::evaluate(&ScoredTransport, &settings(&["nothing"])).unwrap();
    assert!(close(report.precision_per_k["P@1"], 0.0));
    assert!(close(report.similarity_per_k["Sim@3"], 0.0));
}

#[test]
fn failing_query_stops_the_run() {
    let err = eval::evaluate(&ScoredTransport, &settings(&["bitcoin", "down"])).unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)));
}

#[test]
fn outputs_land_in_directory_and_report_round_trips() {
    let report = eval::evaluate(&ScoredTransport, &settings(&["bitcoin", "ethereum"])).unwrap();
    let dir = tempdir().unwrap();
    let out = dir.path().join("eval");
    let written = eval::write_outputs(&report, &out, 480, 320).unwrap();

    for name in [
        "eval_report.json",
        "precision_at_k.svg",
        "similarity_per_k.svg",
        "avg_precision_per_query.svg",
    ] {
        assert!(written.contains(&out.join(name)), "{name} missing");
    }

    let txt = std::fs::read_to_string(out.join("eval_report.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&txt).unwrap();
    assert_eq!(v["K"], serde_json::json!([1, 3]));
    let back: EvalReport = serde_json::from_str(&txt).unwrap();
    assert_eq!(back.queries, report.queries);
    assert_eq!(back.per_query["bitcoin"].relevance, vec![1, 0, 1]);
}

#[test]
fn repeated_queries_are_scored_and_reported_once() {
    let report =
        eval::evaluate(&ScoredTransport, &settings(&["bitcoin", "ethereum", " bitcoin", "bitcoin"])).unwrap();
    assert_eq!(report.queries, vec!["bitcoin", "ethereum"]);
    assert_eq!(report.per_query.len(), 2);
    assert!(close(report.precision_per_k["P@1"], 0.5));

    let dir = tempdir().unwrap();
    eval::write_outputs(&report, dir.path(), 480, 320).unwrap();
    let svg = std::fs::read_to_string(dir.path().join("avg_precision_per_query.svg")).unwrap();
    assert!(svg.contains("<svg"));
}

/// Decodes a canned service body, so scores pass through payload normalization.
struct WireTransport(&'static str);

impl Transport for WireTransport {
    fn fetch(&self, _q: &QueryDescriptor) -> Result<ResultPayload, SearchError> {
        cra_rs::api::parse_payload(self.0)
    }
}

#[test]
fn similarity_uses_normalized_scores() {
    // Distance-derived scores can fall below zero; they are clamped before scoring.
    let wire = WireTransport(
        r#"{"posts":[{"id":"a","relevance_score":-0.3},{"id":"b","relevance_score":0.2},{"id":"c","relevance_score":1.4}]}"#,
    );
    let report = eval::evaluate(&wire, &settings(&["bitcoin"])).unwrap();
    let btc = &report.per_query["bitcoin"];
    assert_eq!(btc.similarities, vec![0.0, 0.2, 1.0]);
    assert_eq!(btc.relevance, vec![0, 1, 1]);
    assert!(close(btc.similarity["Sim@3"], 1.2 / 3.0));
}
