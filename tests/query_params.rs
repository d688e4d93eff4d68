use cra_rs::query::{self, DEFAULT_MAX_RESULTS, DEFAULT_MIN_UPVOTES};
use cra_rs::{QueryParams, SearchError};

#[test]
fn blank_topic_is_rejected() {
    for raw in ["", "   ", "\t\n"] {
        let err = query::build(raw, Some("5"), Some("0")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Please enter a cryptocurrency");
    }
}

#[test]
fn topic_is_trimmed() {
    let q = query::build("  Ethereum  ", None, None).unwrap();
    assert_eq!(q.topic(), "Ethereum");
}

#[test]
fn invalid_or_non_positive_numbers_fall_back_to_defaults() {
    for raw in [None, Some(""), Some("abc"), Some("0"), Some("-3")] {
        let q = query::build("Bitcoin", raw, raw).unwrap();
        assert_eq!(q.max_results(), DEFAULT_MAX_RESULTS);
        assert_eq!(q.min_upvotes(), DEFAULT_MIN_UPVOTES);
    }
}

#[test]
fn valid_numbers_are_kept_and_decimals_truncated() {
    let q = query::build("Solana", Some("12"), Some("250.9")).unwrap();
    assert_eq!(q.max_results(), 12);
    assert_eq!(q.min_upvotes(), 250);
}

#[test]
fn query_pairs_follow_the_service_contract() {
    let q = query::build("Bitcoin ETF", Some("3"), Some("10")).unwrap();
    let pairs = q.query_pairs();
    assert_eq!(pairs[0], ("q", "Bitcoin ETF".to_string()));
    assert_eq!(pairs[1], ("n", "3".to_string()));
    assert_eq!(pairs[2], ("upvotes_min", "10".to_string()));
}

#[test]
fn query_params_builder_matches_free_function() {
    let mut params = QueryParams::new("Cardano");
    params.max_results = "7".into();
    params.min_upvotes = "x".into();
    let q = params.build().unwrap();
    assert_eq!(q, query::build("Cardano", Some("7"), Some("x")).unwrap());

    let err = QueryParams::new(" ").build().unwrap_err();
    assert!(matches!(err, SearchError::Validation(_)));
}

#[test]
fn deserialized_descriptor_is_validated_like_form_input() {
    let blank = serde_json::from_str::<query::QueryDescriptor>(
        r#"{"topic":"   ","max_results":0,"min_upvotes":0}"#,
    );
    assert!(blank.is_err());

    let q: query::QueryDescriptor =
        serde_json::from_str(r#"{"topic":" Dogecoin ","max_results":0,"min_upvotes":-4}"#).unwrap();
    assert_eq!(q.topic(), "Dogecoin");
    assert_eq!(q.max_results(), DEFAULT_MAX_RESULTS);
    assert_eq!(q.min_upvotes(), DEFAULT_MIN_UPVOTES);

    let stored = serde_json::to_string(&query::build("Solana", Some("8"), Some("20")).unwrap()).unwrap();
    let back: query::QueryDescriptor = serde_json::from_str(&stored).unwrap();
    assert_eq!(back.max_results(), 8);
    assert_eq!(back.min_upvotes(), 20);
}
