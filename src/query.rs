//! Turning form input into a request descriptor.
//!
//! Numeric fields are permissive on purpose: a blank or garbled "posts" box
//! falls back to the default instead of blocking the search. Only the topic is
//! mandatory.

use crate::error::SearchError;
use serde::{Deserialize, Serialize};

/// Number of posts requested when the field is blank or not a positive number.
pub const DEFAULT_MAX_RESULTS: u32 = 5;
/// Upvote floor used when the field is blank or not a positive number.
pub const DEFAULT_MIN_UPVOTES: u32 = 0;

/// Canonical, validated search request. Built per search and never changed afterwards.
///
/// Deserializing goes through [`build`], so a stored descriptor obeys the same rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredDescriptor")]
pub struct QueryDescriptor {
    topic: String,
    max_results: u32,
    min_upvotes: u32,
}

#[derive(Deserialize)]
struct StoredDescriptor {
    topic: String,
    max_results: i64,
    min_upvotes: i64,
}

impl TryFrom<StoredDescriptor> for QueryDescriptor {
    type Error = SearchError;

    fn try_from(s: StoredDescriptor) -> Result<Self, Self::Error> {
        build(
            &s.topic,
            Some(s.max_results.to_string().as_str()),
            Some(s.min_upvotes.to_string().as_str()),
        )
    }
}

impl QueryDescriptor {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    pub fn min_upvotes(&self) -> u32 {
        self.min_upvotes
    }

    /// Wire parameters in contract order: `q`, `n`, `upvotes_min`.
    pub fn query_pairs(&self) -> [(&'static str, String); 3] {
        [
            ("q", self.topic.clone()),
            ("n", self.max_results.to_string()),
            ("upvotes_min", self.min_upvotes.to_string()),
        ]
    }
}

/// Raw form fields exactly as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub topic: String,
    pub max_results: String,
    pub min_upvotes: String,
}

impl QueryParams {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            max_results: DEFAULT_MAX_RESULTS.to_string(),
            min_upvotes: DEFAULT_MIN_UPVOTES.to_string(),
        }
    }

    pub fn build(&self) -> Result<QueryDescriptor, SearchError> {
        build(
            &self.topic,
            Some(self.max_results.as_str()),
            Some(self.min_upvotes.as_str()),
        )
    }
}

/// Validate and normalize raw input into a [`QueryDescriptor`].
///
/// ### Errors
/// `SearchError::Validation` when `raw_topic` is empty after trimming.
///
/// ### Example
/// ```
/// # use cra_rs::query::build;
/// let q = build("  Bitcoin ", Some("abc"), None).unwrap();
/// assert_eq!(q.topic(), "Bitcoin");
/// assert_eq!(q.max_results(), 5);
/// assert_eq!(q.min_upvotes(), 0);
/// ```
pub fn build(
    raw_topic: &str,
    raw_max: Option<&str>,
    raw_min: Option<&str>,
) -> Result<QueryDescriptor, SearchError> {
    let topic = raw_topic.trim();
    if topic.is_empty() {
        return Err(SearchError::Validation(
            "Please enter a cryptocurrency".to_string(),
        ));
    }

    let max_results = match coerce_int(raw_max) {
        Some(v) if v >= 1 => v.min(u32::MAX as i64) as u32,
        _ => DEFAULT_MAX_RESULTS,
    };
    let min_upvotes = match coerce_int(raw_min) {
        Some(v) if v >= 1 => v.min(u32::MAX as i64) as u32,
        _ => DEFAULT_MIN_UPVOTES,
    };

    Ok(QueryDescriptor {
        topic: topic.to_string(),
        max_results,
        min_upvotes,
    })
}

/// Parse an integer leniently; decimals are truncated toward zero.
fn coerce_int(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.trunc() as i64)
}
