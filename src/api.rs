//! Blocking transport for the post **search service**.
//!
//! The service exposes a single `GET /search` endpoint. The canonical contract used by
//! this crate is `?q=<topic>&n=<max results>&upvotes_min=<min upvotes>`; filtering by
//! upvotes and capping `n` both happen server-side.
//!
//! ### Notes
//! - A JSON body with a top-level `error` field is a failure even on HTTP 200.
//! - No retries: a failed search is retried by the user issuing a new one.
//! - There is no timeout unless `Config::timeout` sets one.
//!
//! Typical usage:
//! ```no_run
//! # use cra_rs::{Config, HttpTransport, Transport};
//! let transport = HttpTransport::new(&Config::from_env())?;
//! let query = cra_rs::query::build("Bitcoin", Some("5"), None)?;
//! let payload = transport.fetch(&query)?;
//! println!("{} posts", payload.posts.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::aggregate;
use crate::config::Config;
use crate::error::SearchError;
use crate::models::{RawPayload, ResultPayload};
use crate::query::QueryDescriptor;
use anyhow::{Context, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::time::Duration;

/// Anything that can answer a search query with a payload.
///
/// `SearchClient` runs `fetch` on a worker thread, hence `Send + Sync`.
pub trait Transport: Send + Sync + 'static {
    fn fetch(&self, query: &QueryDescriptor) -> Result<ResultPayload, SearchError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    pub endpoint: String,
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout) // None = wait forever
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("cra_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('?').to_string(),
            http,
        })
    }

    /// Full request URL for `query`.
    pub fn url_for(&self, query: &QueryDescriptor) -> String {
        let sep = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.endpoint, sep, encode_pairs(&query.query_pairs()))
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, query: &QueryDescriptor) -> Result<ResultPayload, SearchError> {
        let url = self.url_for(query);
        log::debug!("GET {url}");

        let resp = self
            .http
            .get(&url)
            .send()
            .map_err(|e| SearchError::Transport(format!("network error: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::Transport(format!(
                "HTTP error! status: {}",
                status.as_u16()
            )));
        }
        let body = resp
            .text()
            .map_err(|e| SearchError::Transport(format!("read body: {e}")))?;
        parse_payload(&body)
    }
}

// Unreserved characters stay as-is; everything else (spaces, '&', '#', non-ASCII) is escaped.
const QUERY_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode_pairs(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                k,
                percent_encoding::utf8_percent_encode(v, QUERY_SAFE)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Decode a response body into a normalized payload.
///
/// ### Errors
/// `SearchError::Protocol` when the body is not a JSON object, carries a truthy
/// top-level `error`, or `posts` cannot be decoded.
pub fn parse_payload(body: &str) -> Result<ResultPayload, SearchError> {
    let v: Value = serde_json::from_str(body)
        .map_err(|e| SearchError::Protocol(format!("decode json: {e}")))?;
    let obj = v.as_object().ok_or_else(|| {
        SearchError::Protocol("unexpected response shape: not a JSON object".to_string())
    })?;

    if let Some(err) = obj.get("error") {
        match err {
            Value::Null | Value::Bool(false) => {}
            Value::String(s) if s.is_empty() => {}
            Value::String(s) => return Err(SearchError::Protocol(s.clone())),
            other => return Err(SearchError::Protocol(other.to_string())),
        }
    }

    let raw: RawPayload = serde_json::from_value(v)
        .map_err(|e| SearchError::Protocol(format!("parse payload: {e}")))?;
    Ok(aggregate::normalize(raw))
}
