//! cra_rs
//!
//! Client-side pipeline for the Crypto Reddit Advisor search service: build a
//! query, run it through a single-flight search client, and turn the result into
//! rankings, totals and a chart. Pairs with the `cra` CLI and the `cra-gui` app.
//!
//! ### Features
//! - Validate topic / result count / upvote floor into a `QueryDescriptor`
//! - `SearchClient` state machine (`Idle`, `Loading`, `Success`, `Failed`) that
//!   ignores responses from superseded searches
//! - Pure aggregation: top-10 chart series, upvote/comment totals, text truncation
//! - First-run disclaimer consent, optionally remembered on disk
//! - Export to CSV/JSON, SVG/PNG bar charts, and a Precision@K evaluator
//!
//! ### Example
//! ```no_run
//! use cra_rs::{Config, HttpTransport, SearchClient, SearchState, aggregate};
//!
//! let transport = HttpTransport::new(&Config::from_env())?;
//! let mut client = SearchClient::new(transport);
//! client.search_raw("Bitcoin", Some("5"), Some("0"))?;
//! if let SearchState::Success { payload, .. } = client.wait() {
//!     let view = aggregate::derive_view(payload);
//!     println!("{} upvotes across {} posts", view.total_upvotes, payload.posts.len());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod aggregate;
pub mod api;
pub mod chart;
pub mod client;
pub mod config;
pub mod consent;
pub mod error;
pub mod eval;
pub mod models;
pub mod query;
pub mod storage;

pub use api::{HttpTransport, Transport};
pub use client::{SearchClient, SearchState, Ticket};
pub use config::Config;
pub use consent::{ConsentPreference, ConsentState, FilePreferenceStore, PreferenceStore};
pub use error::SearchError;
pub use models::{ChartPoint, DerivedView, Post, ResultPayload};
pub use query::{QueryDescriptor, QueryParams};
