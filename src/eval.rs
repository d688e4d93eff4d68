//! Retrieval-quality evaluation against a live search service.
//!
//! Each query is sent once; the returned `relevance_score`s are binarized with a
//! similarity threshold and scored as Precision@K. The raw scores give
//! Similarity@K (mean of the top-K scores).

use crate::api::Transport;
use crate::chart::{self, Bar, BarChartStyle};
use crate::error::SearchError;
use crate::query;
use crate::storage;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_THRESHOLD: f64 = 0.10;
pub const DEFAULT_N_RESULTS: u32 = 20;
pub const DEFAULT_KS: [usize; 6] = [1, 3, 5, 10, 15, 20];
pub const DEFAULT_QUERIES: [&str; 10] = [
    "bitcoin", "ethereum", "dogecoin", "solana", "cardano", "defi", "etf", "halving", "airdrop",
    "ordinals",
];

#[derive(Debug, Clone, PartialEq)]
pub struct EvalSettings {
    pub queries: Vec<String>,
    pub n_results: u32,
    pub upvotes_min: u32,
    pub threshold: f64,
    pub ks: Vec<usize>,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            n_results: DEFAULT_N_RESULTS,
            upvotes_min: 0,
            threshold: DEFAULT_THRESHOLD,
            ks: DEFAULT_KS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryEvaluation {
    pub relevance: Vec<u8>,
    pub similarities: Vec<f64>,
    /// `P@k` → precision
    pub precision: BTreeMap<String, f64>,
    /// `Sim@k` → mean similarity
    pub similarity: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalReport {
    pub generated_at: DateTime<Utc>,
    pub threshold: f64,
    #[serde(rename = "K")]
    pub ks: Vec<usize>,
    /// Keeps the order queries were given in.
    pub queries: Vec<String>,
    pub per_query: BTreeMap<String, QueryEvaluation>,
    pub precision_per_k: BTreeMap<String, f64>,
    pub similarity_per_k: BTreeMap<String, f64>,
    pub avg_precision_per_query: BTreeMap<String, f64>,
}

pub fn precision_key(k: usize) -> String {
    format!("P@{k}")
}

pub fn similarity_key(k: usize) -> String {
    format!("Sim@{k}")
}

/// 1 for every similarity at or above `threshold`, else 0.
pub fn binarize(similarities: &[f64], threshold: f64) -> Vec<u8> {
    similarities
        .iter()
        .map(|s| u8::from(*s >= threshold))
        .collect()
}

/// Share of relevant items among the first `k` ranks. Missing ranks count as not relevant.
pub fn precision_at_k(relevance: &[u8], k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let hits: u32 = relevance.iter().take(k).map(|r| u32::from(*r)).sum();
    hits as f64 / k as f64
}

/// Mean of `precision_at_k` over `ks`.
pub fn average_precision_over_ks(relevance: &[u8], ks: &[usize]) -> f64 {
    if ks.is_empty() {
        return 0.0;
    }
    ks.iter().map(|k| precision_at_k(relevance, *k)).sum::<f64>() / ks.len() as f64
}

/// Sum of the top-`k` similarities divided by `k`.
pub fn similarity_at_k(similarities: &[f64], k: usize) -> f64 {
    if k == 0 || similarities.is_empty() {
        return 0.0;
    }
    similarities.iter().take(k).sum::<f64>() / k as f64
}

/// Score one query's similarities.
pub fn evaluate_similarities(similarities: Vec<f64>, threshold: f64, ks: &[usize]) -> QueryEvaluation {
    let relevance = binarize(&similarities, threshold);
    QueryEvaluation {
        precision: ks
            .iter()
            .map(|k| (precision_key(*k), precision_at_k(&relevance, *k)))
            .collect(),
        similarity: ks
            .iter()
            .map(|k| (similarity_key(*k), similarity_at_k(&similarities, *k)))
            .collect(),
        relevance,
        similarities,
    }
}

/// Run every query once and aggregate the scores.
///
/// Stops at the first failing query.
pub fn evaluate<T: Transport + ?Sized>(
    transport: &T,
    settings: &EvalSettings,
) -> Result<EvalReport, SearchError> {
    let n = settings.n_results.to_string();
    let upvotes_min = settings.upvotes_min.to_string();
    let mut per_query: BTreeMap<String, QueryEvaluation> = BTreeMap::new();
    for q in &settings.queries {
        let descriptor = query::build(q, Some(n.as_str()), Some(upvotes_min.as_str()))?;
        if per_query.contains_key(descriptor.topic()) {
            continue;
        }
        let payload = transport.fetch(&descriptor)?;
        let sims: Vec<f64> = payload.posts.iter().map(|p| p.relevance_score).collect();
        let eval = evaluate_similarities(sims, settings.threshold, &settings.ks);
        log::info!("{}: {:?}", descriptor.topic(), eval.precision);
        per_query.insert(descriptor.topic().to_string(), eval);
    }
    Ok(build_report(settings, per_query))
}

/// Aggregate already-scored queries. Averages run over the queries present in `per_query`.
pub fn build_report(
    settings: &EvalSettings,
    per_query: BTreeMap<String, QueryEvaluation>,
) -> EvalReport {
    let precision_per_k = settings
        .ks
        .iter()
        .map(|k| {
            let key = precision_key(*k);
            let v = mean_over_queries(&per_query, &key, precision_of);
            (key, v)
        })
        .collect();
    let similarity_per_k = settings
        .ks
        .iter()
        .map(|k| {
            let key = similarity_key(*k);
            let v = mean_over_queries(&per_query, &key, similarity_of);
            (key, v)
        })
        .collect();
    let avg_precision_per_query = per_query
        .iter()
        .map(|(q, e)| (q.clone(), average_precision_over_ks(&e.relevance, &settings.ks)))
        .collect();

    // First occurrence wins; repeated queries share one entry in `per_query`.
    let mut queries: Vec<String> = Vec::new();
    for q in settings.queries.iter().map(|q| q.trim()) {
        if per_query.contains_key(q) && !queries.iter().any(|seen| seen == q) {
            queries.push(q.to_string());
        }
    }

    EvalReport {
        generated_at: Utc::now(),
        threshold: settings.threshold,
        ks: settings.ks.clone(),
        queries,
        per_query,
        precision_per_k,
        similarity_per_k,
        avg_precision_per_query,
    }
}

fn precision_of(e: &QueryEvaluation) -> &BTreeMap<String, f64> {
    &e.precision
}

fn similarity_of(e: &QueryEvaluation) -> &BTreeMap<String, f64> {
    &e.similarity
}

fn mean_over_queries(
    per_query: &BTreeMap<String, QueryEvaluation>,
    key: &str,
    pick: fn(&QueryEvaluation) -> &BTreeMap<String, f64>,
) -> f64 {
    if per_query.is_empty() {
        return 0.0;
    }
    per_query
        .values()
        .map(|e| pick(e).get(key).copied().unwrap_or(0.0))
        .sum::<f64>()
        / per_query.len() as f64
}

/// Write `eval_report.json` and the three bar charts into `dir`. Returns the created paths.
pub fn write_outputs<P: AsRef<Path>>(
    report: &EvalReport,
    dir: P,
    width: u32,
    height: u32,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut written = Vec::new();

    let json_path = dir.join("eval_report.json");
    storage::save_json_value(report, &json_path)?;
    written.push(json_path);

    let per_k = |map: &BTreeMap<String, f64>, key: fn(usize) -> String| -> Vec<Bar> {
        report
            .ks
            .iter()
            .map(|k| {
                let label = key(*k);
                Bar {
                    value: map.get(&label).copied().unwrap_or(0.0),
                    label,
                }
            })
            .collect()
    };

    let charts = [
        (
            "precision_at_k.svg",
            per_k(&report.precision_per_k, precision_key),
            BarChartStyle {
                title: format!(
                    "Avg Precision@K of Queries per K (similarity ≥ {})",
                    report.threshold
                ),
                y_desc: "Avg Precision of Queries".to_string(),
                y_max: Some(1.0),
                color: chart::BLUE,
            },
        ),
        (
            "similarity_per_k.svg",
            per_k(&report.similarity_per_k, similarity_key),
            BarChartStyle {
                title: "Average Raw Similarity per K".to_string(),
                y_desc: "Avg Similarity".to_string(),
                y_max: Some(1.0),
                color: chart::INDIGO,
            },
        ),
        (
            "avg_precision_per_query.svg",
            report
                .queries
                .iter()
                .map(|q| Bar {
                    label: q.clone(),
                    value: report.avg_precision_per_query.get(q).copied().unwrap_or(0.0),
                })
                .collect::<Vec<_>>(),
            BarChartStyle {
                title: format!(
                    "Average Precision@K per Query (similarity ≥ {})",
                    report.threshold
                ),
                y_desc: "Average Precision@K".to_string(),
                y_max: Some(1.0),
                color: chart::EMERALD,
            },
        ),
    ];

    for (name, bars, style) in charts {
        if bars.is_empty() {
            log::warn!("skipping {name}: nothing to plot");
            continue;
        }
        let path = dir.join(name);
        chart::plot_bars(&bars, &path, width, height, &style)?;
        written.push(path);
    }
    Ok(written)
}
