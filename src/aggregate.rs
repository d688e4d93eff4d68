//! Pure derivations from a result payload: chart series, totals, display text.
//!
//! Nothing here performs I/O or keeps state, so every function can be called
//! again on the same payload and give the same answer.

use crate::models::{ChartPoint, DerivedView, Post, RawPayload, RawPost, ResultPayload};

/// How many posts feed the upvotes chart.
pub const CHART_MAX_BARS: usize = 10;
/// Character limit for post bodies in listings.
pub const DEFAULT_TRUNCATE_CHARS: usize = 200;
const ELLIPSIS: char = '…';

impl From<RawPost> for Post {
    fn from(p: RawPost) -> Self {
        let id = p.id.unwrap_or_default();
        let subreddit = non_blank(p.subreddit).unwrap_or_else(|| "Unknown".to_string());
        let url = non_blank(p.url).unwrap_or_else(|| {
            if id.is_empty() {
                String::new()
            } else {
                format!("https://reddit.com/r/{subreddit}/comments/{id}")
            }
        });
        Self {
            title: non_blank(p.title).unwrap_or_else(|| "No Title".to_string()),
            text: p.text.unwrap_or_default(),
            author: non_blank(p.author).unwrap_or_else(|| "Unknown".to_string()),
            // The service writes the literal "None" for posts without flair.
            flair: non_blank(p.flair).filter(|f| f != "None"),
            upvotes: p.upvotes.unwrap_or(0),
            num_comments: p.num_comments.unwrap_or(0),
            relevance_score: p.relevance_score.unwrap_or(0.0).clamp(0.0, 1.0),
            id,
            subreddit,
            url,
        }
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Normalize a raw service response into strongly-typed posts.
///
/// The caller is expected to have rejected responses carrying `error` already.
pub fn normalize(raw: RawPayload) -> ResultPayload {
    let posts: Vec<Post> = raw
        .posts
        .unwrap_or_default()
        .into_iter()
        .map(Post::from)
        .collect();
    ResultPayload {
        query: raw.query,
        total_results: raw.total_results.unwrap_or(posts.len() as u64),
        posts,
    }
}

/// First [`CHART_MAX_BARS`] posts in payload order, labelled by rank.
pub fn chart_series(payload: &ResultPayload) -> Vec<ChartPoint> {
    payload
        .posts
        .iter()
        .take(CHART_MAX_BARS)
        .enumerate()
        .map(|(idx, post)| ChartPoint {
            label: format!("#{}", idx + 1),
            value: post.upvotes,
            tooltip_title: post.title.clone(),
        })
        .collect()
}

/// `(total_upvotes, total_comments)` over all posts.
pub fn totals(payload: &ResultPayload) -> (u64, u64) {
    payload.posts.iter().fold((0u64, 0u64), |(up, com), p| {
        (up.saturating_add(p.upvotes), com.saturating_add(p.num_comments))
    })
}

/// Cut `text` to `limit` characters and mark the cut with a single `…`.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push(ELLIPSIS);
    out
}

/// Build the full view-model for one payload.
pub fn derive_view(payload: &ResultPayload) -> DerivedView {
    let (total_upvotes, total_comments) = totals(payload);
    DerivedView {
        chart_series: chart_series(payload),
        total_upvotes,
        total_comments,
        display_posts: payload
            .posts
            .iter()
            .map(|p| Post {
                text: truncate(&p.text, DEFAULT_TRUNCATE_CHARS),
                ..p.clone()
            })
            .collect(),
    }
}
