use crate::models::Post;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix cells that a spreadsheet would evaluate as a formula.
fn sanitize_cell(s: &str) -> Cow<'_, str> {
    match s.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => Cow::Owned(format!("'{s}")),
        _ => Cow::Borrowed(s),
    }
}

/// Save posts as CSV with header, one row per post in rank order.
pub fn save_csv<P: AsRef<Path>>(posts: &[Post], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    wtr.serialize((
        "rank",
        "id",
        "title",
        "author",
        "subreddit",
        "flair",
        "url",
        "upvotes",
        "num_comments",
        "relevance_score",
        "text",
    ))?;
    for (idx, p) in posts.iter().enumerate() {
        wtr.serialize((
            idx + 1,
            sanitize_cell(&p.id),
            sanitize_cell(&p.title),
            sanitize_cell(&p.author),
            sanitize_cell(&p.subreddit),
            p.flair.as_deref().map(sanitize_cell),
            sanitize_cell(&p.url),
            p.upvotes,
            p.num_comments,
            p.relevance_score,
            sanitize_cell(&p.text),
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save posts as pretty JSON array.
pub fn save_json<P: AsRef<Path>>(posts: &[Post], path: P) -> Result<()> {
    save_json_value(posts, path)
}

/// Pretty-print any serializable value to `path`.
pub fn save_json_value<T: serde::Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
