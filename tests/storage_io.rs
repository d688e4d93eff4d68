use cra_rs::Post;
use cra_rs::storage;
use std::fs;
use tempfile::tempdir;

fn sample(n: usize) -> Vec<Post> {
    (0..n)
        .map(|i| Post {
            id: format!("id{i}"),
            title: format!("Title {i}"),
            text: "line one\nline two, with comma".into(),
            author: "alice".into(),
            subreddit: "Bitcoin".into(),
            flair: (i % 2 == 0).then(|| "Discussion".to_string()),
            url: format!("https://reddit.com/r/Bitcoin/comments/id{i}"),
            upvotes: 100 - i as u64,
            num_comments: i as u64,
            relevance_score: 0.5,
        })
        .collect()
}

#[test]
fn save_csv_and_json() {
    let posts = sample(3);
    let dir = tempdir().unwrap();

    let csv_path = dir.path().join("posts.csv");
    storage::save_csv(&posts, &csv_path).unwrap();
    let mut rdr = csv::Reader::from_path(&csv_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "rank");
    assert_eq!(&headers[10], "text");
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), posts.len());
    assert_eq!(&rows[0][0], "1");
    assert_eq!(&rows[2][1], "id2");
    assert_eq!(&rows[1][5], "");
    assert_eq!(&rows[0][10], "line one\nline two, with comma");

    let json_path = dir.path().join("posts.json");
    storage::save_json(&posts, &json_path).unwrap();
    let back: Vec<Post> = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(back, posts);
}

#[test]
fn csv_neutralizes_formula_cells() {
    let mut posts = sample(1);
    posts[0].title = "=HYPERLINK(\"http://evil\")".into();
    posts[0].author = "+cmd".into();
    let dir = tempdir().unwrap();
    let path = dir.path().join("posts.csv");
    storage::save_csv(&posts, &path).unwrap();

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let row = rdr.records().next().unwrap().unwrap();
    assert_eq!(&row[2], "'=HYPERLINK(\"http://evil\")");
    assert_eq!(&row[3], "'+cmd");
}

#[test]
fn save_to_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope").join("posts.csv");
    assert!(storage::save_csv(&sample(1), &path).is_err());
}
