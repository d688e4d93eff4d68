use serde::{Deserialize, Serialize};

/// Top-level response object as it arrives from the search service.
///
/// Everything is optional here: the service is only partially trusted, and
/// `aggregate::normalize` turns this into a [`ResultPayload`] in one pass.
/// A top-level `error` field is checked by `api::parse_payload` before this is decoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPayload {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_count")]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub posts: Option<Vec<RawPost>>,
}

/// Raw post entry (one element of `posts`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPost {
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub flair: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_count")]
    pub upvotes: Option<u64>,
    #[serde(default, deserialize_with = "de_lenient_count")]
    pub num_comments: Option<u64>,
    #[serde(default, deserialize_with = "de_lenient_score")]
    pub relevance_score: Option<f64>,
}

/// Normalized post used everywhere past the transport boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub text: String,
    pub author: String,
    pub subreddit: String,
    pub flair: Option<String>,
    pub url: String,
    pub upvotes: u64,
    pub num_comments: u64,
    /// Match strength in `[0, 1]` as computed by the service.
    pub relevance_score: f64,
}

/// A successful search result. `posts` keeps the service's relevance order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultPayload {
    pub query: Option<String>,
    pub total_results: u64,
    pub posts: Vec<Post>,
}

/// One bar of the upvotes chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    /// `#1`, `#2`, … by rank.
    pub label: String,
    pub value: u64,
    pub tooltip_title: String,
}

/// Everything a view needs to render one result set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DerivedView {
    pub chart_series: Vec<ChartPoint>,
    pub total_upvotes: u64,
    pub total_comments: u64,
    pub display_posts: Vec<Post>,
}

/// Serde helper: non-negative count from a JSON number, numeric string, or null.
///
/// Negative numbers clamp to 0, fractions are truncated, anything unparsable is `None`.
fn de_lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = Option<u64>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number, a numeric string, or null")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.max(0) as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_finite() {
                Ok(Some(v.max(0.0).trunc() as u64))
            } else {
                Ok(None)
            }
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            match s.trim().parse::<f64>() {
                Ok(v) => self.visit_f64(v),
                Err(_) => Ok(None),
            }
        }

        fn visit_bool<E>(self, _v: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(CountVisitor)
}

/// Serde helper: float score from a JSON number or numeric string; null and junk are `None`.
fn de_lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct ScoreVisitor;

    impl<'de> Visitor<'de> for ScoreVisitor {
        type Value = Option<f64>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number, a numeric string, or null")
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.is_finite().then_some(v))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v as f64))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v as f64))
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(s.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(ScoreVisitor)
}

/// Serde helper: ids usually arrive as strings but some deployments send numbers.
fn de_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string, a number, or null")
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(s.to_string()))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
