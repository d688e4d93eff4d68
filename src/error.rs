use thiserror::Error;

/// Why a search did not produce a result.
///
/// All variants end up as one human-readable message in `SearchState::Failed`;
/// the split only matters to callers that want to log or test the category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Rejected before any request was sent (e.g. blank topic).
    #[error("{0}")]
    Validation(String),
    /// Network unreachable, connection dropped, or non-2xx HTTP status.
    #[error("{0}")]
    Transport(String),
    /// A response arrived but carried an `error` field or could not be decoded.
    #[error("{0}")]
    Protocol(String),
}

impl SearchError {
    pub fn is_validation(&self) -> bool {
        matches!(self, SearchError::Validation(_))
    }
}
