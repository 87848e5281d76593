//! Series search request and result models.

use serde::{Deserialize, Serialize};

/// Upper bound the search endpoint accepts for `limit`.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Ranking assigned to series that carry no ranking information.
pub const UNRANKED: i64 = -1;

/// A single series matched by a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRecord {
    /// Display name of the series
    pub name: String,

    /// Source-specific identifier, passed back to `list_chapters`
    pub identifier: String,

    /// Cover image URL, used by the host to help users pick a match
    pub cover_url: Option<String>,

    /// Likelihood of being the right match: 0 is best, larger is worse.
    /// All negative values are treated as equal.
    pub ranking: i64,
}

impl SeriesRecord {
    /// Create an unranked series record without a cover
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
            cover_url: None,
            ranking: UNRANKED,
        }
    }

    /// Set the cover URL
    pub fn cover_url(mut self, url: impl Into<String>) -> Self {
        self.cover_url = Some(url.into());
        self
    }

    /// Set the ranking
    pub fn ranking(mut self, ranking: i64) -> Self {
        self.ranking = ranking;
        self
    }

    /// Whether this record carries a usable ranking
    pub fn is_ranked(&self) -> bool {
        self.ranking >= 0
    }
}

/// Ordered results of a series search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesSearchResult {
    /// Matches in upstream result order
    pub results: Vec<SeriesRecord>,
}

impl SeriesSearchResult {
    pub fn new(results: Vec<SeriesRecord>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Series search parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesQuery {
    /// Free-text series title
    pub title: String,

    /// Number of upstream results to skip
    pub offset: usize,

    /// Maximum number of results (capped at [`MAX_SEARCH_LIMIT`])
    pub limit: usize,
}

impl SeriesQuery {
    /// Create a query for the first page of results
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            offset: 0,
            limit: MAX_SEARCH_LIMIT,
        }
    }

    /// Set offset
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Set limit, capped at [`MAX_SEARCH_LIMIT`]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_SEARCH_LIMIT);
        self
    }

    /// Limit actually sent upstream
    pub fn effective_limit(&self) -> usize {
        self.limit.min(MAX_SEARCH_LIMIT)
    }
}
