//! Manga source adapters with a trait-based architecture.
//!
//! This module defines the [`Source`] trait every adapter implements. A host
//! application registers adapters in a [`SourceRegistry`] and talks to all of
//! them through the same three calls:
//!
//! 1. [`Source::search_series`] - title search, yielding series identifiers
//! 2. [`Source::list_chapters`] - chapter listing for a series identifier
//! 3. [`Source::get_chapter`] - page URLs for a chapter identifier
//!
//! Identifiers are opaque to the host; each source only has to accept back
//! the identifiers it handed out.

pub mod mangadex;
pub mod mock;
mod registry;

pub use mangadex::MangaDexSource;
pub use mock::MockSource;
pub use registry::{SourceCapabilities, SourceRegistry};

use crate::models::{ChapterContent, ChapterQuery, ChapterSet, SeriesQuery, SeriesSearchResult};
use async_trait::async_trait;

/// The Source trait defines the interface for all manga source adapters.
///
/// # Implementing a New Source
///
/// 1. Create a new struct that implements `Source`
/// 2. Implement `id`, `name`, and the operations listed in `capabilities`
/// 3. Register it with [`SourceRegistry::register`]
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "mangadex")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Describe the capabilities of this source
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    /// Whether this source supports series search
    fn supports_search(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::SEARCH)
    }

    /// Whether this source can list chapters
    fn supports_chapters(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::CHAPTERS)
    }

    /// Whether this source can resolve chapter pages
    fn supports_pages(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::PAGES)
    }

    /// Whether chapter listings honor [`ChapterQuery::since`]
    fn supports_incremental(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::INCREMENTAL)
    }

    /// Search for series matching a title
    async fn search_series(&self, _query: &SeriesQuery) -> Result<SeriesSearchResult, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// List one page of chapters for a series
    async fn list_chapters(&self, _query: &ChapterQuery) -> Result<ChapterSet, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Resolve the pages of a chapter
    async fn get_chapter(&self, _chapter_id: &str) -> Result<ChapterContent, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Validate that an identifier is correctly formatted for this source
    fn validate_id(&self, _id: &str) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The requested operation is not implemented for this source
    #[error("Operation not implemented for this source")]
    NotImplemented,

    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Upstream answered with a non-success status
    #[error("Bad response from server: {code} - {reason}\n{body}")]
    Status {
        code: u16,
        reason: String,
        body: String,
    },

    /// Response decoded but is internally inconsistent
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Source or item not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl SourceError {
    /// HTTP status code, for [`SourceError::Status`]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SourceError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_capabilities() {
        let caps = SourceCapabilities::SEARCH | SourceCapabilities::CHAPTERS;

        assert!(caps.contains(SourceCapabilities::SEARCH));
        assert!(caps.contains(SourceCapabilities::CHAPTERS));
        assert!(!caps.contains(SourceCapabilities::PAGES));
    }

    #[test]
    fn test_status_error_message() {
        let err = SourceError::Status {
            code: 500,
            reason: "Internal Server Error".to_string(),
            body: "{\"result\":\"error\"}".to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("Internal Server Error"));
        assert!(message.contains("\"result\""));
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(SourceError::NotImplemented.status_code(), None);
    }
}
