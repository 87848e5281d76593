//! Mock source for testing hosts against canned responses.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use crate::models::{
    ChapterContent, ChapterQuery, ChapterRecord, ChapterSet, SeriesQuery, SeriesRecord,
    SeriesSearchResult,
};
use crate::sources::{Source, SourceCapabilities, SourceError};

/// A mock source that returns predefined responses.
///
/// Operations without a configured response return an empty result.
#[derive(Debug, Default)]
pub struct MockSource {
    search_response: Mutex<Option<SeriesSearchResult>>,
    chapters_response: Mutex<Option<ChapterSet>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search response to return.
    pub fn set_search_response(&self, response: SeriesSearchResult) {
        *lock(&self.search_response) = Some(response);
    }

    /// Set the chapter listing to return.
    pub fn set_chapters_response(&self, response: ChapterSet) {
        *lock(&self.chapters_response) = Some(response);
    }

    /// Clear all configured responses.
    pub fn clear_responses(&self) {
        *lock(&self.search_response) = None;
        *lock(&self.chapters_response) = None;
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::CHAPTERS
    }

    async fn search_series(&self, _query: &SeriesQuery) -> Result<SeriesSearchResult, SourceError> {
        Ok(lock(&self.search_response).clone().unwrap_or_default())
    }

    async fn list_chapters(&self, _query: &ChapterQuery) -> Result<ChapterSet, SourceError> {
        Ok(lock(&self.chapters_response).clone().unwrap_or_default())
    }

    async fn get_chapter(&self, chapter_id: &str) -> Result<ChapterContent, SourceError> {
        Err(SourceError::NotFound(format!("Mock chapter '{}'", chapter_id)))
    }
}

/// Helper function to create a ranked mock series.
pub fn make_series(identifier: &str, name: &str, ranking: i64) -> SeriesRecord {
    SeriesRecord::new(name, identifier)
        .cover_url(format!("http://example.com/covers/{}.jpg", identifier))
        .ranking(ranking)
}

/// Helper function to create a mock chapter.
pub fn make_chapter(identifier: &str, number: &str) -> ChapterRecord {
    ChapterRecord::new(number, identifier, format!("Chapter {}", number))
}
