//! MangaDex source implementation.
//!
//! Uses the MangaDex REST API: `/manga` for search, `/manga/{id}/feed` and
//! `/manga/{id}/aggregate` for chapter listings, and `/at-home/server/{id}`
//! for page URLs.

mod api;
mod reconcile;

pub use reconcile::ReconcileError;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use self::api::{
    first_relationship, AggregateResponse, AtHomeResponse, ChapterData, ChapterFeedResponse,
    MangaData, MangaListResponse, COVER_ART, SCANLATION_GROUP,
};
use crate::config::SourceConfig;
use crate::models::{
    AbsoluteNumberMap, ChapterContent, ChapterQuery, ChapterRecord, ChapterSet, PageDescriptor,
    SeriesQuery, SeriesRecord, SeriesSearchResult,
};
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::{ensure_success, HttpClient};

/// Title locales tried in order when naming a series
const TITLE_LOCALES: [&str; 2] = ["en", "jp"];

/// MangaDex source
#[derive(Debug, Clone)]
pub struct MangaDexSource {
    client: HttpClient,
    config: SourceConfig,
}

impl MangaDexSource {
    /// Create a new MangaDex source
    pub fn new(client: HttpClient, config: SourceConfig) -> Self {
        Self { client, config }
    }

    /// Create a source with default HTTP settings
    pub fn with_config(config: SourceConfig) -> Result<Self, SourceError> {
        Ok(Self::new(HttpClient::new()?, config))
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Build request URL
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.api_base_url.trim_end_matches('/'), endpoint)
    }

    /// `translatedLanguage[]` pairs for the configured languages
    fn language_params(&self) -> Vec<(&'static str, &str)> {
        self.config
            .languages
            .iter()
            .map(|lang| ("translatedLanguage[]", lang.as_str()))
            .collect()
    }

    fn cover_url(&self, series_id: &str, file_name: &str) -> String {
        let base = self.config.uploads_base_url.trim_end_matches('/');
        match self.config.cover_size.filter(|size| *size > 0) {
            Some(size) => format!("{}/covers/{}/{}.{}.jpg", base, series_id, file_name, size),
            None => format!("{}/covers/{}/{}", base, series_id, file_name),
        }
    }

    /// Map a search hit to a series record, or `None` when it has no usable title
    fn parse_series(&self, data: &MangaData) -> Option<SeriesRecord> {
        let title = TITLE_LOCALES
            .iter()
            .filter_map(|locale| data.attributes.title.get(*locale))
            .find(|title| !title.is_empty());

        let Some(title) = title else {
            debug!("Couldn't determine proper title for series {}", data.id);
            return None;
        };

        let mut series = SeriesRecord::new(title.clone(), data.id.clone());
        if let Some(file_name) = first_relationship(&data.relationships, COVER_ART)
            .and_then(|attrs| attrs.file_name.as_deref())
        {
            series = series.cover_url(self.cover_url(&data.id, file_name));
        }

        Some(series)
    }

    /// Map a feed entry to a chapter record, preferring the corrected number
    fn parse_chapter(data: ChapterData, numbers: &AbsoluteNumberMap) -> ChapterRecord {
        let group = first_relationship(&data.relationships, SCANLATION_GROUP)
            .and_then(|attrs| attrs.name.clone());

        let attributes = data.attributes;
        let raw_number = attributes.chapter.unwrap_or_default();
        let number = numbers.resolve(&data.id, &raw_number).to_string();
        debug!("Chapter {} number: raw {:?}, resolved {:?}", data.id, raw_number, number);

        ChapterRecord::new(number, data.id, attributes.title.unwrap_or_default())
            .group(group)
            .timestamps(
                attributes.created_at,
                attributes.updated_at,
                attributes.publish_at,
            )
    }

    /// Build page descriptors from an at-home server manifest
    fn build_pages(server: &AtHomeResponse) -> Result<ChapterContent, SourceError> {
        let chapter = &server.chapter;
        if chapter.data.len() != chapter.data_saver.len() {
            return Err(SourceError::InvalidResponse(format!(
                "chapter {} lists {} pages but {} data-saver pages",
                chapter.hash,
                chapter.data.len(),
                chapter.data_saver.len()
            )));
        }

        let base_url = server.base_url.trim_end_matches('/');
        let pages = chapter
            .data
            .iter()
            .zip(&chapter.data_saver)
            .map(|(high, low)| {
                PageDescriptor::new(format!("{}/data/{}/{}", base_url, chapter.hash, high))
                    .low_url(format!("{}/data-saver/{}/{}", base_url, chapter.hash, low))
            })
            .collect();

        Ok(ChapterContent::new(pages))
    }

    /// Fetch the aggregate document and compute absolute chapter numbers
    pub async fn absolute_numbers(
        &self,
        series_id: &str,
    ) -> Result<AbsoluteNumberMap, ReconcileError> {
        let url = self.build_url(&format!("/manga/{}/aggregate", series_id));
        debug!("Fetching aggregate: {}", url);

        let response = self
            .client
            .client()
            .get(&url)
            .query(&self.language_params())
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch aggregate: {}", e)))?;

        let aggregate: AggregateResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse aggregate JSON: {}", e)))?;

        reconcile::reconcile(&aggregate)
    }
}

#[async_trait]
impl Source for MangaDexSource {
    fn id(&self) -> &str {
        "mangadex"
    }

    fn name(&self) -> &str {
        "MangaDex"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
            | SourceCapabilities::CHAPTERS
            | SourceCapabilities::PAGES
            | SourceCapabilities::INCREMENTAL
    }

    async fn search_series(&self, query: &SeriesQuery) -> Result<SeriesSearchResult, SourceError> {
        if query.title.trim().is_empty() {
            return Err(SourceError::InvalidRequest("Search title is empty".to_string()));
        }

        let url = self.build_url("/manga");
        debug!("Searching MangaDex: {} (title={:?})", url, query.title);

        let response = self
            .client
            .client()
            .get(&url)
            .query(&[("title", query.title.as_str()), ("includes[]", COVER_ART)])
            .query(&[("offset", query.offset), ("limit", query.effective_limit())])
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search MangaDex: {}", e)))?;

        let data: MangaListResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        let results: Vec<SeriesRecord> = data
            .data
            .iter()
            .filter_map(|manga| self.parse_series(manga))
            .enumerate()
            .map(|(rank, series)| series.ranking(rank as i64))
            .collect();

        info!(
            "MangaDex search {:?}: {} of {} results usable",
            query.title,
            results.len(),
            data.data.len()
        );
        Ok(SeriesSearchResult::new(results))
    }

    async fn list_chapters(&self, query: &ChapterQuery) -> Result<ChapterSet, SourceError> {
        self.validate_id(&query.series_id)?;

        let url = self.build_url(&format!("/manga/{}/feed", query.series_id));
        let mut request = self
            .client
            .client()
            .get(&url)
            .query(&self.language_params())
            .query(&[("offset", query.offset), ("limit", query.effective_limit())])
            .query(&[
                ("order[chapter]", query.order.as_query()),
                ("includes[]", SCANLATION_GROUP),
                ("includeEmptyPages", "0"),
                ("includeFuturePublishAt", "0"),
                ("includeExternalUrl", "0"),
            ]);
        if let Some(since) = query.since_param() {
            request = request.query(&[("updatedAtSince", since)]);
        }
        debug!("Fetching chapter feed: {} ({:?})", url, query);

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch chapter feed: {}", e)))?;

        let feed: ChapterFeedResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        if feed.data.is_empty() {
            info!("No new chapters found for series {}", query.series_id);
            return Ok(ChapterSet::empty());
        }

        let numbers = match self.absolute_numbers(&query.series_id).await {
            Ok(numbers) => numbers,
            Err(e) => {
                warn!(
                    "Falling back to raw chapter numbers for series {}: {}",
                    query.series_id, e
                );
                AbsoluteNumberMap::new()
            }
        };

        let chapters: Vec<ChapterRecord> = feed
            .data
            .into_iter()
            .map(|chapter| Self::parse_chapter(chapter, &numbers))
            .collect();

        info!(
            "Listed {} chapters for series {} ({} renumbered)",
            chapters.len(),
            query.series_id,
            numbers.len()
        );
        Ok(ChapterSet::new(chapters))
    }

    async fn get_chapter(&self, chapter_id: &str) -> Result<ChapterContent, SourceError> {
        self.validate_id(chapter_id)?;

        let url = self.build_url(&format!("/at-home/server/{}", chapter_id));
        let mut request = self.client.client().get(&url);
        if self.config.force_port_443 {
            request = request.query(&[("forcePort443", "true")]);
        }
        debug!("Chapter URL: {}", url);

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch chapter server: {}", e)))?;

        let server: AtHomeResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        Self::build_pages(&server)
    }

    fn validate_id(&self, id: &str) -> Result<(), SourceError> {
        if id.trim().is_empty() {
            return Err(SourceError::InvalidRequest("identifier is empty".to_string()));
        }
        if id.contains(['/', '?', '#']) {
            return Err(SourceError::InvalidRequest(format!(
                "identifier '{}' contains reserved characters",
                id
            )));
        }
        Ok(())
    }
}
