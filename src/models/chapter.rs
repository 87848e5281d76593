//! Chapter listing models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound the chapter feed accepts for `limit`.
pub const MAX_FEED_LIMIT: usize = 500;

/// Default page size for chapter listings.
pub const DEFAULT_FEED_LIMIT: usize = 100;

/// Sort order for chapter listings, by chapter number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Value used in `order[...]` query parameters
    pub fn as_query(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// One chapter of a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    /// Chapter number. Usually numeric ("12", "12.5") but may be a label
    /// such as "EX" or "Omake".
    pub number: String,

    /// Source-specific identifier, passed back to `get_chapter`
    pub identifier: String,

    /// Short chapter title
    pub title: String,

    /// Longer description; empty when the source has none
    pub description: String,

    /// Scanlation group credited for the release
    pub group: Option<String>,

    /// Distinguishes multiple releases of the same chapter when the group
    /// alone is not enough
    pub variant: Option<String>,

    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,

    /// Publication date of the original chapter
    pub published: Option<DateTime<Utc>>,
}

impl ChapterRecord {
    /// Create a chapter record with required fields
    pub fn new(
        number: impl Into<String>,
        identifier: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            identifier: identifier.into(),
            title: title.into(),
            description: String::new(),
            group: None,
            variant: None,
            created: None,
            updated: None,
            published: None,
        }
    }

    /// Set description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set scanlation group
    pub fn group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }

    /// Set variant
    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Set created/updated/published timestamps
    pub fn timestamps(
        mut self,
        created: Option<DateTime<Utc>>,
        updated: Option<DateTime<Utc>>,
        published: Option<DateTime<Utc>>,
    ) -> Self {
        self.created = created;
        self.updated = updated;
        self.published = published;
        self
    }

    /// Chapter number as a float, if it is numeric
    pub fn numeric(&self) -> Option<f64> {
        self.number.trim().parse::<f64>().ok().filter(|n| n.is_finite())
    }
}

/// All chapters returned by one listing call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSet {
    /// Chapters in the requested sort order
    pub chapters: Vec<ChapterRecord>,
}

impl ChapterSet {
    pub fn new(chapters: Vec<ChapterRecord>) -> Self {
        Self { chapters }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Find a chapter by identifier
    pub fn get(&self, identifier: &str) -> Option<&ChapterRecord> {
        self.chapters.iter().find(|c| c.identifier == identifier)
    }
}

/// Chapter listing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterQuery {
    /// Series identifier from a [`SeriesRecord`](crate::models::SeriesRecord)
    pub series_id: String,

    pub offset: usize,

    /// Page size (capped at [`MAX_FEED_LIMIT`])
    pub limit: usize,

    /// Only chapters updated at or after this instant
    pub since: Option<DateTime<Utc>>,

    pub order: SortOrder,
}

impl ChapterQuery {
    /// Create a query for the first page, ascending
    pub fn new(series_id: impl Into<String>) -> Self {
        Self {
            series_id: series_id.into(),
            offset: 0,
            limit: DEFAULT_FEED_LIMIT,
            since: None,
            order: SortOrder::Ascending,
        }
    }

    /// Set offset
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Set limit, capped at [`MAX_FEED_LIMIT`]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_FEED_LIMIT);
        self
    }

    /// Only list chapters updated since `since`
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Set sort order
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Limit actually sent upstream
    pub fn effective_limit(&self) -> usize {
        self.limit.min(MAX_FEED_LIMIT)
    }

    /// `since` rendered at second resolution, the only precision the feed accepts
    pub fn since_param(&self) -> Option<String> {
        self.since
            .map(|since| since.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

/// Corrected absolute chapter numbers, keyed by chapter identifier.
///
/// Only holds entries for chapters whose number was actually corrected;
/// callers fall back to the raw feed number for everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsoluteNumberMap {
    numbers: HashMap<String, String>,
}

impl AbsoluteNumberMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identifier: impl Into<String>, number: impl Into<String>) {
        self.numbers.insert(identifier.into(), number.into());
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.numbers.get(identifier).map(String::as_str)
    }

    /// Corrected number for `identifier`, or `raw` when none was computed
    pub fn resolve<'a>(&'a self, identifier: &str, raw: &'a str) -> &'a str {
        self.get(identifier).unwrap_or(raw)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.numbers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for AbsoluteNumberMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            numbers: iter.into_iter().collect(),
        }
    }
}
