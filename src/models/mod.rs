//! Source-agnostic records handed to the host: series, chapters and pages.

mod chapter;
mod page;
mod series;

pub use chapter::{
    AbsoluteNumberMap, ChapterQuery, ChapterRecord, ChapterSet, SortOrder, DEFAULT_FEED_LIMIT,
    MAX_FEED_LIMIT,
};
pub use page::{
    ChapterContent, PageDescriptor, PageHandler, CHAPTER_CONTENT_VERSION,
    PAGE_DESCRIPTOR_VERSION,
};
pub use series::{SeriesQuery, SeriesRecord, SeriesSearchResult, MAX_SEARCH_LIMIT, UNRANKED};
