//! # MangaDex Adapter
//!
//! A source adapter that maps the MangaDex REST API onto a normalized,
//! source-agnostic model of series, chapters and pages.
//!
//! ## Architecture
//!
//! - [`models`]: Records handed to the host (SeriesRecord, ChapterSet, ChapterContent, ...)
//! - [`sources`]: The [`Source`] trait, the [`SourceRegistry`] and the MangaDex implementation
//! - [`utils`]: HTTP client helpers
//! - [`config`]: Configuration management
//!
//! ## Chapter numbering
//!
//! Some series restart chapter numbers in every volume. When listing
//! chapters, the MangaDex source detects this from the series' aggregate
//! index and rewrites chapter numbers so they increase across volumes. If
//! that correction fails for any reason, the listing still succeeds with the
//! numbers as published.

pub mod config;
pub mod models;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use models::{ChapterContent, ChapterRecord, ChapterSet, SeriesRecord, SeriesSearchResult};
pub use sources::{MangaDexSource, Source, SourceError, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
