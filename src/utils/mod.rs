//! Utility modules shared by sources.
//!
//! - [`HttpClient`]: reqwest client built from [`HttpConfig`](crate::config::HttpConfig)
//! - [`ensure_success`]: map non-2xx responses to [`SourceError::Status`](crate::sources::SourceError::Status)

mod http;

pub use http::{ensure_success, HttpClient};
