//! Page and chapter content models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Layout version of [`PageDescriptor`].
pub const PAGE_DESCRIPTOR_VERSION: &str = "1.0.0";

/// Layout version of [`ChapterContent`].
pub const CHAPTER_CONTENT_VERSION: &str = "2.0.0";

/// Transform applied by the host to a page URL before fetching it
#[derive(Clone)]
pub struct PageHandler(Arc<dyn Fn(String) -> String + Send + Sync>);

impl PageHandler {
    pub fn new(handler: impl Fn(String) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(handler))
    }

    pub fn apply(&self, url: String) -> String {
        (self.0)(url)
    }
}

impl fmt::Debug for PageHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PageHandler(..)")
    }
}

/// One page of chapter artwork
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDescriptor {
    pub version: String,

    /// Full-quality image URL
    pub high_url: String,

    /// Reduced-quality image URL
    pub low_url: Option<String>,

    #[serde(skip)]
    pub high_handler: Option<PageHandler>,

    #[serde(skip)]
    pub low_handler: Option<PageHandler>,
}

impl PageDescriptor {
    pub fn new(high_url: impl Into<String>) -> Self {
        Self {
            version: PAGE_DESCRIPTOR_VERSION.to_string(),
            high_url: high_url.into(),
            low_url: None,
            high_handler: None,
            low_handler: None,
        }
    }

    pub fn low_url(mut self, url: impl Into<String>) -> Self {
        self.low_url = Some(url.into());
        self
    }

    pub fn high_handler(mut self, handler: PageHandler) -> Self {
        self.high_handler = Some(handler);
        self
    }

    pub fn low_handler(mut self, handler: PageHandler) -> Self {
        self.low_handler = Some(handler);
        self
    }

    /// High-quality URL with its handler applied, if any
    pub fn resolved_high_url(&self) -> String {
        match &self.high_handler {
            Some(handler) => handler.apply(self.high_url.clone()),
            None => self.high_url.clone(),
        }
    }

    /// Low-quality URL with its handler applied, if any
    pub fn resolved_low_url(&self) -> Option<String> {
        let url = self.low_url.clone()?;
        Some(match &self.low_handler {
            Some(handler) => handler.apply(url),
            None => url,
        })
    }
}

/// All pages of a chapter, in reading order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterContent {
    pub version: String,
    pub pages: Vec<PageDescriptor>,
}

impl ChapterContent {
    pub fn new(pages: Vec<PageDescriptor>) -> Self {
        Self {
            version: CHAPTER_CONTENT_VERSION.to_string(),
            pages,
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_handlers() {
        let page = PageDescriptor::new("https://cdn/data/H/p1.png")
            .low_url("https://cdn/data-saver/H/p1s.png")
            .high_handler(PageHandler::new(|url| format!("{}?token=1", url)));

        assert_eq!(page.resolved_high_url(), "https://cdn/data/H/p1.png?token=1");
        assert_eq!(
            page.resolved_low_url().as_deref(),
            Some("https://cdn/data-saver/H/p1s.png")
        );
        assert_eq!(page.version, PAGE_DESCRIPTOR_VERSION);
    }

    #[test]
    fn test_handlers_are_not_serialized() {
        let page = PageDescriptor::new("https://cdn/a.png")
            .high_handler(PageHandler::new(|url| url));
        let content = ChapterContent::new(vec![page]);

        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["version"], CHAPTER_CONTENT_VERSION);
        assert_eq!(json["pages"][0]["high_url"], "https://cdn/a.png");
        assert!(json["pages"][0].get("high_handler").is_none());
    }
}
