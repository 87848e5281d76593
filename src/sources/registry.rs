//! Registry for managing source adapters.

use std::collections::HashMap;
use std::sync::Arc;

use super::{MangaDexSource, Source, SourceError};
use crate::config::Config;
use crate::utils::HttpClient;

bitflags::bitflags! {
    /// Capabilities that a source can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const SEARCH = 1 << 0;
        const CHAPTERS = 1 << 1;
        const PAGES = 1 << 2;
        const INCREMENTAL = 1 << 3;
    }
}

/// Registry of available sources, keyed by [`Source::id`]
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in source, configured from `config`
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = HttpClient::from_config(&config.http)?;

        let mut registry = Self::new();
        registry.register(Arc::new(MangaDexSource::new(
            client,
            config.source.clone(),
        )));

        Ok(registry)
    }

    /// Register a new source, replacing any source with the same id
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.insert(source.id().to_string(), source);
    }

    /// Get a source by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Source>> {
        self.sources.get(id)
    }

    /// Get a source by ID, returning an error if not found
    pub fn get_required(&self, id: &str) -> Result<&Arc<dyn Source>, SourceError> {
        self.get(id)
            .ok_or_else(|| SourceError::NotFound(format!("Source '{}' not found", id)))
    }

    /// Get all registered sources
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.values()
    }

    /// Get all source IDs
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(|s| s.as_str())
    }

    /// Get sources that support a specific capability
    pub fn with_capability(&self, capability: SourceCapabilities) -> Vec<&Arc<dyn Source>> {
        self.all()
            .filter(|s| s.capabilities().contains(capability))
            .collect()
    }

    /// Get sources that support search
    pub fn searchable(&self) -> Vec<&Arc<dyn Source>> {
        self.with_capability(SourceCapabilities::SEARCH)
    }

    /// Check if a source exists
    pub fn has(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockSource;

    #[test]
    fn test_registry_from_config() {
        let registry = SourceRegistry::from_config(&Config::default()).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.has("mangadex"));
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["mangadex"]);
    }

    #[test]
    fn test_get_source() {
        let mut registry = SourceRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(MockSource::new()));

        let mock = registry.get("mock");
        assert!(mock.is_some());
        assert_eq!(mock.unwrap().id(), "mock");

        assert!(registry.get("nonexistent").is_none());
        assert!(matches!(
            registry.get_required("nonexistent"),
            Err(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_capabilities() {
        let mut registry = SourceRegistry::from_config(&Config::default()).unwrap();
        registry.register(Arc::new(MockSource::new()));

        let mangadex = registry.get("mangadex").unwrap();
        assert!(mangadex.supports_search());
        assert!(mangadex.supports_chapters());
        assert!(mangadex.supports_pages());
        assert!(mangadex.supports_incremental());

        assert_eq!(registry.searchable().len(), 2);
        assert_eq!(
            registry.with_capability(SourceCapabilities::PAGES).len(),
            1
        );
    }
}
