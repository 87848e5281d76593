//! Configuration management.
//!
//! Every value has a default, so an empty or missing file yields a working
//! configuration pointed at the public MangaDex API.
//!
//! # Configuration File Format
//!
//! ```toml
//! [source]
//! api_base_url = "https://api.mangadex.org"
//! uploads_base_url = "https://uploads.mangadex.org"
//! languages = ["en"]
//! cover_size = 512        # 0 links the original image
//! force_port_443 = true
//!
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Environment variables override file values, e.g.
//! `MANGADEX_ADAPTER_SOURCE__API_BASE_URL=http://localhost:8080`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "MANGADEX_ADAPTER";

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "mangadex-adapter.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream endpoints and request shaping
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging settings (used by the binary)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings consumed by [`MangaDexSource`](crate::sources::MangaDexSource)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// REST API root
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Host serving cover images
    #[serde(default = "default_uploads_base_url")]
    pub uploads_base_url: String,

    /// Translated languages to list chapters for
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Cover thumbnail width; `0` (or `None`) links the original image
    #[serde(default = "default_cover_size")]
    pub cover_size: Option<u32>,

    /// Ask the image server for a port-443 delivery node
    #[serde(default = "default_true")]
    pub force_port_443: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            uploads_base_url: default_uploads_base_url(),
            languages: default_languages(),
            cover_size: default_cover_size(),
            force_port_443: true,
        }
    }
}

impl SourceConfig {
    /// Point both the API and cover hosts at `base_url` (used with mock servers)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            api_base_url: base_url.clone(),
            uploads_base_url: base_url,
            ..Default::default()
        }
    }

    /// Set the chapter languages
    pub fn languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }
}

fn default_api_base_url() -> String {
    "https://api.mangadex.org".to_string()
}

fn default_uploads_base_url() -> String {
    "https://uploads.mangadex.org".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_cover_size() -> Option<u32> {
    Some(512)
}

fn default_true() -> bool {
    true
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Overrides the `name/version` user agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}

/// Get the configuration from environment overrides and defaults only
pub fn get_config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

/// Locate a config file in the working directory or the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("mangadex-adapter").join("config.toml"))
        .filter(|path| path.is_file())
}
