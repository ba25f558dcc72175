//! Runtime configuration and the feed source registry.
//!
//! Configuration is an optional YAML file; every key has a default, so an
//! empty or missing file yields a working setup that aggregates the
//! [`default_sources`]. Command-line flags are applied on top by
//! [`crate::cli::Cli::apply`].
//!
//! ```yaml
//! sources:
//!   - https://feeds.bbci.co.uk/news/rss.xml
//!   - https://news.ycombinator.com/rss
//! items_per_source: 5
//! extraction_enabled: true
//! output_path: ./public/index.html
//! order: newest
//! ```

use crate::error::ConfigError;
use crate::models::FeedSource;
use crate::pipeline::PipelineConfig;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

/// Upper bound on concurrent network operations.
pub const MAX_WORKERS: usize = 16;

/// Sent with every request; many publishers reject clients that do not look like a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Display order of articles in the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleOrder {
    #[default]
    Shuffled,
    Newest,
}

/// Everything the entry point needs for one run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sources: Vec<FeedSource>,
    pub items_per_source: usize,
    pub extraction_enabled: bool,
    pub workers: usize,
    pub request_timeout_secs: u64,
    pub run_timeout_secs: u64,
    pub feed_retries: usize,
    pub max_body_bytes: u64,
    pub user_agent: String,
    pub output_path: String,
    pub json_output_path: Option<String>,
    pub page_title: String,
    pub order: ArticleOrder,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            items_per_source: 5,
            extraction_enabled: true,
            workers: 8,
            request_timeout_secs: 10,
            run_timeout_secs: 120,
            feed_retries: 2,
            max_body_bytes: 5 * 1024 * 1024,
            user_agent: BROWSER_USER_AGENT.to_string(),
            output_path: "index.html".to_string(),
            json_output_path: None,
            page_title: "My Personal Feed".to_string(),
            order: ArticleOrder::Shuffled,
        }
    }
}

/// The built-in feed list used when configuration names none.
pub fn default_sources() -> Vec<FeedSource> {
    [
        "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml",
        "https://feeds.bbci.co.uk/news/rss.xml",
        "https://techcrunch.com/feed/",
        "https://news.ycombinator.com/rss",
    ]
    .into_iter()
    .map(FeedSource::new)
    .collect()
}

impl AppConfig {
    /// Load configuration from `path`, or the defaults when no path is given.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Yaml`] if
    /// it is not valid YAML for this shape.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_string(),
            source,
        })?;
        info!(sources = config.sources.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from YAML text. An empty document yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Reject values that would make a run meaningless.
    ///
    /// An empty source list is allowed: it simply produces an empty page.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.items_per_source == 0 {
            return Err(ConfigError::Invalid("items_per_source must be at least 1".into()));
        }
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::Invalid(format!(
                "workers must be between 1 and {MAX_WORKERS}"
            )));
        }
        if self.request_timeout_secs == 0 || self.run_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        if self.output_path.trim().is_empty() {
            return Err(ConfigError::Invalid("output_path must not be empty".into()));
        }
        Ok(())
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            items_per_source: self.items_per_source,
            extraction_enabled: self.extraction_enabled,
            workers: self.workers,
            run_timeout: Duration::from_secs(self.run_timeout_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
