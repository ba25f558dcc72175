//! Data models for feed sources, entries, and extracted articles.
//!
//! Data moves through the pipeline in this order:
//! - [`FeedSource`]: a configured feed endpoint
//! - [`FetchedFeed`] / [`RawFeedEntry`]: the unnormalized parse of one feed
//! - [`ArticleDraft`]: a normalized entry with every required field present
//! - [`ExtractedContent`]: a draft paired with its sanitized body text
//! - [`AggregationResult`]: everything one run produced, handed to the renderer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A feed endpoint the fetcher resolves to syndication XML.
///
/// Deserialized from a bare URL string so configuration files can list sources
/// as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct FeedSource {
    url: String,
}

impl FeedSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// One entry exactly as the feed described it. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

/// A parsed feed document: its own title plus its entries in document order.
#[derive(Debug, Clone, Default)]
pub struct FetchedFeed {
    pub title: Option<String>,
    pub entries: Vec<RawFeedEntry>,
}

/// A normalized feed entry.
///
/// `title` and `link` are never empty and `published_at` is always set; the
/// normalizer refuses to build a draft otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub source_label: String,
    /// Plain-text teaser taken from the feed, already truncated.
    pub summary: Option<String>,
}

/// A draft paired with the body text shown in the reader view.
///
/// `body` is never empty and is already HTML-escaped, so the renderer may
/// embed it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    #[serde(flatten)]
    pub draft: ArticleDraft,
    pub body: String,
}

/// The output of one aggregation run.
///
/// Articles are in no particular order; the renderer decides display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    pub generated_at: DateTime<Utc>,
    pub articles: Vec<ExtractedContent>,
}

impl AggregationResult {
    pub fn new(articles: Vec<ExtractedContent>) -> Self {
        Self {
            generated_at: Utc::now(),
            articles,
        }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// The set of drafts, for order-independent comparison between runs.
    #[cfg(test)]
    pub fn drafts(&self) -> std::collections::HashSet<&ArticleDraft> {
        self.articles.iter().map(|a| &a.draft).collect()
    }
}
