//! Error taxonomy for the aggregation run.
//!
//! Every per-source and per-article unit of work returns one of these types
//! instead of panicking or swallowing failures silently. The pipeline decides
//! what substitute value each failure turns into:
//!
//! | Error | Raised by | Substitute |
//! |-------|-----------|------------|
//! | [`SourceFetchError`] | [`crate::feeds::fetch`] | source contributes zero entries |
//! | [`EntryIncomplete`] | [`crate::normalize::normalize`] | entry is excluded |
//! | [`ExtractError::ArticleFetch`] | [`crate::extract::extract`] | [`CONTENT_UNAVAILABLE`] |
//! | [`ExtractError::Insufficient`] | [`crate::extract::extract_body`] | [`NOT_EXTRACTABLE`] |

use thiserror::Error;

/// Body substituted when an article page could not be retrieved.
pub const CONTENT_UNAVAILABLE: &str =
    "Content unavailable. Open the original link to read this article.";

/// Body substituted when a page was retrieved but too little text survived extraction.
pub const NOT_EXTRACTABLE: &str =
    "Could not extract the article text automatically. Use the original link to read it.";

/// A failed network retrieval.
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned {bytes} bytes (limit {limit})")]
    TooLarge { url: String, bytes: u64, limit: u64 },
}

impl RetrieveError {
    /// Whether retrying the same request could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RetrieveError::Transport { .. } => true,
            RetrieveError::Status { status, .. } => *status == 429 || *status >= 500,
            RetrieveError::TooLarge { .. } => false,
        }
    }
}

/// One feed source could not be fetched or parsed.
#[derive(Debug, Error)]
pub enum SourceFetchError {
    #[error(transparent)]
    Retrieve(#[from] RetrieveError),

    #[error("unparseable feed: {0}")]
    Parse(String),

    #[error("unsupported feed format (root element <{0}>)")]
    UnsupportedFormat(String),

    #[error("feed fetch did not finish before the run deadline")]
    Deadline,
}

/// A raw entry lacks a field every article needs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryIncomplete {
    #[error("entry has no title")]
    MissingTitle,

    #[error("entry has no link")]
    MissingLink,

    #[error("entry link {0:?} is not an absolute http(s) URL")]
    InvalidLink(String),
}

/// Why an article body fell back to a sentinel.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("article fetch failed: {0}")]
    ArticleFetch(#[from] RetrieveError),

    #[error("only {chars} characters of body text survived extraction")]
    Insufficient { chars: usize },
}

impl ExtractError {
    /// The user-facing body that replaces the article text for this failure class.
    pub fn sentinel(&self) -> &'static str {
        match self {
            ExtractError::ArticleFetch(_) => CONTENT_UNAVAILABLE,
            ExtractError::Insufficient { .. } => NOT_EXTRACTABLE,
        }
    }
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
