//! Aggregation Pipeline: fetch, normalize, and extract across all sources.
//!
//! # Stages
//!
//! 1. **Fetch**: every source is fetched concurrently (at most `workers` at a
//!    time). A failed source logs a warning and contributes nothing.
//! 2. **Normalize**: each raw entry becomes an [`ArticleDraft`] or is dropped.
//! 3. **Deduplicate**: drafts sharing a link collapse to the first one seen,
//!    in configured source order.
//! 4. **Extract**: when enabled, article bodies are fetched concurrently with
//!    the same `workers` bound applied across all sources at once.
//!
//! One deadline covers the whole run. Work that misses it degrades exactly
//! like a failure of the same kind, so whatever finished in time is kept.

use crate::error::{CONTENT_UNAVAILABLE, SourceFetchError};
use crate::extract::{self, body_from_summary, sanitize};
use crate::feeds;
use crate::http::Retrieve;
use crate::models::{AggregationResult, ArticleDraft, ExtractedContent, FeedSource};
use crate::normalize::{normalize, source_label};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, instrument, warn};

/// Knobs for one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Entries consumed per feed; later entries are ignored.
    pub items_per_source: usize,
    /// Whether article pages are fetched at all.
    pub extraction_enabled: bool,
    /// Concurrent network operations per stage.
    pub workers: usize,
    /// Upper bound on the wall-clock time of one run.
    pub run_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            items_per_source: 5,
            extraction_enabled: true,
            workers: 8,
            run_timeout: Duration::from_secs(120),
        }
    }
}

/// The aggregation pipeline.
///
/// `feeds` retrieves syndication documents and `articles` retrieves article
/// pages; they are separate so feed fetches can be retried without retrying
/// article fetches.
#[derive(Debug)]
pub struct Pipeline<F, A> {
    config: PipelineConfig,
    feeds: F,
    articles: A,
}

impl<F, A> Pipeline<F, A>
where
    F: Retrieve,
    A: Retrieve,
{
    pub fn new(config: PipelineConfig, feeds: F, articles: A) -> Self {
        Self {
            config,
            feeds,
            articles,
        }
    }

    /// Run one aggregation over `sources`.
    ///
    /// Never fails: an empty result is the worst case.
    #[instrument(level = "info", skip_all, fields(sources = sources.len()))]
    pub async fn run(&self, sources: &[FeedSource]) -> AggregationResult {
        let t0 = Instant::now();
        let deadline = t0 + self.config.run_timeout;
        let workers = self.config.workers.max(1);

        let drafts: Vec<ArticleDraft> = stream::iter(sources)
            .map(|source| self.collect_source(source, deadline))
            .buffered(workers)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect();

        let total = drafts.len();
        let drafts: Vec<ArticleDraft> = drafts.into_iter().unique_by(|d| d.link.clone()).collect();
        info!(
            drafts = drafts.len(),
            duplicates = total - drafts.len(),
            "Collected article drafts"
        );

        let articles: Vec<ExtractedContent> = if self.config.extraction_enabled {
            stream::iter(drafts)
                .map(|draft| self.extract_draft(draft, deadline))
                .buffer_unordered(workers)
                .collect()
                .await
        } else {
            drafts
                .into_iter()
                .map(|draft| {
                    let body = body_from_summary(draft.summary.as_deref());
                    ExtractedContent { draft, body }
                })
                .collect()
        };

        info!(
            articles = articles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Aggregation run complete"
        );
        AggregationResult::new(articles)
    }

    /// Fetch and normalize one source. Failures yield no drafts.
    async fn collect_source(&self, source: &FeedSource, deadline: Instant) -> Vec<ArticleDraft> {
        let fetched = timeout_at(
            deadline,
            feeds::fetch(&self.feeds, source, self.config.items_per_source),
        )
        .await
        .unwrap_or(Err(SourceFetchError::Deadline));

        let feed = match fetched {
            Ok(feed) => feed,
            Err(e) => {
                warn!(%source, error = %e, "Feed fetch failed; source contributes no articles");
                return Vec::new();
            }
        };

        let label = source_label(feed.title.as_deref());
        feed.entries
            .into_iter()
            .filter_map(|entry| match normalize(entry, &label) {
                Ok(draft) => Some(draft),
                Err(e) => {
                    debug!(%source, error = %e, "Excluding incomplete entry");
                    None
                }
            })
            .collect()
    }

    /// Pair a draft with its extracted body.
    async fn extract_draft(&self, draft: ArticleDraft, deadline: Instant) -> ExtractedContent {
        let body = match timeout_at(deadline, extract::extract(&self.articles, &draft.link)).await {
            Ok(body) => body,
            Err(_) => {
                warn!(link = %draft.link, "Extraction missed the run deadline");
                sanitize(CONTENT_UNAVAILABLE)
            }
        };
        ExtractedContent { draft, body }
    }
}
