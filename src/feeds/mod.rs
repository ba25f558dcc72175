//! Feed Fetcher: retrieve one feed source and parse it into raw entries.
//!
//! Fetching is a two-step operation:
//!
//! 1. **Retrieval**: download the syndication document through a [`Retrieve`]
//!    implementation (retries and timeouts are the retriever's business)
//! 2. **Parsing**: turn the document into a [`FetchedFeed`] via [`parse`]
//!
//! Only the first `cap` entries are kept; later entries are dropped, not
//! queued. Failure is returned to the caller, which decides that the source
//! contributes nothing to the run.

pub mod parse;

use crate::error::SourceFetchError;
use crate::http::Retrieve;
use crate::models::{FeedSource, FetchedFeed};
use crate::utils::truncate_for_log;
use tracing::{debug, info, instrument};

/// Fetch `source` and return at most `cap` of its entries, in document order.
///
/// # Errors
///
/// Returns [`SourceFetchError`] when the document cannot be retrieved or
/// parsed.
#[instrument(level = "info", skip_all, fields(source = %source))]
pub async fn fetch<R: Retrieve>(
    retriever: &R,
    source: &FeedSource,
    cap: usize,
) -> Result<FetchedFeed, SourceFetchError> {
    let xml = retriever.retrieve(source.url()).await?;
    debug!(bytes = xml.len(), "Retrieved feed document");

    let mut feed = parse::parse_feed(&xml).inspect_err(|e| {
        debug!(error = %e, preview = %truncate_for_log(&xml, 200), "Feed document did not parse");
    })?;

    let available = feed.entries.len();
    feed.entries.truncate(cap);
    info!(
        title = feed.title.as_deref().unwrap_or(""),
        available,
        kept = feed.entries.len(),
        "Fetched feed"
    );
    Ok(feed)
}
