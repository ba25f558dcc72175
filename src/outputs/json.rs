//! JSON output of the aggregated article set.
//!
//! Writes the [`AggregationResult`] exactly as the renderer received it, so
//! other tools can consume a run without scraping the HTML page.
//!
//! # Output Structure
//!
//! ```text
//! {
//!   "generated_at": "2025-05-06T14:30:00Z",
//!   "articles": [
//!     { "title": "...", "link": "...", "published_at": "...",
//!       "source_label": "...", "summary": "...", "body": "..." }
//!   ]
//! }
//! ```

use crate::models::AggregationResult;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `result` to pretty-printed JSON at `path`.
///
/// Missing parent directories are created.
#[instrument(level = "info", skip_all, fields(%path))]
pub async fn write_result(result: &AggregationResult, path: &str) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(result)?;

    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(articles = result.len(), "Wrote JSON file");
    Ok(())
}
