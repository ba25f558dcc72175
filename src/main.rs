//! # Feed Digest
//!
//! Aggregates articles from a fixed set of syndication feeds, extracts the
//! readable body text of each linked article, and publishes everything as a
//! single static HTML page with an embedded reader view.
//!
//! ## Usage
//!
//! ```sh
//! feed_digest -c ./feeds.yaml -o ./public/index.html
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Fetching**: Download and parse every configured feed (concurrently, capped per feed)
//! 2. **Normalizing**: Turn raw entries into article drafts, dropping incomplete ones
//! 3. **Extracting**: Fetch each article page and pull out its main text
//! 4. **Output**: Render the HTML page (and optionally a JSON file)
//!
//! A failing feed or article never aborts the run; it just contributes less.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extract;
mod feeds;
mod http;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod utils;

use cli::Cli;
use config::AppConfig;
use http::{HttpRetriever, RetryRetrieve};
use outputs::{html, json};
use pipeline::Pipeline;
use utils::ensure_writable_parent;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("feed_digest starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;
    info!(
        sources = config.sources.len(),
        items_per_source = config.items_per_source,
        extraction_enabled = config.extraction_enabled,
        workers = config.workers,
        "Configuration ready"
    );

    // Early check: fail before any network work if the page cannot be written
    if let Err(e) = ensure_writable_parent(&config.output_path).await {
        error!(
            path = %config.output_path,
            error = %e,
            "Output location is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Aggregate ----
    let http = HttpRetriever::new(
        &config.user_agent,
        config.request_timeout(),
        config.max_body_bytes,
    )?;
    let feeds = RetryRetrieve::new(
        http.clone(),
        config.feed_retries,
        std::time::Duration::from_secs(1),
    );
    let pipeline = Pipeline::new(config.pipeline(), feeds, http);
    let result = pipeline.run(&config.sources).await;
    if result.is_empty() {
        warn!("No articles were collected; the page will be empty");
    }

    // ---- Output ----
    let page = html::render(&result, &config.page_title, config.order);
    html::write_page(&page, &config.output_path).await?;

    if let Some(json_path) = &config.json_output_path {
        if let Err(e) = json::write_result(&result, json_path).await {
            error!(path = %json_path, error = %e, "Failed to write JSON output");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        articles = result.len(),
        path = %config.output_path,
        "Execution complete"
    );

    Ok(())
}
