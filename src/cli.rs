//! Command-line interface definitions for Feed Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option overrides the corresponding key from the YAML configuration.

use crate::config::AppConfig;
use crate::models::FeedSource;
use clap::Parser;

/// Command-line arguments for the Feed Digest application.
///
/// # Examples
///
/// ```sh
/// # Built-in feeds, defaults everywhere
/// feed_digest
///
/// # Custom config, different output location
/// feed_digest -c ./feeds.yaml -o ./public/index.html
///
/// # Two ad-hoc feeds, headlines only
/// feed_digest --feed https://example.com/rss.xml --feed https://example.org/atom --no-extract
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Path of the generated HTML page
    #[arg(short, long)]
    pub output: Option<String>,

    /// Also write the aggregated articles as JSON to this path
    #[arg(short, long)]
    pub json_output: Option<String>,

    /// Maximum entries taken from each feed
    #[arg(short = 'n', long)]
    pub items_per_source: Option<usize>,

    /// Skip fetching article pages; use feed summaries as bodies
    #[arg(long)]
    pub no_extract: bool,

    /// Feed URL to aggregate (repeatable; replaces the configured sources)
    #[arg(long = "feed", value_name = "URL")]
    pub feeds: Vec<String>,
}

impl Cli {
    /// Overlay command-line values onto `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(json) = &self.json_output {
            config.json_output_path = Some(json.clone());
        }
        if let Some(n) = self.items_per_source {
            config.items_per_source = n;
        }
        if self.no_extract {
            config.extraction_enabled = false;
        }
        if !self.feeds.is_empty() {
            config.sources = self.feeds.iter().map(FeedSource::new).collect();
        }
    }
}
