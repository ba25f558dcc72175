//! Static HTML page rendering.
//!
//! Produces one self-contained document: a header with the page title and
//! generation time, then one card per article with its source, title link,
//! date, and a collapsible reader view of the extracted body.
//!
//! Titles, source labels, and links are escaped here. Bodies arrive already
//! sanitized by the extractor and are embedded as-is, one `<p>` per
//! blank-line-separated block.

use crate::config::ArticleOrder;
use crate::models::{AggregationResult, ExtractedContent};
use crate::utils::escape_html;
use rand::rng;
use rand::seq::SliceRandom;
use std::error::Error;
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

const STYLE: &str = r#"
    body { font-family: -apple-system, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; background: #f0f2f5; }
    h1 { text-align: center; color: #333; }
    .update-time { text-align: center; color: #666; font-size: 0.9em; margin-bottom: 30px; }
    .card { background: white; padding: 20px; margin-bottom: 15px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
    .source { color: #e74c3c; font-weight: bold; font-size: 0.8em; text-transform: uppercase; }
    .title { display: block; font-size: 1.2em; font-weight: bold; margin: 8px 0; color: #2c3e50; text-decoration: none; }
    .title:hover { color: #3498db; }
    .meta { color: #95a5a6; font-size: 0.85em; }
    details { margin-top: 10px; }
    summary { cursor: pointer; color: #3498db; }
    .reader p { line-height: 1.6; color: #333; }
"#;

/// Render `result` as a complete HTML document.
pub fn render(result: &AggregationResult, page_title: &str, order: ArticleOrder) -> String {
    let mut articles: Vec<&ExtractedContent> = result.articles.iter().collect();
    match order {
        ArticleOrder::Shuffled => articles.shuffle(&mut rng()),
        ArticleOrder::Newest => {
            articles.sort_by(|a, b| b.draft.published_at.cmp(&a.draft.published_at))
        }
    }

    let title = escape_html(page_title);
    let mut html = String::new();
    writeln!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n\
         <div class=\"update-time\">Last updated: {}</div>\n<div id=\"feed-list\">",
        result.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
    .unwrap();

    for article in articles {
        write_card(&mut html, article);
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn write_card(html: &mut String, article: &ExtractedContent) {
    let draft = &article.draft;
    writeln!(
        html,
        "<div class=\"card\">\n<span class=\"source\">{}</span>\n\
         <a href=\"{}\" class=\"title\" target=\"_blank\" rel=\"noopener\">{}</a>\n\
         <div class=\"meta\">{}</div>\n<details>\n<summary>Read here</summary>\n<div class=\"reader\">",
        escape_html(&draft.source_label),
        escape_html(&draft.link),
        escape_html(&draft.title),
        draft.published_at.format("%Y-%m-%d %H:%M"),
    )
    .unwrap();

    for block in article.body.split("\n\n").filter(|b| !b.trim().is_empty()) {
        writeln!(html, "<p>{block}</p>").unwrap();
    }

    html.push_str("</div>\n</details>\n</div>\n");
}

/// Write the rendered page to `path`, replacing any previous file.
#[instrument(level = "info", skip_all, fields(%path))]
pub async fn write_page(html: &str, path: &str) -> Result<(), Box<dyn Error>> {
    fs::write(path, html).await?;
    info!(bytes = html.len(), "Wrote HTML page");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleDraft;
    use chrono::{TimeZone, Utc};

    fn article(title: &str, day: u32, body: &str) -> ExtractedContent {
        ExtractedContent {
            draft: ArticleDraft {
                title: title.to_string(),
                link: format!("https://example.com/{day}"),
                published_at: Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0).unwrap(),
                source_label: "Example".to_string(),
                summary: None,
            },
            body: body.to_string(),
        }
    }

    #[test]
    fn test_render_newest_first() {
        let result = AggregationResult::new(vec![
            article("Older", 1, "old body"),
            article("Newer", 5, "new body"),
        ]);
        let html = render(&result, "My Feed", ArticleOrder::Newest);
        let newer = html.find("Newer").unwrap();
        let older = html.find("Older").unwrap();
        assert!(newer < older);
        assert!(html.contains("<title>My Feed</title>"));
        assert!(html.contains("2025-05-05 12:00"));
    }

    #[test]
    fn test_render_escapes_metadata_and_splits_body() {
        let result = AggregationResult::new(vec![article(
            "<script>alert(1)</script>",
            2,
            "First block.\n\nSecond &quot;block&quot;.",
        )]);
        let html = render(&result, "Feed", ArticleOrder::Shuffled);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("<p>First block.</p>"));
        assert!(html.contains("<p>Second &quot;block&quot;.</p>"));
    }

    #[test]
    fn test_render_shuffled_keeps_every_article() {
        let result = AggregationResult::new(
            (1..=9).map(|d| article(&format!("Story {d}"), d, "body")).collect(),
        );
        let html = render(&result, "Feed", ArticleOrder::Shuffled);
        for d in 1..=9 {
            assert!(html.contains(&format!("Story {d}")));
        }
        assert_eq!(html.matches("class=\"card\"").count(), 9);
    }

    #[test]
    fn test_render_empty_result() {
        let html = render(&AggregationResult::new(vec![]), "Feed", ArticleOrder::Shuffled);
        assert!(html.contains("<div id=\"feed-list\">"));
        assert!(!html.contains("class=\"card\""));
    }

    #[tokio::test]
    async fn test_write_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        write_page("<html></html>", path.to_str().unwrap()).await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html></html>");
    }
}
