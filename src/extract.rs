//! Article Text Extractor: recover the readable body of an article page.
//!
//! The heuristic is deliberately simple and runs on untrusted markup:
//!
//! 1. **Strip**: detach every non-content subtree (scripts, styles,
//!    navigation, headers, footers, embedded frames, asides) from the parsed
//!    document. Nothing below this point can see boilerplate.
//! 2. **Harvest**: take the text of each remaining `<p>`, whitespace-collapsed,
//!    and keep it only if it is longer than [`MIN_PARAGRAPH_CHARS`].
//! 3. **Join**: concatenate survivors in document order with a blank line
//!    between them. Fewer than [`MIN_BODY_CHARS`] characters in total counts
//!    as a failed extraction.
//! 4. **Sanitize**: escape HTML-significant characters, quotes included.
//!
//! [`extract_body`] is the pure part (markup in, text out). [`extract`] adds
//! the network retrieval and never fails: every error becomes a sentinel body.

use crate::error::{ExtractError, NOT_EXTRACTABLE};
use crate::http::Retrieve;
use crate::utils::{collapse_whitespace, escape_html};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

/// Paragraphs must be longer than this (in characters) to count as body text.
pub const MIN_PARAGRAPH_CHARS: usize = 40;

/// Joined body text shorter than this (in characters) is treated as a failed extraction.
pub const MIN_BODY_CHARS: usize = 200;

static BOILERPLATE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script, style, noscript, nav, header, footer, iframe, aside").unwrap()
});

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Fetch `url` and return its sanitized body text, or a sanitized sentinel.
///
/// Retrieval failures yield [`crate::error::CONTENT_UNAVAILABLE`]; pages with
/// too little text yield [`NOT_EXTRACTABLE`].
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn extract<R: Retrieve>(retriever: &R, url: &str) -> String {
    match try_extract(retriever, url).await {
        Ok(body) => {
            debug!(chars = body.chars().count(), "Extracted article body");
            sanitize(&body)
        }
        Err(e) => {
            match &e {
                ExtractError::ArticleFetch(_) => warn!(error = %e, "Article fetch failed"),
                ExtractError::Insufficient { .. } => debug!(error = %e, "Extraction insufficient"),
            }
            sanitize(e.sentinel())
        }
    }
}

/// Fetch `url` and run [`extract_body`] on the response, without sanitizing.
pub async fn try_extract<R: Retrieve>(retriever: &R, url: &str) -> Result<String, ExtractError> {
    let html = retriever.retrieve(url).await?;
    extract_body(&html)
}

/// Extract the main body text from an HTML document.
///
/// # Errors
///
/// [`ExtractError::Insufficient`] when the joined paragraphs are shorter than
/// [`MIN_BODY_CHARS`].
pub fn extract_body(html: &str) -> Result<String, ExtractError> {
    let mut document = Html::parse_document(html);
    strip_boilerplate(&mut document);

    let body = document
        .select(&PARAGRAPH)
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect::<Vec<_>>()
        .join("\n\n");

    let chars = body.chars().count();
    if chars < MIN_BODY_CHARS {
        return Err(ExtractError::Insufficient { chars });
    }
    Ok(body)
}

/// Detach every boilerplate subtree from the document tree.
fn strip_boilerplate(document: &mut Html) {
    let ids: Vec<_> = document.select(&BOILERPLATE).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Neutralize characters that could break out of markup content or attributes.
pub fn sanitize(text: &str) -> String {
    escape_html(text)
}

/// Body for an article whose page is not fetched: its feed summary, else the
/// could-not-extract sentinel.
pub fn body_from_summary(summary: Option<&str>) -> String {
    match summary.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => sanitize(s),
        None => sanitize(NOT_EXTRACTABLE),
    }
}
