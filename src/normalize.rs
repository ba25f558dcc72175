//! Entry Normalizer: turn a [`RawFeedEntry`] into an [`ArticleDraft`].
//!
//! Fallback rules:
//! - `published_at`: the entry's published timestamp, else its updated
//!   timestamp, else the current wall-clock time
//! - `source_label`: the feed's own title, else `"Unknown"`
//! - `summary`: markup stripped, whitespace collapsed, cut to
//!   [`SUMMARY_CHARS`] characters
//!
//! Entries without a title or a usable link are refused with
//! [`EntryIncomplete`].

use crate::error::EntryIncomplete;
use crate::models::{ArticleDraft, RawFeedEntry};
use crate::utils::{collapse_whitespace, truncate_chars};
use chrono::Utc;
use scraper::Html;
use url::Url;

/// Label used when a feed does not name itself.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Feed summaries longer than this are truncated.
pub const SUMMARY_CHARS: usize = 200;

/// Normalize one raw entry from the feed labelled `source_label`.
///
/// # Errors
///
/// [`EntryIncomplete`] when the title or link is missing or blank, or the
/// link is not an absolute `http`/`https` URL.
pub fn normalize(entry: RawFeedEntry, source_label: &str) -> Result<ArticleDraft, EntryIncomplete> {
    let title = entry
        .title
        .as_deref()
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .ok_or(EntryIncomplete::MissingTitle)?;

    let link = entry
        .link
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or(EntryIncomplete::MissingLink)?;
    let link = match Url::parse(link) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
        _ => return Err(EntryIncomplete::InvalidLink(link.to_string())),
    };

    let published_at = entry
        .published
        .or(entry.updated)
        .unwrap_or_else(Utc::now);

    Ok(ArticleDraft {
        title,
        link,
        published_at,
        source_label: source_label.to_string(),
        summary: entry.summary.as_deref().and_then(plain_summary),
    })
}

/// The label for a feed whose document title is `feed_title`.
pub fn source_label(feed_title: Option<&str>) -> String {
    feed_title
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
}

/// Strip markup from a feed summary and shorten it.
fn plain_summary(raw: &str) -> Option<String> {
    let fragment = Html::parse_fragment(raw);
    let text = collapse_whitespace(&fragment.root_element().text().collect::<Vec<_>>().join(" "));
    if text.is_empty() {
        None
    } else {
        Some(truncate_chars(&text, SUMMARY_CHARS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry() -> RawFeedEntry {
        RawFeedEntry {
            title: Some("A headline".to_string()),
            link: Some("https://example.com/story".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_dates_fall_back_to_now() {
        let before = Utc::now();
        let draft = normalize(entry(), "Example").unwrap();
        let after = Utc::now();
        assert!(draft.published_at >= before - Duration::seconds(1));
        assert!(draft.published_at <= after + Duration::seconds(1));
    }

    #[test]
    fn test_published_preferred_over_updated() {
        let published = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let updated = Utc.with_ymd_and_hms(2025, 5, 3, 0, 0, 0).unwrap();
        let raw = RawFeedEntry {
            published: Some(published),
            updated: Some(updated),
            ..entry()
        };
        assert_eq!(normalize(raw, "Example").unwrap().published_at, published);
    }

    #[test]
    fn test_updated_used_when_published_missing() {
        let updated = Utc.with_ymd_and_hms(2025, 5, 3, 0, 0, 0).unwrap();
        let raw = RawFeedEntry {
            updated: Some(updated),
            ..entry()
        };
        assert_eq!(normalize(raw, "Example").unwrap().published_at, updated);
    }

    #[test]
    fn test_incomplete_entries_are_excluded() {
        let entries = vec![
            entry(),
            RawFeedEntry { title: None, ..entry() },
            RawFeedEntry { link: None, ..entry() },
            RawFeedEntry { title: Some("   ".to_string()), ..entry() },
            entry(),
        ];
        let drafts: Vec<_> = entries
            .into_iter()
            .filter_map(|e| normalize(e, "Example").ok())
            .collect();
        assert_eq!(drafts.len(), 2);
    }

    #[test]
    fn test_incomplete_error_kinds() {
        assert_eq!(
            normalize(RawFeedEntry { title: None, ..entry() }, "x").unwrap_err(),
            EntryIncomplete::MissingTitle
        );
        assert_eq!(
            normalize(RawFeedEntry { link: Some(" ".to_string()), ..entry() }, "x").unwrap_err(),
            EntryIncomplete::MissingLink
        );
        assert_eq!(
            normalize(RawFeedEntry { link: Some("/relative".to_string()), ..entry() }, "x")
                .unwrap_err(),
            EntryIncomplete::InvalidLink("/relative".to_string())
        );
        assert!(matches!(
            normalize(RawFeedEntry { link: Some("javascript:alert(1)".to_string()), ..entry() }, "x"),
            Err(EntryIncomplete::InvalidLink(_))
        ));
    }

    #[test]
    fn test_title_whitespace_is_collapsed() {
        let raw = RawFeedEntry {
            title: Some("  Multi\n   line\ttitle ".to_string()),
            ..entry()
        };
        assert_eq!(normalize(raw, "Example").unwrap().title, "Multi line title");
    }

    #[test]
    fn test_source_label_fallback() {
        assert_eq!(source_label(Some("BBC News")), "BBC News");
        assert_eq!(source_label(Some("  ")), UNKNOWN_SOURCE);
        assert_eq!(source_label(None), UNKNOWN_SOURCE);
    }

    #[test]
    fn test_summary_is_stripped_and_truncated() {
        let raw = RawFeedEntry {
            summary: Some(format!("<p>Hello <b>world</b></p><p>{}</p>", "x".repeat(300))),
            ..entry()
        };
        let summary = normalize(raw, "Example").unwrap().summary.unwrap();
        assert!(summary.starts_with("Hello world x"));
        assert!(summary.ends_with("..."));
        assert!(!summary.contains('<'));
        assert_eq!(summary.chars().count(), SUMMARY_CHARS + 3);
    }

    #[test]
    fn test_markup_only_summary_is_dropped() {
        let raw = RawFeedEntry {
            summary: Some("<img src=\"a.png\">".to_string()),
            ..entry()
        };
        assert_eq!(normalize(raw, "Example").unwrap().summary, None);
    }
}
