//! Syndication document parsing.
//!
//! Three entry-oriented XML formats are accepted, chosen by the document's
//! root element:
//!
//! | Root | Format |
//! |------|--------|
//! | `<rss>` | RSS 2.0 |
//! | `<feed>` | Atom 1.0 |
//! | `<rdf:RDF>` | RSS 1.0 |
//!
//! The document itself is read by `feed_rs`, which tolerates namespaced
//! extension elements (`atom:link`, `media:title`, `itunes:*`) and mixed-content
//! Atom text constructs. HTML named entities that XML does not define
//! (`&rsquo;`, `&nbsp;`, ...) are rewritten to character references first.

use crate::error::SourceFetchError;
use crate::models::{FetchedFeed, RawFeedEntry};
use crate::utils::collapse_whitespace;
use feed_rs::model::{Entry, Link, Text};
use feed_rs::parser;
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::{Captures, Regex};
use scraper::Html;
use std::borrow::Cow;

static NAMED_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").unwrap());

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Parse a syndication document into its title and raw entries.
///
/// # Errors
///
/// [`SourceFetchError::UnsupportedFormat`] when the root element is not one of
/// `rss`, `feed`, or `RDF`; [`SourceFetchError::Parse`] when the XML is
/// malformed or does not have the shape its root promises.
pub fn parse_feed(xml: &str) -> Result<FetchedFeed, SourceFetchError> {
    let xml = xml.trim_start_matches('\u{feff}').trim_start();

    let root = root_element(xml)?;
    if !matches!(root.as_str(), "rss" | "feed" | "RDF") {
        return Err(SourceFetchError::UnsupportedFormat(root));
    }

    let xml = resolve_html_entities(xml);
    let feed = parser::parse(xml.as_bytes())
        .map_err(|e| SourceFetchError::Parse(e.to_string()))?;

    Ok(FetchedFeed {
        title: feed.title.and_then(plain_text),
        entries: feed.entries.into_iter().map(raw_entry).collect(),
    })
}

/// Local name of the first element in the document.
fn root_element(xml: &str) -> Result<String, SourceFetchError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => {
                return Err(SourceFetchError::Parse(
                    "document has no root element".to_string(),
                ));
            }
            Ok(_) => {}
            Err(e) => return Err(SourceFetchError::Parse(e.to_string())),
        }
    }
}

fn raw_entry(entry: Entry) -> RawFeedEntry {
    let link = entry_link(&entry.links);
    let non_blank = |s: &String| !s.trim().is_empty();
    let summary = entry
        .summary
        .map(|t| t.content)
        .filter(non_blank)
        .or_else(|| entry.content.and_then(|c| c.body).filter(non_blank));

    RawFeedEntry {
        title: entry.title.and_then(plain_text),
        link,
        published: entry.published,
        updated: entry.updated,
        summary,
    }
}

/// The alternate link (no `rel` or `rel="alternate"`), else the first non-blank one.
fn entry_link(links: &[Link]) -> Option<String> {
    let usable = || links.iter().filter(|l| !l.href.trim().is_empty());
    usable()
        .find(|l| {
            l.rel
                .as_deref()
                .is_none_or(|rel| rel.is_empty() || rel.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| usable().next())
        .map(|l| l.href.trim().to_string())
}

/// Title text with any markup removed; `None` when nothing is left.
fn plain_text(text: Text) -> Option<String> {
    let content = if text.content_type.subty() == "plain" {
        collapse_whitespace(&text.content)
    } else {
        let fragment = Html::parse_fragment(&text.content);
        collapse_whitespace(&fragment.root_element().text().collect::<Vec<_>>().join(" "))
    };
    Some(content).filter(|c| !c.is_empty())
}

/// Rewrite HTML named entities into numeric character references.
///
/// The five XML entities are left alone, unknown names are escaped so they
/// survive as literal text, and CDATA sections are copied untouched.
fn resolve_html_entities(xml: &str) -> Cow<'_, str> {
    if !NAMED_ENTITY.is_match(xml) {
        return Cow::Borrowed(xml);
    }

    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(start) = rest.find(CDATA_OPEN) {
        let (markup, cdata) = rest.split_at(start);
        out.push_str(&replace_entities(markup));
        match cdata.find(CDATA_CLOSE) {
            Some(end) => {
                let end = end + CDATA_CLOSE.len();
                out.push_str(&cdata[..end]);
                rest = &cdata[end..];
            }
            None => {
                out.push_str(cdata);
                rest = "";
            }
        }
    }
    out.push_str(&replace_entities(rest));
    Cow::Owned(out)
}

fn replace_entities(markup: &str) -> Cow<'_, str> {
    NAMED_ENTITY.replace_all(markup, |caps: &Captures| {
        let name = &caps[1];
        match name {
            "amp" | "lt" | "gt" | "quot" | "apos" => caps[0].to_string(),
            _ => match html_entity(name) {
                Some(code) => format!("&#{code};"),
                None => format!("&amp;{name};"),
            },
        }
    })
}

/// Code points of the HTML entities that turn up in feed text.
fn html_entity(name: &str) -> Option<u32> {
    let code = match name {
        "nbsp" => 160,
        "iexcl" => 161,
        "cent" => 162,
        "pound" => 163,
        "yen" => 165,
        "sect" => 167,
        "copy" => 169,
        "laquo" => 171,
        "reg" => 174,
        "deg" => 176,
        "plusmn" => 177,
        "middot" => 183,
        "raquo" => 187,
        "frac12" => 189,
        "iquest" => 191,
        "Agrave" => 192,
        "Aacute" => 193,
        "Auml" => 196,
        "Ccedil" => 199,
        "Eacute" => 201,
        "Ntilde" => 209,
        "Ouml" => 214,
        "times" => 215,
        "Uuml" => 220,
        "szlig" => 223,
        "agrave" => 224,
        "aacute" => 225,
        "acirc" => 226,
        "auml" => 228,
        "ccedil" => 231,
        "egrave" => 232,
        "eacute" => 233,
        "ecirc" => 234,
        "iacute" => 237,
        "ntilde" => 241,
        "oacute" => 243,
        "ouml" => 246,
        "divide" => 247,
        "uacute" => 250,
        "uuml" => 252,
        "ndash" => 8211,
        "mdash" => 8212,
        "lsquo" => 8216,
        "rsquo" => 8217,
        "sbquo" => 8218,
        "ldquo" => 8220,
        "rdquo" => 8221,
        "bdquo" => 8222,
        "bull" => 8226,
        "hellip" => 8230,
        "prime" => 8242,
        "euro" => 8364,
        "trade" => 8482,
        "larr" => 8592,
        "rarr" => 8594,
        _ => return None,
    };
    Some(code)
}
