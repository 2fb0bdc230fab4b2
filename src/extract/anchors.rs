//! Anchor location and link classification.
//!
//! Anchors are found with a pattern over the raw markup rather than a parse
//! tree because the associator needs each anchor's byte offset in the source.
//! The inner markup of an anchor is flattened through `scraper`, which strips
//! nested tags and decodes entities.

use crate::models::Anchor;
use crate::utils::normalize_ws;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

static ANCHOR_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*>(.*?)</a\s*>"#)
        .expect("anchor pattern is valid")
});

/// Pagination and other page-control link texts.
static NAVIGATION_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:nästa|föregående|next|previous|prev|första|sista|first|last|«|»|‹|›|<|>|<<|>>)(?:\s|$)")
        .expect("navigation pattern is valid")
});

/// Texts that label a file link rather than name a document.
static DOWNLOAD_LABEL_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ladda\s*ner|download").expect("download pattern is valid"));

const DOCUMENT_SUFFIXES: &[&str] = &[".pdf", ".doc", ".docx", ".odt", ".rtf"];

/// Find every `<a href=...>...</a>` in document order.
///
/// Same-page jumps (`#...`) and `javascript:` links are dropped here. Anchors
/// whose flattened text is empty are kept because they may still point at a
/// document file; [`Anchor::is_title_candidate`] keeps them out of titles.
pub fn locate_anchors(html: &str) -> Vec<Anchor> {
    ANCHOR_RX
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let href = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
            if href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:") {
                return None;
            }
            let inner = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
            Some(Anchor {
                href: decode_href(href),
                text: flatten_text(inner),
                position: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Strip tags and entities from anchor content and collapse whitespace.
pub fn flatten_text(inner: &str) -> String {
    if !inner.contains('<') && !inner.contains('&') {
        return normalize_ws(inner);
    }
    let fragment = Html::parse_fragment(inner);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    normalize_ws(&text)
}

fn decode_href(href: &str) -> String {
    href.replace("&amp;", "&")
}

impl Anchor {
    /// Whether this anchor's text can serve as a document title.
    pub fn is_title_candidate(&self) -> bool {
        !self.text.is_empty() && !is_navigation(&self.text) && !is_download_label(&self.text)
    }

    /// Whether the target looks like a document file or a download endpoint.
    pub fn is_document_link(&self) -> bool {
        is_document_href(&self.href)
    }
}

pub fn is_navigation(text: &str) -> bool {
    NAVIGATION_RX.is_match(text)
}

pub fn is_download_label(text: &str) -> bool {
    DOWNLOAD_LABEL_RX.is_match(text)
}

/// `.pdf` (or another office suffix) on the path, a `/documents/` segment, or a
/// `download` endpoint.
pub fn is_document_href(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    DOCUMENT_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
        || path.contains("/documents/")
        || lower.contains("download")
}
