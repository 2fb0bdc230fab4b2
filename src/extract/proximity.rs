//! Binding anchors to dates by how close they sit in the markup.
//!
//! Search result pages carry no structure tying a title to its meeting date,
//! so the nearest date token is the only signal. Two strategies exist:
//!
//! | Mode | Walks | Title | Date |
//! |------|-------|-------|------|
//! | [`AssociationMode::Anchor`] | every title-like anchor | the anchor itself | nearest token in the window |
//! | [`AssociationMode::Date`] | every date token | first title-like anchor in the window | the token itself |
//!
//! Anchor mode is the default. Date mode suits pages where a handful of links
//! sit among many dates; [`AssociationMode::Auto`] picks it whenever there are
//! fewer title candidates than date tokens. Either way the result is a best
//! guess and neighbouring entries can occasionally swap dates.

use super::ExtractConfig;
use super::dates::scan_dates;
use crate::models::{Anchor, DateToken, Item};
use crate::utils::window_bounds;
use serde::Deserialize;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AssociationMode {
    #[default]
    Anchor,
    Date,
    Auto,
}

/// Resolve `href` against the site base. Unresolvable links become `None`.
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    base.join(href).ok()
}

/// The date token closest to `target`; on equal distance the earlier one.
pub fn nearest_date(window: &str, window_start: usize, target: usize) -> Option<DateToken> {
    scan_dates(window, window_start).min_by_key(|token| (token.offset.abs_diff(target), token.offset))
}

/// Resolve which mode to run for this page.
pub fn choose_mode(mode: AssociationMode, anchors: &[Anchor], html: &str) -> AssociationMode {
    match mode {
        AssociationMode::Auto => {
            let titles = anchors.iter().filter(|a| a.is_title_candidate()).count();
            let dates = scan_dates(html, 0).count();
            let chosen = if titles < dates {
                AssociationMode::Date
            } else {
                AssociationMode::Anchor
            };
            debug!(titles, dates, ?chosen, "Picked association mode");
            chosen
        }
        fixed => fixed,
    }
}

/// One candidate item per title-like anchor, dated by the nearest token.
///
/// A document-shaped anchor is both the page link and the download link.
/// Otherwise the download link is the nearest document-shaped anchor in the
/// same window, which may have empty or "Ladda ner" text.
///
/// An anchor that ends up with neither a date nor a document link is site
/// chrome (menus, footers, pagers) and produces no item.
///
/// # Arguments
///
/// * `html` - the whole page, which anchor offsets and windows refer to
/// * `anchors` - every anchor on the page, including ones that only ever
///   serve as download links
/// * `config` - base URL for resolving hrefs and the window span
///
/// # Returns
///
/// Items in anchor order, duplicates included.
pub fn associate_by_anchor(html: &str, anchors: &[Anchor], config: &ExtractConfig) -> Vec<Item> {
    anchors
        .iter()
        .filter(|anchor| anchor.is_title_candidate())
        .map(|anchor| {
            let (start, end) = window_bounds(html, anchor.position, config.window_span);
            let date = nearest_date(&html[start..end], start, anchor.position);
            let page_url = resolve(&config.base_url, &anchor.href);
            let download_url = if anchor.is_document_link() {
                page_url.clone()
            } else {
                nearest_document_link(anchors, anchor, start, end, &config.base_url)
            };
            Item {
                title: Some(anchor.text.clone()),
                page_url,
                download_url,
                date: date.map(|token| token.date),
                source_position: anchor.position,
            }
        })
        .filter(|item| item.is_retainable() && looks_like_result(item))
        .collect()
}

fn looks_like_result(item: &Item) -> bool {
    item.date.is_some() || item.download_url.is_some()
}

fn nearest_document_link(
    anchors: &[Anchor],
    origin: &Anchor,
    start: usize,
    end: usize,
    base: &Url,
) -> Option<Url> {
    anchors
        .iter()
        .filter(|a| a.position != origin.position)
        .filter(|a| a.position >= start && a.position < end)
        .filter(|a| a.is_document_link())
        .filter_map(|a| resolve(base, &a.href).map(|url| (a.position, url)))
        .min_by_key(|(position, _)| (position.abs_diff(origin.position), *position))
        .map(|(_, url)| url)
}

/// One candidate item per date token, titled by the first title-like anchor
/// lying wholly inside the window around it.
///
/// The download link comes from a second pass over the same window and
/// ignores anchor text, so it may belong to a different anchor than the title.
pub fn associate_by_date(html: &str, anchors: &[Anchor], config: &ExtractConfig) -> Vec<Item> {
    scan_dates(html, 0)
        .map(|token| {
            let (start, end) = window_bounds(html, token.offset, config.window_span);
            let in_window: Vec<&Anchor> = anchors
                .iter()
                .filter(|a| a.position >= start && a.end <= end)
                .collect();

            let title_anchor = in_window.iter().find(|a| a.is_title_candidate());
            let download_url = in_window
                .iter()
                .filter(|a| a.is_document_link())
                .find_map(|a| resolve(&config.base_url, &a.href));

            Item {
                title: title_anchor.map(|a| a.text.clone()),
                page_url: title_anchor.and_then(|a| resolve(&config.base_url, &a.href)),
                download_url,
                date: Some(token.date),
                source_position: token.offset,
            }
        })
        .filter(Item::is_retainable)
        .collect()
}
