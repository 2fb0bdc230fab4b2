//! Turning one raw search result page into candidate [`Item`]s.
//!
//! The pipeline per page is:
//!
//! 1. [`anchors::locate_anchors`] finds every link with its byte offset
//! 2. [`proximity::choose_mode`] settles anchor- or date-centered association
//! 3. [`proximity`] binds anchors and date tokens found by [`dates`]
//!
//! Nothing here fails: markup that does not match is simply skipped.

pub mod anchors;
pub mod dates;
pub mod proximity;

use crate::models::Item;
use proximity::AssociationMode;
use tracing::debug;
use url::Url;

/// Knobs for a single page extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Origin relative hrefs are resolved against.
    pub base_url: Url,
    /// Bytes searched on either side of an anchor (or date) for its partner.
    pub window_span: usize,
    pub mode: AssociationMode,
}

/// Extract candidate items from `html` in discovery order, duplicates included.
///
/// # Arguments
///
/// * `html` - one raw search result page
/// * `config` - base URL, window span and association mode
///
/// # Returns
///
/// Every item the association produced. The count is what the pagination
/// loop compares against the page size, so links that carry neither a date
/// nor a document (menus, footers) are already left out.
pub fn extract_items(html: &str, config: &ExtractConfig) -> Vec<Item> {
    let anchors = anchors::locate_anchors(html);
    let mode = proximity::choose_mode(config.mode, &anchors, html);
    let items = match mode {
        AssociationMode::Date => proximity::associate_by_date(html, &anchors, config),
        _ => proximity::associate_by_anchor(html, &anchors, config),
    };
    debug!(
        anchors = anchors.len(),
        items = items.len(),
        ?mode,
        bytes = html.len(),
        "Extracted page"
    );
    items
}
