//! Driving fetch-and-extract cycles over the paginated search endpoint.
//!
//! Pages are fetched strictly one after another starting from page 1, and each
//! page is extracted and fed to the [`Deduplicator`] before the next request,
//! so first-seen order always follows page order.
//!
//! # Stop conditions
//!
//! | Reason | When |
//! |--------|------|
//! | [`StopReason::EmptyPage`] | the page produced no candidate items |
//! | [`StopReason::NoNewItems`] | every candidate on the page was already seen |
//! | [`StopReason::ShortPage`] | offset/limit cursor and fewer items than `page_size` |
//! | [`StopReason::NoNextPage`] | page-number cursor and no "next" marker in the page |
//! | [`StopReason::PageCeiling`] | `max_pages` pages have been fetched |
//!
//! A failed fetch aborts the whole query; pages already gathered are dropped
//! so a failure can never pass for a short result list.

use crate::dedup::Deduplicator;
use crate::error::{Result, ScrapeError};
use crate::extract::{ExtractConfig, extract_items};
use crate::fetch::{PageProtocol, PageRequest, PageSource};
use crate::models::{Item, ResultSet};
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

static REL_NEXT_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)rel\s*=\s*["']?next\b"#).expect("rel=next pattern is valid"));
static NEXT_TEXT_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)>\s*nästa\s*<").expect("next text pattern is valid"));
static PAGE_LINK_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&](?:amp;)?page=(\d+)").expect("page link pattern is valid"));

#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub protocol: PageProtocol,
    pub page_size: usize,
    /// Hard ceiling on pages fetched per query.
    pub max_pages: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EmptyQuery,
    EmptyPage,
    NoNewItems,
    ShortPage,
    NoNextPage,
    PageCeiling,
}

/// What to do after extracting a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue(u32),
    Stop(StopReason),
}

/// Items gathered for one query, deduplicated in discovery order.
#[derive(Debug)]
pub struct Collected {
    pub items: Vec<Item>,
    pub pages_fetched: u32,
    pub stop: StopReason,
}

/// Decide the transition out of `page`.
///
/// # Arguments
///
/// * `raw_items` - candidates extracted from the page before deduplication
/// * `added` - how many of those were new to the running set
/// * `html` - the page itself, consulted for a "next" marker under
///   [`PageProtocol::PageNumber`]
///
/// # Returns
///
/// [`Step::Continue`] with the next page index, or the first stop reason that
/// holds. A page that repeats only known items ends the walk even when it is
/// full, since an upstream that ignores the cursor would otherwise be polled
/// up to `max_pages`.
pub fn next_step(
    config: &PaginationConfig,
    page: u32,
    raw_items: usize,
    added: usize,
    html: &str,
) -> Step {
    if raw_items == 0 {
        return Step::Stop(StopReason::EmptyPage);
    }
    if added == 0 {
        return Step::Stop(StopReason::NoNewItems);
    }
    let last_page = match config.protocol {
        PageProtocol::OffsetLimit => (raw_items < config.page_size).then_some(StopReason::ShortPage),
        PageProtocol::PageNumber => (!has_next_page(html, page)).then_some(StopReason::NoNextPage),
    };
    match last_page {
        Some(reason) => Step::Stop(reason),
        None if page >= config.max_pages => Step::Stop(StopReason::PageCeiling),
        None => Step::Continue(page + 1),
    }
}

/// Look for a pager pointing past `current`: a `rel=next` link, a link
/// reading "Nästa", or a `page=<n>` link with `n > current`.
pub fn has_next_page(html: &str, current: u32) -> bool {
    REL_NEXT_RX.is_match(html)
        || NEXT_TEXT_RX.is_match(html)
        || PAGE_LINK_RX
            .captures_iter(html)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .any(|n| n > current)
}

/// Fetch pages for `query` until a stop condition holds.
///
/// Each page is extracted and folded into a first-seen set before the next
/// request goes out. A blank query returns nothing without touching the source.
///
/// # Arguments
///
/// * `source` - where pages come from; retries belong to the source, not here
/// * `query` - the search term, trimmed before use
/// * `pagination` - cursor protocol, page size and page ceiling
/// * `extract` - base URL, window span and association mode
///
/// # Returns
///
/// The deduplicated items in discovery order with the page count and the
/// reason the walk ended.
///
/// # Errors
///
/// The first fetch error after the source's own retries. Items from earlier
/// pages are discarded.
#[instrument(level = "info", skip(source, pagination, extract))]
pub async fn collect_items<S: PageSource>(
    source: &S,
    query: &str,
    pagination: &PaginationConfig,
    extract: &ExtractConfig,
) -> Result<Collected> {
    let query = query.trim();
    if query.is_empty() {
        info!("Empty query; skipping upstream");
        return Ok(Collected {
            items: Vec::new(),
            pages_fetched: 0,
            stop: StopReason::EmptyQuery,
        });
    }

    let mut seen = Deduplicator::new();
    let mut page = 1u32;
    loop {
        let request = PageRequest {
            query: query.to_string(),
            page,
            page_size: pagination.page_size,
            protocol: pagination.protocol,
        };
        let html = match source.fetch(&request).await {
            Ok(html) => html,
            Err(e) => {
                error!(page, error = %e, discarded = seen.len(), "Aborting query");
                return Err(e);
            }
        };

        let items = extract_items(&html, extract);
        let raw = items.len();
        if raw == 0 {
            debug!(page, preview = %truncate_for_log(&html, 200), "Page produced no items");
        }
        let added = seen.extend(items);
        info!(page, raw, added, total = seen.len(), "Processed result page");

        match next_step(pagination, page, raw, added, &html) {
            Step::Continue(next) => page = next,
            Step::Stop(stop) => {
                info!(pages = page, ?stop, total = seen.len(), "Pagination finished");
                return Ok(Collected {
                    items: seen.into_items(),
                    pages_fetched: page,
                    stop,
                });
            }
        }
    }
}

/// [`collect_items`] ordered into a [`ResultSet`], bounded by a wall-clock limit.
pub async fn collect_result_set<S: PageSource>(
    source: &S,
    query: &str,
    pagination: &PaginationConfig,
    extract: &ExtractConfig,
    limit: Duration,
) -> Result<ResultSet> {
    let collected = tokio::time::timeout(limit, collect_items(source, query, pagination, extract))
        .await
        .map_err(|_| ScrapeError::Timeout {
            secs: limit.as_secs(),
        })??;
    debug!(
        pages = collected.pages_fetched,
        stop = ?collected.stop,
        items = collected.items.len(),
        "Ordering collected items"
    );
    Ok(ResultSet::from_items(collected.items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::proximity::AssociationMode;
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use url::Url;

    enum Scripted {
        Html(String),
        Status(u16),
    }

    /// Serves scripted pages by index; anything past the script is an empty page.
    struct ScriptedSource {
        pages: Vec<Scripted>,
        requested: Mutex<Vec<u32>>,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Scripted>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl PageSource for ScriptedSource {
        async fn fetch(&self, request: &PageRequest) -> Result<String> {
            self.requested.lock().unwrap().push(request.page);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.pages.get(request.page as usize - 1) {
                Some(Scripted::Html(html)) => Ok(html.clone()),
                Some(Scripted::Status(status)) => Err(ScrapeError::UpstreamStatus {
                    page: request.page,
                    status: *status,
                    url: format!("test://search?pindex={}", request.page),
                }),
                None => Ok("<html><body><p>Inga träffar</p></body></html>".to_string()),
            }
        }
    }

    /// A result page with `count` entries numbered from `first`, each date
    /// printed just before its link.
    fn result_page(first: usize, count: usize) -> Scripted {
        let rows: String = (first..first + count)
            .map(|n| {
                format!(
                    "<li><span>2024-{:02}-{:02}</span> <a href=\"/arende/{n}\">Ärende {n}</a></li>\n",
                    n % 12 + 1,
                    n % 28 + 1
                )
            })
            .collect();
        Scripted::Html(format!("<ul>\n{rows}</ul>"))
    }

    const SCENARIO_PAGE: &str = r#"<ul><li><a href="/doc/123.pdf">Beslut om skola</a> 2024-03-15</li></ul>"#;

    fn pagination(protocol: PageProtocol, page_size: usize, max_pages: u32) -> PaginationConfig {
        PaginationConfig { protocol, page_size, max_pages }
    }

    fn extract() -> ExtractConfig {
        ExtractConfig {
            base_url: Url::parse("https://sammantraden.example.se").unwrap(),
            window_span: 500,
            mode: AssociationMode::Anchor,
        }
    }

    #[tokio::test]
    async fn test_empty_query_makes_no_request() {
        let source = ScriptedSource::new(vec![result_page(0, 5)]);
        let cfg = pagination(PageProtocol::OffsetLimit, 5, 50);
        let collected = collect_items(&source, "   ", &cfg, &extract()).await.unwrap();
        assert!(collected.items.is_empty());
        assert_eq!(collected.stop, StopReason::EmptyQuery);
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn test_stops_on_first_empty_page() {
        let source = ScriptedSource::new(vec![
            result_page(0, 5),
            result_page(5, 5),
            Scripted::Html("<html></html>".to_string()),
            result_page(10, 5),
        ]);
        let cfg = pagination(PageProtocol::OffsetLimit, 5, 50);
        let collected = collect_items(&source, "skola", &cfg, &extract()).await.unwrap();
        assert_eq!(source.requested(), vec![1, 2, 3]);
        assert_eq!(collected.stop, StopReason::EmptyPage);
        assert_eq!(collected.pages_fetched, 3);
        assert_eq!(collected.items.len(), 10);
    }

    #[tokio::test]
    async fn test_short_page_is_last_page() {
        let source = ScriptedSource::new(vec![result_page(0, 3), result_page(3, 5)]);
        let cfg = pagination(PageProtocol::OffsetLimit, 5, 50);
        let collected = collect_items(&source, "skola", &cfg, &extract()).await.unwrap();
        assert_eq!(source.requested(), vec![1]);
        assert_eq!(collected.stop, StopReason::ShortPage);
        assert_eq!(collected.items.len(), 3);
    }

    #[tokio::test]
    async fn test_page_ceiling_bounds_full_pages() {
        let pages = (0..10).map(|p| result_page(p * 4, 4)).collect();
        let source = ScriptedSource::new(pages);
        let cfg = pagination(PageProtocol::OffsetLimit, 4, 3);
        let collected = collect_items(&source, "skola", &cfg, &extract()).await.unwrap();
        assert_eq!(source.requested(), vec![1, 2, 3]);
        assert_eq!(collected.stop, StopReason::PageCeiling);
        assert_eq!(collected.items.len(), 12);
    }

    #[tokio::test]
    async fn test_fetch_failure_discards_gathered_pages() {
        let source = ScriptedSource::new(vec![result_page(0, 5), Scripted::Status(502), result_page(10, 5)]);
        let cfg = pagination(PageProtocol::OffsetLimit, 5, 50);
        let err = collect_items(&source, "skola", &cfg, &extract()).await.unwrap_err();
        assert_eq!(err.page(), Some(2));
        assert!(err.to_string().contains("502"));
        assert_eq!(source.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_repeated_entry_across_pages_collapses() {
        let source = ScriptedSource::new(vec![
            Scripted::Html(SCENARIO_PAGE.to_string()),
            Scripted::Html(SCENARIO_PAGE.to_string()),
        ]);
        let cfg = pagination(PageProtocol::OffsetLimit, 1, 50);
        let set = collect_result_set(&source, "skola", &cfg, &extract(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(source.requested(), vec![1, 2]);
        assert_eq!(set.len(), 1);
        let item = &set.dated()[0];
        assert_eq!(item.title.as_deref(), Some("Beslut om skola"));
        assert_eq!(item.date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(
            item.download_url.as_ref().map(Url::as_str),
            Some("https://sammantraden.example.se/doc/123.pdf")
        );
    }

    /// Site header repeated on every page, 25 plain links with no dates.
    fn site_header() -> String {
        let links: String = (0..25)
            .map(|n| format!("<li><a href=\"/meny/{n}\">Meny {n}</a></li>"))
            .collect();
        format!("<header><ul>{links}</ul></header>")
    }

    #[tokio::test]
    async fn test_repeated_menu_does_not_keep_pagination_alive() {
        let header = site_header();
        let mut pages = vec![Scripted::Html(format!("{header}<main>{SCENARIO_PAGE}</main>"))];
        pages.extend((1..50).map(|_| Scripted::Html(format!("{header}<main></main>"))));
        let source = ScriptedSource::new(pages);
        let cfg = pagination(PageProtocol::OffsetLimit, 5, 50);
        let collected = collect_items(&source, "skola", &cfg, &extract()).await.unwrap();
        assert_eq!(source.requested(), vec![1, 2]);
        assert_eq!(collected.stop, StopReason::EmptyPage);
        assert!(collected
            .items
            .iter()
            .any(|i| i.title.as_deref() == Some("Beslut om skola")));
        assert!(collected
            .items
            .iter()
            .all(|i| i.date.is_some() || i.download_url.is_some()));
    }

    #[tokio::test]
    async fn test_page_of_known_items_ends_pagination() {
        // The footer date dates every menu link, so each page is "full".
        let header = site_header();
        let footer = "<div class=\"updated\">Uppdaterad 2024-01-01</div>";
        let padding = " ".repeat(600);
        let first_page = format!("{header}{footer}<main>{padding}{SCENARIO_PAGE}</main>");
        let first_page_items = extract_items(&first_page, &extract()).len();
        assert!(first_page_items >= 5);
        let mut pages = vec![Scripted::Html(first_page)];
        pages.extend((1..50).map(|_| Scripted::Html(format!("{header}{footer}<main></main>"))));
        let source = ScriptedSource::new(pages);
        let cfg = pagination(PageProtocol::OffsetLimit, 5, 50);
        let collected = collect_items(&source, "skola", &cfg, &extract()).await.unwrap();
        assert_eq!(source.requested(), vec![1, 2]);
        assert_eq!(collected.stop, StopReason::NoNewItems);
        assert_eq!(collected.items.len(), first_page_items);
    }

    #[tokio::test]
    async fn test_page_number_protocol_follows_next_marker() {
        let with_next = r#"<a href="/doc/1.pdf">Protokoll</a> 2024-02-01
            <div class="pager"><a href="/search?text=x&amp;page=2">2</a></div>"#;
        let without_next = r#"<a href="/doc/2.pdf">Kallelse</a> 2024-01-01
            <div class="pager"><a href="/search?text=x&amp;page=1">1</a></div>"#;
        let source = ScriptedSource::new(vec![
            Scripted::Html(with_next.to_string()),
            Scripted::Html(without_next.to_string()),
            result_page(0, 3),
        ]);
        let cfg = pagination(PageProtocol::PageNumber, 20, 50);
        let collected = collect_items(&source, "x", &cfg, &extract()).await.unwrap();
        assert_eq!(source.requested(), vec![1, 2]);
        assert_eq!(collected.stop, StopReason::NoNextPage);
    }

    #[tokio::test]
    async fn test_wall_clock_limit() {
        let mut source = ScriptedSource::new(vec![result_page(0, 5)]);
        source.delay = Duration::from_millis(200);
        let cfg = pagination(PageProtocol::OffsetLimit, 5, 50);
        let err = collect_result_set(&source, "skola", &cfg, &extract(), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Timeout { .. }));
    }

    #[test]
    fn test_next_step_transitions() {
        let cfg = pagination(PageProtocol::OffsetLimit, 10, 5);
        assert_eq!(next_step(&cfg, 1, 10, 10, ""), Step::Continue(2));
        assert_eq!(next_step(&cfg, 1, 0, 0, ""), Step::Stop(StopReason::EmptyPage));
        assert_eq!(next_step(&cfg, 2, 9, 9, ""), Step::Stop(StopReason::ShortPage));
        assert_eq!(next_step(&cfg, 2, 10, 0, ""), Step::Stop(StopReason::NoNewItems));
        assert_eq!(next_step(&cfg, 3, 10, 1, ""), Step::Continue(4));
        assert_eq!(next_step(&cfg, 5, 10, 10, ""), Step::Stop(StopReason::PageCeiling));
    }

    #[test]
    fn test_has_next_page_markers() {
        assert!(has_next_page(r#"<link rel="next" href="?page=2">"#, 1));
        assert!(has_next_page(r#"<a href="/s">Nästa</a>"#, 1));
        assert!(has_next_page(r#"<a href="/s?text=a&page=4">4</a>"#, 3));
        assert!(!has_next_page(r#"<a href="/s?text=a&page=3">3</a>"#, 3));
        assert!(!has_next_page("<p>Inga fler</p>", 1));
    }
}
