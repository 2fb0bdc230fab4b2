//! # Meeting Index
//!
//! Rebuilds a clean list of meeting documents from a municipal search index
//! that is only available as paginated, loosely structured HTML.
//!
//! ## Features
//!
//! - Walks every result page for a search term (offset/limit or page-number cursor)
//! - Finds document links and binds each to the nearest date in the markup
//! - Drops repeated entries across pages, keeping the first one seen
//! - Orders documents newest first and groups them by month
//! - Writes the result as JSON and/or a standalone HTML table
//!
//! ## Usage
//!
//! ```sh
//! meeting_index Solfagraskolan -j ./out/solfagra.json --html ./out/solfagra.html
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: request page N of the query ([`fetch`], with retry)
//! 2. **Extraction**: locate anchors and date tokens, associate by proximity ([`extract`])
//! 3. **Deduplication**: fold each page into a first-seen set ([`dedup`])
//! 4. **Pagination**: continue or stop after every page ([`pagination`])
//! 5. **Output**: order, group by month, write ([`grouping`], [`outputs`])
//!
//! Extraction is a best-effort heuristic: entries sitting close together can
//! occasionally be paired with a neighbour's date.

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dedup;
mod error;
mod extract;
mod fetch;
mod grouping;
mod models;
mod outputs;
mod pagination;
mod utils;

use cli::Cli;
use config::ScrapeConfig;
use fetch::{HttpPageSource, RetryFetch};
use models::SearchReport;
use outputs::{html, json};

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
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("meeting_index starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = ScrapeConfig::load(args.config.as_deref())?;
    config.apply_cli(&args);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }
    info!(
        base_url = %config.base_url,
        protocol = ?config.protocol,
        page_size = config.page_size,
        max_pages = config.max_pages,
        window_span = config.window_span,
        mode = ?config.mode,
        "Configuration ready"
    );

    // ---- Fetch, extract, deduplicate ----
    let source = RetryFetch::new(
        HttpPageSource::new(
            config.search_url()?,
            &config.query_param,
            &config.user_agent,
            config.request_timeout(),
        )?,
        config.max_retries,
        config.retry_base_delay(),
    )
    .with_max_jitter(config.retry_max_jitter());
    let query = args.query.clone().unwrap_or_default();
    let results = match pagination::collect_result_set(
        &source,
        &query,
        &config.pagination_config(),
        &config.extract_config()?,
        config.total_timeout(),
    )
    .await
    {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, page = ?e.page(), %query, "Query failed; no results written");
            return Err(e.into());
        }
    };
    if results.is_empty() {
        warn!(%query, "No documents found");
    }
    info!(
        total = results.len(),
        dated = results.dated().len(),
        undated = results.undated().len(),
        "Collected documents"
    );

    // ---- Group and write ----
    let buckets = grouping::group_by_month(&results);
    let report = SearchReport {
        query: query.trim().to_string(),
        base_url: config.base_url.clone(),
        generated_at: Utc::now(),
        count: results.len(),
        buckets,
    };

    if let Some(path) = &args.json {
        json::write_report(&report, path).await?;
    }
    if let Some(path) = &args.html {
        html::write_report(&report, path).await?;
    }
    if args.json.is_none() && args.html.is_none() {
        println!("{}", json::to_json(&report)?);
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        documents = report.count,
        months = report.buckets.len(),
        "Execution complete"
    );

    Ok(())
}
