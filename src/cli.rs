//! Command-line interface definitions.
//!
//! Every tuning flag is optional and overrides the matching field of the YAML
//! config file (or the built-in default when no file is given).

use crate::extract::proximity::AssociationMode;
use crate::fetch::PageProtocol;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Print the grouped result list as JSON
/// meeting_index Solfagraskolan
///
/// # Write JSON and an HTML table, walking at most 10 pages
/// meeting_index "bygglov" -j ./out/bygglov.json --html ./out/bygglov.html --max-pages 10
///
/// # Tune the association heuristic from a file
/// meeting_index förskola -c ./meeting_index.yaml --mode auto
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search term; an empty term produces an empty list without any request
    pub query: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Site origin that relative links are resolved against
    #[arg(long, env = "MEETING_INDEX_BASE_URL")]
    pub base_url: Option<String>,

    /// Page cursor sent to the search endpoint
    #[arg(long, value_enum)]
    pub protocol: Option<PageProtocol>,

    /// Results requested per page (offset/limit cursor)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Hard ceiling on pages fetched
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Bytes searched either side of a link for its date
    #[arg(long)]
    pub window_span: Option<usize>,

    /// Association strategy
    #[arg(long, value_enum)]
    pub mode: Option<AssociationMode>,

    /// Write the grouped result list as JSON to this file
    #[arg(short, long)]
    pub json: Option<PathBuf>,

    /// Write the grouped result list as an HTML table to this file
    #[arg(long)]
    pub html: Option<PathBuf>,
}
