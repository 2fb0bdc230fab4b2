//! Runtime configuration: defaults, an optional YAML file, then CLI overrides.
//!
//! ```yaml
//! base_url: https://sammantraden.huddinge.se
//! search_path: /search
//! protocol: offset_limit
//! page_size: 20
//! max_pages: 50
//! window_span: 500
//! mode: anchor
//! ```
//!
//! Unknown keys are rejected so a typo does not silently fall back to a default.

use crate::cli::Cli;
use crate::error::{Result, ScrapeError};
use crate::extract::ExtractConfig;
use crate::extract::proximity::AssociationMode;
use crate::fetch::PageProtocol;
use crate::pagination::PaginationConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://sammantraden.huddinge.se";
pub const DEFAULT_SEARCH_PATH: &str = "/search";
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_MAX_PAGES: u32 = 50;
/// Bytes searched on either side of an anchor (or date) for its partner.
pub const DEFAULT_WINDOW_SPAN: usize = 500;
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome Safari";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub search_path: String,
    pub query_param: String,
    pub protocol: PageProtocol,
    pub page_size: usize,
    pub max_pages: u32,
    pub window_span: usize,
    pub mode: AssociationMode,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    /// Upper bound of the random delay added to each backoff.
    pub retry_max_jitter_ms: u64,
    pub request_timeout_secs: u64,
    pub total_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            query_param: "text".to_string(),
            protocol: PageProtocol::OffsetLimit,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            window_span: DEFAULT_WINDOW_SPAN,
            mode: AssociationMode::Anchor,
            max_retries: 2,
            retry_base_delay_ms: 500,
            retry_max_jitter_ms: 250,
            request_timeout_secs: 20,
            total_timeout_secs: 300,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Defaults, or the given YAML file layered over them.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ScrapeError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Overlay any flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(protocol) = cli.protocol {
            self.protocol = protocol;
        }
        if let Some(page_size) = cli.page_size {
            self.page_size = page_size;
        }
        if let Some(max_pages) = cli.max_pages {
            self.max_pages = max_pages;
        }
        if let Some(window_span) = cli.window_span {
            self.window_span = window_span;
        }
        if let Some(mode) = cli.mode {
            self.mode = mode;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ScrapeError::Config("page_size must be at least 1".into()));
        }
        if self.max_pages == 0 {
            return Err(ScrapeError::Config("max_pages must be at least 1".into()));
        }
        if self.window_span == 0 {
            return Err(ScrapeError::Config("window_span must be at least 1".into()));
        }
        self.search_url()?;
        Ok(())
    }

    pub fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|source| ScrapeError::InvalidBaseUrl {
            url: self.base_url.clone(),
            source,
        })
    }

    pub fn search_url(&self) -> Result<Url> {
        self.base()?
            .join(&self.search_path)
            .map_err(|source| ScrapeError::InvalidBaseUrl {
                url: format!("{}{}", self.base_url, self.search_path),
                source,
            })
    }

    pub fn extract_config(&self) -> Result<ExtractConfig> {
        Ok(ExtractConfig {
            base_url: self.base()?,
            window_span: self.window_span,
            mode: self.mode,
        })
    }

    pub fn pagination_config(&self) -> PaginationConfig {
        PaginationConfig {
            protocol: self.protocol,
            page_size: self.page_size,
            max_pages: self.max_pages,
        }
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_jitter(&self) -> Duration {
        Duration::from_millis(self.retry_max_jitter_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.total_timeout_secs)
    }
}
