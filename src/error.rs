//! Error types for fetching and configuration.
//!
//! Extraction itself never fails: markup that does not look like an anchor or
//! a date is simply not matched, an invalid calendar date is dropped, and an
//! href that cannot be resolved leaves the link slot empty. Only the upstream
//! fetch and the surrounding plumbing produce [`ScrapeError`] values.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a query.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The search endpoint answered with a non-success status.
    #[error("upstream returned HTTP {status} for page {page} ({url})")]
    UpstreamStatus { page: u32, status: u16, url: String },

    /// The request never produced a response (DNS, TLS, timeout, reset...).
    #[error("fetching page {page} failed ({url}): {source}")]
    Transport {
        page: u32,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid base url `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("could not read config file {}: {source}", .path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file: {0}")]
    ConfigFormat(#[from] serde_yaml::Error),

    #[error("gave up after {secs}s without finishing pagination")]
    Timeout { secs: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Whether a fetch failure is worth another attempt at the transport layer.
    ///
    /// Transport errors, `429` and `5xx` are transient; any other status is a
    /// definitive answer from the server.
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::Transport { .. } => true,
            ScrapeError::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Page index of a fetch failure, if this is one.
    pub fn page(&self) -> Option<u32> {
        match self {
            ScrapeError::UpstreamStatus { page, .. } | ScrapeError::Transport { page, .. } => {
                Some(*page)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_names_page_and_status() {
        let err = ScrapeError::UpstreamStatus {
            page: 3,
            status: 503,
            url: "https://example.org/search?page=3".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("page 3"));
        assert_eq!(err.page(), Some(3));
    }

    #[test]
    fn test_transient_classification() {
        let server = ScrapeError::UpstreamStatus { page: 1, status: 502, url: String::new() };
        let throttled = ScrapeError::UpstreamStatus { page: 1, status: 429, url: String::new() };
        let missing = ScrapeError::UpstreamStatus { page: 1, status: 404, url: String::new() };
        assert!(server.is_transient());
        assert!(throttled.is_transient());
        assert!(!missing.is_transient());
        assert!(!ScrapeError::Config("x".into()).is_transient());
        assert_eq!(ScrapeError::Timeout { secs: 5 }.page(), None);
    }
}
