//! JSON output.
//!
//! ```text
//! {
//!   "query": "Solfagraskolan",
//!   "base_url": "https://sammantraden.huddinge.se",
//!   "generated_at": "2026-10-18T09:12:44Z",
//!   "count": 2,
//!   "buckets": [
//!     { "label": "2024-03", "items": [ { "title": "...", "date": "2024-03-15", ... } ] },
//!     { "label": "undated", "items": [ ... ] }
//!   ]
//! }
//! ```

use super::ensure_parent_dir;
use crate::error::Result;
use crate::models::SearchReport;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Pretty JSON for stdout or a file.
pub fn to_json(report: &SearchReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Write a [`SearchReport`] as pretty-printed JSON.
///
/// Creates any missing parent directories of `path` before writing.
///
/// # Arguments
///
/// * `report` - the grouped result set for one query
/// * `path` - destination file, overwritten if present
///
/// # Returns
///
/// `Ok(())` on success, or an error if serialization, directory creation or
/// the write fails.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_report(report: &SearchReport, path: &Path) -> Result<()> {
    let json = to_json(report)?;
    if let Err(e) = ensure_parent_dir(path).await {
        error!(error = %e, "Failed to create JSON output dir");
        return Err(e.into());
    }
    fs::write(path, json).await?;
    info!(count = report.count, "Wrote JSON report");
    Ok(())
}
