//! Writing a [`SearchReport`](crate::models::SearchReport) for humans and tools.
//!
//! - [`json`]: the month buckets as JSON, for scripts and other renderers
//! - [`html`]: a standalone page with one table row per document

pub mod html;
pub mod json;

use std::path::Path;
use tokio::fs;

/// Create the parent directory of `path` if it has one.
async fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}
