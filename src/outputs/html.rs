//! Standalone HTML table output.
//!
//! One row per document, a heading row per month bucket. Undated rows show
//! `—` in the date column; a "Ladda ner" link follows the title when the item
//! has a download link.

use super::ensure_parent_dir;
use crate::error::Result;
use crate::models::{Item, MonthBucket, MonthKey, SearchReport};
use crate::utils::escape_html;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const STYLE: &str = "\
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial, sans-serif; margin: 24px; }
  h1 { font-size: 1.35rem; margin: 0 0 8px; }
  .meta { color: #555; margin-bottom: 12px; }
  table { border-collapse: collapse; width: 100%; }
  th, td { padding: 10px 8px; border-bottom: 1px solid #e5e5e5; vertical-align: top; }
  th { text-align: left; }
  tr.month th { background: #f6f8fa; }
  .date-col { width: 120px; white-space: nowrap; }";

fn row_html(out: &mut String, item: &Item) {
    let date = item
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "—".to_string());
    let title = escape_html(item.title.as_deref().unwrap_or("—"));
    let title_html = match &item.page_url {
        Some(url) => format!(
            r#"<a href="{}" target="_blank" rel="noopener">{title}</a>"#,
            escape_html(url.as_str())
        ),
        None => title,
    };
    let download = item
        .download_url
        .as_ref()
        .map(|url| {
            format!(
                r#" · <a href="{}" target="_blank" rel="noopener">Ladda ner</a>"#,
                escape_html(url.as_str())
            )
        })
        .unwrap_or_default();
    let _ = writeln!(
        out,
        r#"<tr><td class="date-col">{date}</td><td>{title_html}{download}</td></tr>"#
    );
}

fn bucket_html(out: &mut String, bucket: &MonthBucket) {
    let label = match bucket.key {
        MonthKey::Undated => "Utan datum".to_string(),
        key => key.to_string(),
    };
    let _ = writeln!(out, r#"<tr class="month"><th colspan="2">{label}</th></tr>"#);
    for item in &bucket.items {
        row_html(out, item);
    }
}

/// Render the full page.
pub fn render(report: &SearchReport) -> String {
    let query = escape_html(&report.query);
    let generated = report.generated_at.format("%Y-%m-%d %H:%M:%S UTC");
    let mut rows = String::new();
    for bucket in &report.buckets {
        bucket_html(&mut rows, bucket);
    }

    format!(
        r#"<!doctype html>
<html lang="sv">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Sorterade sökresultat: {query}</title>
<style>
{STYLE}
</style>
</head>
<body>
  <h1>Sorterade sökresultat</h1>
  <div class="meta">Sökterm: <strong>{query}</strong> · Antal: {count} · Genererad: {generated}</div>
  <table>
    <thead><tr><th class="date-col">Datum</th><th>Titel &amp; länkar</th></tr></thead>
    <tbody>
{rows}    </tbody>
  </table>
</body>
</html>
"#,
        count = report.count,
    )
}

/// Render `report` with [`render`] and write it to `path`.
///
/// # Arguments
///
/// * `report` - the grouped result set for one query
/// * `path` - destination file; missing parent directories are created
///
/// # Returns
///
/// `Ok(())` on success, or the I/O error from creating the directory or
/// writing the file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_report(report: &SearchReport, path: &Path) -> Result<()> {
    ensure_parent_dir(path).await?;
    fs::write(path, render(report)).await?;
    info!(count = report.count, "Wrote HTML report");
    Ok(())
}
