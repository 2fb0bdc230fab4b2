//! Date token scanning.
//!
//! Finds `YYYY-MM-DD` style dates (year starting with `20`, each separator one
//! of `-`, `/` or `.`) in arbitrary text. Word boundaries are ASCII-only, so a
//! date glued to a letter such as `å` still counts while one glued to a digit
//! or ASCII letter does not. Each call to [`scan_dates`] builds a fresh
//! iterator over the given slice, so no match position is ever shared between
//! unrelated scans.

use crate::models::DateToken;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u:\b)(20\d{2})[-/.](\d{2})[-/.](\d{2})(?-u:\b)")
        .expect("date pattern is valid")
});

/// Scan `text` left to right for non-overlapping date tokens.
///
/// `base_offset` is added to every token offset, so a window sliced out of a
/// larger document reports offsets in document coordinates.
///
/// # Examples
///
/// ```ignore
/// let tokens: Vec<_> = scan_dates("Möte 2024-03-15", 100).collect();
/// assert_eq!(tokens[0].offset, 106);
/// ```
pub fn scan_dates(text: &str, base_offset: usize) -> impl Iterator<Item = DateToken> + '_ {
    DATE_RX.captures_iter(text).filter_map(move |caps| {
        let date = parse_ymd(&caps[1], &caps[2], &caps[3])?;
        Some(DateToken {
            date,
            offset: base_offset + caps.get(0)?.start(),
        })
    })
}

/// Build a date from numeric fields, rejecting months outside 1-12 and days
/// outside 1-31 before letting the calendar reject the rest (e.g. 02-30).
fn parse_ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
