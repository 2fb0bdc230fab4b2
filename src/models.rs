//! Data models for extracted meeting documents and their presentation groups.
//!
//! - [`DateToken`] and [`Anchor`]: raw matches found in a search result page
//! - [`Item`]: one canonical document record built from an anchor and a date
//! - [`ResultSet`]: the deduplicated, date-ordered items for one query
//! - [`MonthBucket`]: items sharing a year-month (or the undated bucket)
//! - [`SearchReport`]: what gets written out for rendering

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use url::Url;

/// A calendar date found in page text, with the byte offset of its first
/// character in the scanned document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateToken {
    pub date: NaiveDate,
    pub offset: usize,
}

/// A hyperlink found in the raw markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// The `href` value as written, possibly relative.
    pub href: String,
    /// Visible text with tags stripped and whitespace collapsed. May be empty.
    pub text: String,
    /// Byte offset of the opening `<a` in the document.
    pub position: usize,
    /// Byte offset just past the closing `</a>`.
    pub end: usize,
}

/// A canonical document record.
///
/// Only items with at least one of `title`, `page_url` or `date` are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub title: Option<String>,
    pub page_url: Option<Url>,
    pub download_url: Option<Url>,
    /// Serialised as `YYYY-MM-DD`.
    pub date: Option<NaiveDate>,
    /// Offset the item was anchored at. Window bookkeeping only, never identity.
    #[serde(skip)]
    pub source_position: usize,
}

/// The tuple two items must share to count as the same document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    title: String,
    page_url: String,
    date: Option<NaiveDate>,
}

impl Item {
    pub fn is_retainable(&self) -> bool {
        self.title.is_some() || self.page_url.is_some() || self.date.is_some()
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            title: self.title.clone().unwrap_or_default(),
            page_url: self
                .page_url
                .as_ref()
                .map(Url::to_string)
                .unwrap_or_default(),
            date: self.date,
        }
    }
}

/// Deduplicated items for one query: dated items newest first, then the
/// undated ones in the order they were discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    dated: Vec<Item>,
    undated: Vec<Item>,
}

impl ResultSet {
    /// Partition and order already-deduplicated items.
    ///
    /// The sort is stable, so items sharing a date keep their first-seen order.
    pub fn from_items(items: Vec<Item>) -> Self {
        let (mut dated, undated): (Vec<Item>, Vec<Item>) =
            items.into_iter().partition(|item| item.date.is_some());
        dated.sort_by(|a, b| b.date.cmp(&a.date));
        Self { dated, undated }
    }

    pub fn dated(&self) -> &[Item] {
        &self.dated
    }

    pub fn undated(&self) -> &[Item] {
        &self.undated
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.dated.iter().chain(self.undated.iter())
    }

    pub fn len(&self) -> usize {
        self.dated.len() + self.undated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Grouping key for [`MonthBucket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonthKey {
    Month { year: i32, month: u32 },
    Undated,
}

impl MonthKey {
    pub fn of(item: &Item) -> Self {
        match item.date {
            Some(date) => MonthKey::Month {
                year: date.year(),
                month: date.month(),
            },
            None => MonthKey::Undated,
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthKey::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            MonthKey::Undated => f.write_str("undated"),
        }
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Items sharing a year-month, in result-set order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    #[serde(rename = "label")]
    pub key: MonthKey,
    pub items: Vec<Item>,
}

/// Everything a renderer needs for one query.
#[derive(Debug, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub base_url: String,
    pub generated_at: DateTime<Utc>,
    pub count: usize,
    pub buckets: Vec<MonthBucket>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, date: Option<(i32, u32, u32)>) -> Item {
        Item {
            title: Some(title.to_string()),
            page_url: None,
            download_url: None,
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            source_position: 0,
        }
    }

    #[test]
    fn test_empty_item_is_not_retainable() {
        let empty = Item {
            title: None,
            page_url: None,
            download_url: Some(Url::parse("https://example.org/a.pdf").unwrap()),
            date: None,
            source_position: 0,
        };
        assert!(!empty.is_retainable());
        assert!(item("Protokoll", None).is_retainable());
    }

    #[test]
    fn test_identity_key_ignores_download_and_position() {
        let mut a = item("Kallelse", Some((2024, 3, 15)));
        let mut b = a.clone();
        a.source_position = 10;
        b.source_position = 9000;
        b.download_url = Some(Url::parse("https://example.org/x.pdf").unwrap());
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_result_set_orders_dated_desc_then_undated() {
        let items = vec![
            item("old", Some((2023, 1, 5))),
            item("none-1", None),
            item("new", Some((2024, 6, 1))),
            item("tie-first", Some((2023, 9, 9))),
            item("none-2", None),
            item("tie-second", Some((2023, 9, 9))),
        ];
        let set = ResultSet::from_items(items);
        let titles: Vec<_> = set.iter().map(|i| i.title.clone().unwrap()).collect();
        assert_eq!(
            titles,
            vec!["new", "tie-first", "tie-second", "old", "none-1", "none-2"]
        );
        assert_eq!(set.dated().len(), 4);
        assert_eq!(set.undated().len(), 2);
    }

    #[test]
    fn test_item_serializes_iso_date() {
        let json = serde_json::to_string(&item("Beslut", Some((2024, 3, 15)))).unwrap();
        assert!(json.contains("\"date\":\"2024-03-15\""));
        assert!(!json.contains("source_position"));

        let undated = serde_json::to_string(&item("Beslut", None)).unwrap();
        assert!(undated.contains("\"date\":null"));
    }

    #[test]
    fn test_month_key_label() {
        assert_eq!(MonthKey::of(&item("a", Some((2024, 3, 15)))).to_string(), "2024-03");
        assert_eq!(MonthKey::of(&item("a", None)).to_string(), "undated");
    }
}
