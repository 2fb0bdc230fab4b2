//! Collapsing repeated items across pages.
//!
//! Two items are the same document when their [`IdentityKey`] matches
//! (title, page link, date). The first one seen wins as-is; later copies are
//! dropped without merging any of their fields.

use crate::models::{IdentityKey, Item};
use std::collections::HashSet;

/// Running first-seen set fed page by page.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<IdentityKey>,
    items: Vec<Item>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item, returning `false` if an equal identity was already kept.
    pub fn push(&mut self, item: Item) -> bool {
        if self.seen.insert(item.identity_key()) {
            self.items.push(item);
            true
        } else {
            false
        }
    }

    /// Add a batch in order, returning how many were new.
    pub fn extend<I: IntoIterator<Item = Item>>(&mut self, items: I) -> usize {
        items
            .into_iter()
            .map(|item| self.push(item))
            .filter(|added| *added)
            .count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultSet;
    use chrono::NaiveDate;
    use url::Url;

    fn dedupe(items: Vec<Item>) -> Vec<Item> {
        let mut running = Deduplicator::new();
        running.extend(items);
        running.into_items()
    }

    fn item(title: &str, url: Option<&str>, date: Option<(i32, u32, u32)>) -> Item {
        Item {
            title: Some(title.to_string()),
            page_url: url.map(|u| Url::parse(u).unwrap()),
            download_url: None,
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            source_position: 0,
        }
    }

    #[test]
    fn test_first_seen_wins_without_merge() {
        let first = item("Protokoll", Some("https://e.se/m/1"), Some((2024, 3, 15)));
        let mut second = first.clone();
        second.download_url = Some(Url::parse("https://e.se/d/1.pdf").unwrap());
        second.source_position = 700;

        let out = dedupe(vec![first.clone(), second]);
        assert_eq!(out, vec![first]);
    }

    #[test]
    fn test_differing_key_fields_are_kept() {
        let items = vec![
            item("Protokoll", Some("https://e.se/m/1"), Some((2024, 3, 15))),
            item("Protokoll", Some("https://e.se/m/2"), Some((2024, 3, 15))),
            item("Protokoll", Some("https://e.se/m/1"), Some((2024, 3, 16))),
            item("Protokoll", None, Some((2024, 3, 15))),
            item("Kallelse", Some("https://e.se/m/1"), Some((2024, 3, 15))),
        ];
        assert_eq!(dedupe(items.clone()), items);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let items = vec![
            item("A", None, Some((2024, 1, 1))),
            item("B", None, None),
            item("A", None, Some((2024, 1, 1))),
            item("B", None, None),
            item("C", None, Some((2023, 1, 1))),
        ];
        let once = dedupe(items);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);

        let set = ResultSet::from_items(once.clone());
        assert_eq!(ResultSet::from_items(dedupe(set.iter().cloned().collect())), set);
    }

    #[test]
    fn test_running_set_matches_one_shot() {
        let page_one = vec![item("A", None, Some((2024, 1, 1))), item("B", None, None)];
        let page_two = vec![item("B", None, None), item("C", None, None)];

        let mut running = Deduplicator::new();
        assert_eq!(running.extend(page_one.clone()), 2);
        assert_eq!(running.extend(page_two.clone()), 1);
        assert_eq!(running.len(), 3);
        assert!(!running.push(item("A", None, Some((2024, 1, 1)))));

        let all: Vec<Item> = page_one.into_iter().chain(page_two).collect();
        assert_eq!(running.into_items(), dedupe(all));
    }
}
