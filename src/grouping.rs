//! Month buckets for presentation.

use crate::models::{MonthBucket, MonthKey, ResultSet};
use itertools::Itertools;

/// Split the result set into runs of equal [`MonthKey`].
///
/// No re-sorting happens: a bucket opens each time the key changes, so the
/// buckets come out newest month first with one trailing undated bucket.
///
/// # Examples
///
/// ```text
/// 2024-03-15, 2024-03-02, 2024-01-30, undated, undated
/// => [2024-03: 2 items] [2024-01: 1 item] [undated: 2 items]
/// ```
pub fn group_by_month(results: &ResultSet) -> Vec<MonthBucket> {
    let runs = results.iter().chunk_by(|item| MonthKey::of(item));
    runs.into_iter()
        .map(|(key, items)| MonthBucket {
            key,
            items: items.cloned().collect(),
        })
        .collect()
}
