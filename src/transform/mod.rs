//! Row-level building blocks shared by the pipelines.

mod ids;
mod join;
mod time;

pub use ids::{MonotonicIds, PARTITION_ID_SHIFT};
pub use join::{match_song_plays, JoinMode, JoinStats, PlayEvent, SongIndex};
pub use time::{derive_time_entry, start_time_from_millis, EventTimezone};

use std::collections::HashSet;
use std::hash::Hash;

/// Drop rows identical to an earlier row, keeping first-seen order.
pub fn distinct<T: Hash + Eq + Clone>(rows: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

/// Keep the first row seen for every key.
///
/// Returns the surviving rows and how many later rows were discarded.
pub fn distinct_by_key<T, K, F>(rows: Vec<T>, key: F) -> (Vec<T>, usize)
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let total = rows.len();
    let mut seen = HashSet::with_capacity(total);
    let kept: Vec<T> = rows.into_iter().filter(|row| seen.insert(key(row))).collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_keeps_first_seen_order() {
        let rows = vec![3, 1, 3, 2, 1];
        assert_eq!(distinct(rows), vec![3, 1, 2]);
    }

    #[test]
    fn test_distinct_is_idempotent() {
        let once = distinct(vec!["a", "b", "a", "c", "b"]);
        let twice = distinct(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_distinct_by_key_reports_dropped() {
        let rows = vec![("S1", 1), ("S2", 2), ("S1", 3)];
        let (kept, dropped) = distinct_by_key(rows, |r| r.0);
        assert_eq!(kept, vec![("S1", 1), ("S2", 2)]);
        assert_eq!(dropped, 1);
    }
}
