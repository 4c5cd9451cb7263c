use std::collections::HashSet;
use std::hash::Hash;

/// Keep one row per key.
///
/// The survivor is the first occurrence in iteration order. Sources are read
/// in sorted key order and line order, so the choice is stable across runs,
/// but it carries no meaning beyond that (it is not "latest event wins").
pub fn dedup_by_key<T, K, F>(rows: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    rows.into_iter().filter(|row| seen.insert(key(row))).collect()
}
