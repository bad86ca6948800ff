//! Exact-duplicate removal

use std::collections::HashSet;
use std::hash::Hash;
use tracing::info;

/// Counters from one deduplication pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub input: usize,
    pub unique: usize,
    pub duplicates: usize,
}

/// Drop records whose complete field set was already seen
///
/// Output keeps first-seen order, so repeated runs over the same file
/// produce identical results.
pub fn dedup<T: Eq + Hash + Clone>(records: impl IntoIterator<Item = T>) -> Vec<T> {
    dedup_with_stats(records).0
}

/// `dedup`, also returning how many records were dropped
pub fn dedup_with_stats<T: Eq + Hash + Clone>(
    records: impl IntoIterator<Item = T>,
) -> (Vec<T>, DedupStats) {
    let mut seen = HashSet::new();
    let mut input = 0;
    let unique: Vec<T> = records
        .into_iter()
        .inspect(|_| input += 1)
        .filter(|r| seen.insert(r.clone()))
        .collect();

    let stats = DedupStats {
        input,
        unique: unique.len(),
        duplicates: input - unique.len(),
    };
    info!(input = stats.input, unique = stats.unique, duplicates = stats.duplicates, "deduplicated rows");
    (unique, stats)
}
