use crate::cache::entry::CacheEntry;

/// Approximate serialized size of an entry set: the length of its JSON snapshot.
#[inline]
pub fn approximate_snapshot_size<'a>(entries: impl IntoIterator<Item = &'a CacheEntry>) -> usize {
    let items: Vec<&CacheEntry> = entries.into_iter().collect();
    serde_json::to_vec(&items).map(|b| b.len()).unwrap_or(0)
}
