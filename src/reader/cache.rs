//! Bounded cache of per-book reading positions.

use crate::db::now_timestamp;
use crate::reader::{ReadingState, StateStore};

/// Bounded mapping from book id to [`ReadingState`], persisted as a
/// single JSON document in the backing store.
///
/// Insertion past capacity evicts the entry with the strictly oldest
/// `last_accessed`. When several entries share the oldest timestamp the
/// first one in insertion order goes, which keeps eviction deterministic.
pub struct ReadingStateCache<S: StateStore> {
    store: S,
    key: String,
    capacity: usize,
    // Insertion order is the eviction tie-break, so entries stay in a Vec.
    entries: Vec<ReadingState>,
}

impl<S: StateStore> ReadingStateCache<S> {
    /// Open the cache stored under `key`, starting empty when the store
    /// has nothing or holds corrupt JSON.
    pub fn open(store: S, key: &str, capacity: usize) -> Self {
        let entries = store
            .load(key)
            .and_then(|raw| match serde_json::from_str::<Vec<ReadingState>>(&raw) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    tracing::warn!(error = %e, key, "Discarding corrupt reader state");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            store,
            key: key.to_string(),
            capacity: capacity.max(1),
            entries,
        }
    }

    /// Look up the saved state for a book.
    pub fn get(&self, book_id: &str) -> Option<&ReadingState> {
        self.entries.iter().find(|s| s.book_id == book_id)
    }

    /// Insert or overwrite the state for a book, stamped with the
    /// current time.
    pub fn save(&mut self, state: ReadingState) {
        self.save_at(state, now_timestamp());
    }

    /// Insert or overwrite with an explicit timestamp.
    pub fn save_at(&mut self, mut state: ReadingState, last_accessed: i64) {
        state.last_accessed = last_accessed;

        if let Some(existing) = self.entries.iter_mut().find(|s| s.book_id == state.book_id) {
            *existing = state;
        } else {
            if self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
            self.entries.push(state);
        }

        self.persist();
    }

    /// Remove the state for a book. No-op when absent.
    pub fn remove(&mut self, book_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|s| s.book_id != book_id);

        let removed = self.entries.len() < before;
        if removed {
            self.persist();
        }
        removed
    }

    /// All entries, most recently accessed first.
    pub fn list(&self) -> Vec<&ReadingState> {
        let mut entries: Vec<&ReadingState> = self.entries.iter().collect();
        // Stable sort: equal timestamps keep insertion order.
        entries.sort_by_key(|s| std::cmp::Reverse(s.last_accessed));
        entries
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&mut self) {
        let mut oldest = 0;
        for (i, state) in self.entries.iter().enumerate() {
            // Strict comparison: only a strictly older entry displaces
            // the first-encountered candidate.
            if state.last_accessed < self.entries[oldest].last_accessed {
                oldest = i;
            }
        }

        let evicted = self.entries.remove(oldest);
        tracing::debug!(book_id = %evicted.book_id, "Evicted reading state");
    }

    fn persist(&self) {
        match serde_json::to_string(&self.entries) {
            Ok(raw) => self.store.store(&self.key, &raw),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize reader state"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::MemoryStore;

    fn state(book_id: &str) -> ReadingState {
        ReadingState {
            book_id: book_id.to_string(),
            current_page: 0,
            lines_per_page: 80,
            display_name: book_id.to_uppercase(),
            last_accessed: 0,
        }
    }

    #[test]
    fn save_and_get() {
        let mut cache = ReadingStateCache::open(MemoryStore::new(), "t", 10);

        let mut s = state("book-1");
        s.current_page = 4;
        cache.save(s);

        let found = cache.get("book-1").unwrap();
        assert_eq!(found.current_page, 4);
        assert!(cache.get("book-2").is_none());
    }

    #[test]
    fn save_overwrites_without_growing() {
        let mut cache = ReadingStateCache::open(MemoryStore::new(), "t", 10);
        cache.save_at(state("book-1"), 1);

        let mut updated = state("book-1");
        updated.current_page = 9;
        cache.save_at(updated, 2);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("book-1").unwrap().current_page, 9);
        assert_eq!(cache.get("book-1").unwrap().last_accessed, 2);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut cache = ReadingStateCache::open(MemoryStore::new(), "t", 10);
        for i in 0..11 {
            cache.save_at(state(&format!("book-{}", i)), i as i64);
        }

        assert_eq!(cache.len(), 10);
        assert!(cache.get("book-0").is_none());
        assert!(cache.get("book-1").is_some());
        assert!(cache.get("book-10").is_some());
    }

    #[test]
    fn eviction_tie_breaks_on_insertion_order() {
        let mut cache = ReadingStateCache::open(MemoryStore::new(), "t", 3);
        cache.save_at(state("a"), 5);
        cache.save_at(state("b"), 5);
        cache.save_at(state("c"), 5);
        cache.save_at(state("d"), 6);

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn list_sorted_most_recent_first() {
        let mut cache = ReadingStateCache::open(MemoryStore::new(), "t", 10);
        cache.save_at(state("old"), 1);
        cache.save_at(state("new"), 3);
        cache.save_at(state("mid"), 2);

        let ids: Vec<&str> = cache.list().iter().map(|s| s.book_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn remove_is_noop_when_absent() {
        let mut cache = ReadingStateCache::open(MemoryStore::new(), "t", 10);
        cache.save_at(state("book-1"), 1);

        assert!(cache.remove("book-1"));
        assert!(!cache.remove("book-1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn persists_and_reloads_through_store() {
        let store = MemoryStore::new();
        {
            let mut cache = ReadingStateCache::open(&store, "t", 10);
            cache.save_at(state("book-1"), 7);
        }

        let reloaded = ReadingStateCache::open(&store, "t", 10);
        assert_eq!(reloaded.get("book-1").unwrap().last_accessed, 7);
    }

    #[test]
    fn corrupt_store_treated_as_empty() {
        let store = MemoryStore::new();
        store.store("t", "not json at all {");

        let cache = ReadingStateCache::open(&store, "t", 10);
        assert!(cache.is_empty());
    }
}
