//! Key-value persistence behind the reading-state cache.
//!
//! The cache serializes its whole mapping under a single key, so the
//! store only needs get/set/delete on strings. A failing store is not an
//! error condition for callers: reads come back empty and writes are
//! dropped with a log line, which leaves the reader in its first-visit
//! default state.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;

/// Storage backend for serialized reading state.
pub trait StateStore: Send + Sync {
    /// Read the value for `key`, or `None` if absent or unreadable.
    fn load(&self, key: &str) -> Option<String>;

    /// Write the value for `key`. Failures are swallowed.
    fn store(&self, key: &str, value: &str);

    /// Delete the value for `key` if present.
    fn delete(&self, key: &str);
}

impl<S: StateStore + ?Sized> StateStore for &S {
    fn load(&self, key: &str) -> Option<String> {
        (**self).load(key)
    }

    fn store(&self, key: &str, value: &str) {
        (**self).store(key, value)
    }

    fn delete(&self, key: &str) {
        (**self).delete(key)
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn store(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn delete(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

/// Store that keeps one JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created lazily
    /// on first write, so a missing one only means an empty store.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are user ids or fixed names, but never trust them as paths.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl StateStore for FileStore {
    fn load(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn store(&self, key: &str, value: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!(error = %e, dir = %self.dir.display(), "Reader state dir unavailable");
            return;
        }

        if let Err(e) = std::fs::write(self.path_for(key), value) {
            tracing::warn!(error = %e, key, "Failed to persist reader state");
        }
    }

    fn delete(&self, key: &str) {
        let path = self.path_for(key);
        if path.exists()
            && let Err(e) = std::fs::remove_file(&path)
        {
            tracing::warn!(error = %e, key, "Failed to delete reader state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load("k").is_none());

        store.store("k", "v");
        assert_eq!(store.load("k").as_deref(), Some("v"));

        store.delete("k");
        assert!(store.load("k").is_none());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());

        assert!(store.load("user-1").is_none());

        store.store("user-1", r#"{"a":1}"#);
        assert_eq!(store.load("user-1").as_deref(), Some(r#"{"a":1}"#));

        store.delete("user-1");
        assert!(store.load("user-1").is_none());
    }

    #[test]
    fn file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());

        store.store("../escape", "data");
        assert_eq!(store.load("../escape").as_deref(), Some("data"));
        // Nothing may be written outside the store directory.
        assert!(!dir.path().parent().unwrap().join("escape.json").exists());
    }
}
