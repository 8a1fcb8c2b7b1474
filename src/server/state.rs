//! Application state shared across handlers.

use crate::auth::AuthService;
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::reader::{FileStore, ReadingStateCache};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Database connection.
    pub db: Database,
    /// Authentication service.
    pub auth: Arc<AuthService>,
    /// Per-user reading-state caches, opened lazily and kept for the
    /// lifetime of the process. Each cache persists through its own
    /// file in the state directory.
    reader_caches: Arc<Mutex<HashMap<String, ReadingStateCache<FileStore>>>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: Config, db: Database, auth: AuthService) -> Self {
        Self {
            config: Arc::new(config),
            db,
            auth: Arc::new(auth),
            reader_caches: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Absolute path of a stored content file.
    pub fn content_path(&self, relative: &str) -> PathBuf {
        self.config.storage.content_dir.join(relative)
    }

    /// Write uploaded content to the content directory, returning the
    /// relative filename to record on the book.
    pub fn store_content(&self, book_id: &str, extension: &str, data: &[u8]) -> Result<String> {
        std::fs::create_dir_all(&self.config.storage.content_dir)?;

        let relative = format!("{}.{}", book_id, extension);
        std::fs::write(self.content_path(&relative), data)?;

        Ok(relative)
    }

    /// Remove a stored content file. Missing files are not an error.
    pub fn delete_content(&self, relative: &str) {
        let path = self.content_path(relative);
        if path.exists()
            && let Err(e) = std::fs::remove_file(&path)
        {
            tracing::warn!(error = %e, path = %path.display(), "Failed to remove content file");
        }
    }

    /// Run `f` against the reading-state cache for `user_id`, opening it
    /// from disk on first access.
    pub fn with_reader_cache<R>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut ReadingStateCache<FileStore>) -> R,
    ) -> R {
        let mut caches = self.reader_caches.lock();
        let cache = caches.entry(user_id.to_string()).or_insert_with(|| {
            ReadingStateCache::open(
                FileStore::new(self.config.storage.state_dir.clone()),
                user_id,
                self.config.reader.max_recent_books,
            )
        });

        f(cache)
    }
}
