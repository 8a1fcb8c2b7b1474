//! Paginated text reader core.
//!
//! Everything the reader needs lives here: splitting raw text into
//! fixed line-count pages, the page navigation state machine, and a
//! bounded cache of per-book reading positions persisted through a
//! pluggable key-value store. The server mounts one cache per user;
//! the `read` CLI command mounts a file-backed one for local books.

mod cache;
mod paginator;
mod session;
mod store;

pub use cache::ReadingStateCache;
pub use paginator::paginate;
pub use session::{LoadTicket, ReaderSession};
pub use store::{FileStore, MemoryStore, StateStore};

use serde::{Deserialize, Serialize};

/// Persisted reading position and settings for one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingState {
    /// Book this state belongs to.
    pub book_id: String,
    /// Zero-based index of the page the reader was on.
    pub current_page: usize,
    /// Lines-per-page setting in effect when the state was saved.
    pub lines_per_page: usize,
    /// Title shown in the "recently read" list.
    pub display_name: String,
    /// Unix timestamp of the last save, used for eviction order.
    pub last_accessed: i64,
}
