mod schema;

pub use schema::Database;

use crate::config::ContentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: String,
    /// Username for login.
    pub username: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name.
    pub display_name: Option<String>,
    /// User role: "admin" or "user".
    pub role: String,
    /// Account creation timestamp.
    pub created_at: i64,
    /// Last login timestamp.
    pub last_login: Option<i64>,
}

/// Authentication session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session token.
    pub token: String,
    /// User ID.
    pub user_id: String,
    /// Expiration timestamp.
    pub expires_at: i64,
}

/// A book in the library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique book ID.
    pub id: String,
    /// Book title.
    pub title: String,
    /// Author name.
    pub author: Option<String>,
    /// Description or summary.
    pub description: Option<String>,
    /// Stored content file, relative to the content directory.
    /// `None` until content has been uploaded.
    pub content_path: Option<String>,
    /// MIME type recorded when the content was uploaded.
    pub content_type: Option<String>,
    /// Cover image URL.
    pub cover_url: Option<String>,
    /// User who uploaded the book.
    pub owner_id: Option<String>,
    /// Number of times the book page was viewed.
    pub views: i64,
    /// Number of times the content was downloaded.
    pub downloads: i64,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

impl Book {
    /// Content kind classified from the recorded MIME type.
    pub fn content_kind(&self) -> Option<ContentKind> {
        self.content_type.as_deref().and_then(ContentKind::from_mime)
    }

    /// URL-safe slug of the title: lowercase, spaces collapsed to dashes.
    pub fn title_slug(&self) -> String {
        let mut slug = String::with_capacity(self.title.len());
        let mut prev_dash = false;

        for c in self.title.to_lowercase().chars() {
            if c.is_whitespace() {
                if !prev_dash && !slug.is_empty() {
                    slug.push('-');
                    prev_dash = true;
                }
            } else {
                slug.push(c);
                prev_dash = false;
            }
        }

        slug.trim_end_matches('-').to_string()
    }

    /// Filename offered for downloads: title slug plus the kind's
    /// extension ("unknown" when the type was never recorded).
    pub fn download_filename(&self) -> String {
        let ext = self
            .content_kind()
            .map(|k| k.extension())
            .unwrap_or("unknown");
        format!("{}.{}", self.title_slug(), ext)
    }
}

/// A comment on a book, possibly a reply to another comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Comment ID.
    pub id: i64,
    /// Book the comment belongs to.
    pub book_id: String,
    /// Commenting user's ID.
    pub user_id: String,
    /// Commenting user's name (joined for display).
    pub username: String,
    /// Parent comment for threaded replies.
    pub parent_id: Option<i64>,
    /// Comment text. Blanked when tombstoned.
    pub content: String,
    /// Whether the comment was edited after posting.
    pub is_edited: bool,
    /// Whether the comment was deleted but kept as a tombstone to
    /// preserve the replies under it.
    pub is_deleted: bool,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// A user's favorite book marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    /// User ID.
    pub user_id: String,
    /// Book ID.
    pub book_id: String,
    /// When the favorite was added.
    pub created_at: i64,
}

/// Timestamp helper.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Convert timestamp to DateTime.
pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}
