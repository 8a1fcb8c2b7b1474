use crate::db::*;
use crate::error::{AppError, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Arc;

/// Database wrapper for thread-safe access.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Internal(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Open in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Internal(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- Users table
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                display_name TEXT,
                role TEXT NOT NULL DEFAULT 'user',
                created_at INTEGER NOT NULL,
                last_login INTEGER
            );

            -- Sessions table
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            -- Books table
            CREATE TABLE IF NOT EXISTS books (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT,
                description TEXT,
                content_path TEXT,
                content_type TEXT,
                cover_url TEXT,
                owner_id TEXT,
                views INTEGER NOT NULL DEFAULT 0,
                downloads INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE SET NULL
            );

            -- Comments table (threaded via parent_id)
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                book_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                parent_id INTEGER,
                content TEXT NOT NULL,
                is_edited INTEGER NOT NULL DEFAULT 0,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (parent_id) REFERENCES comments(id) ON DELETE CASCADE
            );

            -- Favorites table
            CREATE TABLE IF NOT EXISTS favorites (
                user_id TEXT NOT NULL,
                book_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (user_id, book_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);
            CREATE INDEX IF NOT EXISTS idx_books_owner ON books(owner_id);
            CREATE INDEX IF NOT EXISTS idx_comments_book ON comments(book_id);
            CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);
            CREATE INDEX IF NOT EXISTS idx_favorites_user ON favorites(user_id);
            "#,
        )
        .map_err(|e| AppError::Internal(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    // ========== USER OPERATIONS ==========

    /// Create a new user.
    pub fn create_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (id, username, password_hash, display_name, role, created_at, last_login)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id,
                user.username,
                user.password_hash,
                user.display_name,
                user.role,
                user.created_at,
                user.last_login,
            ],
        )
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint") {
                AppError::Validation(format!("Username '{}' already exists", user.username))
            } else {
                AppError::Internal(format!("Failed to create user: {}", e))
            }
        })?;
        Ok(())
    }

    /// Get user by username.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, username, password_hash, display_name, role, created_at, last_login
             FROM users WHERE username = ?1",
            params![username],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get user: {}", e)))
    }

    /// Get user by ID.
    pub fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, username, password_hash, display_name, role, created_at, last_login
             FROM users WHERE id = ?1",
            params![id],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get user: {}", e)))
    }

    /// List all users.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, username, password_hash, display_name, role, created_at, last_login
                 FROM users ORDER BY username",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let users = stmt
            .query_map([], Self::row_to_user)
            .map_err(|e| AppError::Internal(format!("Failed to list users: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect users: {}", e)))?;

        Ok(users)
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            display_name: row.get(3)?,
            role: row.get(4)?,
            created_at: row.get(5)?,
            last_login: row.get(6)?,
        })
    }

    /// Update user password.
    pub fn update_user_password(&self, username: &str, password_hash: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE users SET password_hash = ?1 WHERE username = ?2",
                params![password_hash, username],
            )
            .map_err(|e| AppError::Internal(format!("Failed to update password: {}", e)))?;
        Ok(rows > 0)
    }

    /// Update user display name.
    pub fn update_user_display_name(&self, user_id: &str, display_name: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE users SET display_name = ?1 WHERE id = ?2",
                params![display_name, user_id],
            )
            .map_err(|e| AppError::Internal(format!("Failed to update display name: {}", e)))?;
        Ok(rows > 0)
    }

    /// Update user last login.
    pub fn update_user_last_login(&self, user_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![now_timestamp(), user_id],
        )
        .map_err(|e| AppError::Internal(format!("Failed to update last login: {}", e)))?;
        Ok(())
    }

    /// Delete user.
    pub fn delete_user(&self, username: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM users WHERE username = ?1", params![username])
            .map_err(|e| AppError::Internal(format!("Failed to delete user: {}", e)))?;
        Ok(rows > 0)
    }

    // ========== SESSION OPERATIONS ==========

    /// Create session.
    pub fn create_session(&self, session: &Session) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![session.token, session.user_id, session.expires_at],
        )
        .map_err(|e| AppError::Internal(format!("Failed to create session: {}", e)))?;
        Ok(())
    }

    /// Get session by token.
    pub fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT token, user_id, expires_at FROM sessions WHERE token = ?1",
            params![token],
            |row| {
                Ok(Session {
                    token: row.get(0)?,
                    user_id: row.get(1)?,
                    expires_at: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get session: {}", e)))
    }

    /// Delete session.
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])
            .map_err(|e| AppError::Internal(format!("Failed to delete session: {}", e)))?;
        Ok(())
    }

    /// Cleanup expired sessions.
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                params![now_timestamp()],
            )
            .map_err(|e| AppError::Internal(format!("Failed to cleanup sessions: {}", e)))?;
        Ok(rows)
    }

    // ========== BOOK OPERATIONS ==========

    /// Create or update a book.
    pub fn save_book(&self, book: &Book) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO books
             (id, title, author, description, content_path, content_type, cover_url,
              owner_id, views, downloads, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT (id) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                description = excluded.description,
                content_path = excluded.content_path,
                content_type = excluded.content_type,
                cover_url = excluded.cover_url,
                updated_at = excluded.updated_at",
            params![
                book.id,
                book.title,
                book.author,
                book.description,
                book.content_path,
                book.content_type,
                book.cover_url,
                book.owner_id,
                book.views,
                book.downloads,
                book.created_at,
                book.updated_at,
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to save book: {}", e)))?;
        Ok(())
    }

    /// Get book by ID.
    pub fn get_book(&self, id: &str) -> Result<Option<Book>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, title, author, description, content_path, content_type, cover_url,
                    owner_id, views, downloads, created_at, updated_at
             FROM books WHERE id = ?1",
            params![id],
            Self::row_to_book,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get book: {}", e)))
    }

    /// List all books sorted by title, optionally filtered by a
    /// case-insensitive title/author substring.
    pub fn list_books(&self, search: Option<&str>) -> Result<Vec<Book>> {
        let conn = self.conn.lock();

        let (sql, pattern) = match search {
            Some(q) => (
                "SELECT id, title, author, description, content_path, content_type, cover_url,
                        owner_id, views, downloads, created_at, updated_at
                 FROM books
                 WHERE title LIKE ?1 COLLATE NOCASE OR author LIKE ?1 COLLATE NOCASE
                 ORDER BY title COLLATE NOCASE",
                Some(format!("%{}%", q)),
            ),
            None => (
                "SELECT id, title, author, description, content_path, content_type, cover_url,
                        owner_id, views, downloads, created_at, updated_at
                 FROM books ORDER BY title COLLATE NOCASE",
                None,
            ),
        };

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let rows = match pattern {
            Some(p) => stmt.query_map(params![p], Self::row_to_book),
            None => stmt.query_map([], Self::row_to_book),
        };

        let books = rows
            .map_err(|e| AppError::Internal(format!("Failed to list books: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect books: {}", e)))?;

        Ok(books)
    }

    /// List books uploaded by a user.
    pub fn get_books_by_owner(&self, owner_id: &str) -> Result<Vec<Book>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, title, author, description, content_path, content_type, cover_url,
                        owner_id, views, downloads, created_at, updated_at
                 FROM books WHERE owner_id = ?1 ORDER BY created_at DESC",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let books = stmt
            .query_map(params![owner_id], Self::row_to_book)
            .map_err(|e| AppError::Internal(format!("Failed to get books: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect books: {}", e)))?;

        Ok(books)
    }

    /// Delete a book.
    pub fn delete_book(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM books WHERE id = ?1", params![id])
            .map_err(|e| AppError::Internal(format!("Failed to delete book: {}", e)))?;
        Ok(rows > 0)
    }

    /// Bump the view counter.
    pub fn increment_views(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE books SET views = views + 1 WHERE id = ?1",
            params![id],
        )
        .map_err(|e| AppError::Internal(format!("Failed to increment views: {}", e)))?;
        Ok(())
    }

    /// Bump the download counter.
    pub fn increment_downloads(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE books SET downloads = downloads + 1 WHERE id = ?1",
            params![id],
        )
        .map_err(|e| AppError::Internal(format!("Failed to increment downloads: {}", e)))?;
        Ok(())
    }

    fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            description: row.get(3)?,
            content_path: row.get(4)?,
            content_type: row.get(5)?,
            cover_url: row.get(6)?,
            owner_id: row.get(7)?,
            views: row.get(8)?,
            downloads: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    // ========== COMMENT OPERATIONS ==========

    /// Insert a comment, returning its assigned ID.
    pub fn insert_comment(&self, comment: &Comment) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO comments
             (book_id, user_id, parent_id, content, is_edited, is_deleted, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                comment.book_id,
                comment.user_id,
                comment.parent_id,
                comment.content,
                comment.is_edited,
                comment.is_deleted,
                comment.created_at,
                comment.updated_at,
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to insert comment: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a single comment by ID.
    pub fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT c.id, c.book_id, c.user_id, u.username, c.parent_id, c.content,
                    c.is_edited, c.is_deleted, c.created_at, c.updated_at
             FROM comments c JOIN users u ON u.id = c.user_id
             WHERE c.id = ?1",
            params![id],
            Self::row_to_comment,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get comment: {}", e)))
    }

    /// All comments for a book, parents before replies.
    pub fn get_book_comments(&self, book_id: &str) -> Result<Vec<Comment>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT c.id, c.book_id, c.user_id, u.username, c.parent_id, c.content,
                        c.is_edited, c.is_deleted, c.created_at, c.updated_at
                 FROM comments c JOIN users u ON u.id = c.user_id
                 WHERE c.book_id = ?1
                 ORDER BY c.created_at, c.id",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let comments = stmt
            .query_map(params![book_id], Self::row_to_comment)
            .map_err(|e| AppError::Internal(format!("Failed to get comments: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect comments: {}", e)))?;

        Ok(comments)
    }

    /// Update a comment's text, marking it edited.
    pub fn update_comment(&self, id: i64, user_id: &str, content: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE comments SET content = ?1, is_edited = 1, updated_at = ?2
                 WHERE id = ?3 AND user_id = ?4 AND is_deleted = 0",
                params![content, now_timestamp(), id, user_id],
            )
            .map_err(|e| AppError::Internal(format!("Failed to update comment: {}", e)))?;
        Ok(rows > 0)
    }

    /// Whether a comment has replies.
    pub fn comment_has_replies(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM comments WHERE parent_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Internal(format!("Failed to count replies: {}", e)))?;
        Ok(count > 0)
    }

    /// Blank a comment but keep the row so its replies stay threaded.
    pub fn tombstone_comment(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE comments SET content = '', is_deleted = 1, updated_at = ?1 WHERE id = ?2",
                params![now_timestamp(), id],
            )
            .map_err(|e| AppError::Internal(format!("Failed to tombstone comment: {}", e)))?;
        Ok(rows > 0)
    }

    /// Remove a comment row entirely (leaf comments only; replies
    /// cascade via the foreign key).
    pub fn delete_comment(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM comments WHERE id = ?1", params![id])
            .map_err(|e| AppError::Internal(format!("Failed to delete comment: {}", e)))?;
        Ok(rows > 0)
    }

    fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
        Ok(Comment {
            id: row.get(0)?,
            book_id: row.get(1)?,
            user_id: row.get(2)?,
            username: row.get(3)?,
            parent_id: row.get(4)?,
            content: row.get(5)?,
            is_edited: row.get(6)?,
            is_deleted: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    // ========== FAVORITE OPERATIONS ==========

    /// Mark a book as a favorite. Idempotent.
    pub fn add_favorite(&self, user_id: &str, book_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO favorites (user_id, book_id, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, book_id, now_timestamp()],
        )
        .map_err(|e| AppError::Internal(format!("Failed to add favorite: {}", e)))?;
        Ok(())
    }

    /// Remove a favorite marker.
    pub fn remove_favorite(&self, user_id: &str, book_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "DELETE FROM favorites WHERE user_id = ?1 AND book_id = ?2",
                params![user_id, book_id],
            )
            .map_err(|e| AppError::Internal(format!("Failed to remove favorite: {}", e)))?;
        Ok(rows > 0)
    }

    /// Whether a book is in the user's favorites.
    pub fn is_favorite(&self, user_id: &str, book_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM favorites WHERE user_id = ?1 AND book_id = ?2",
                params![user_id, book_id],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Internal(format!("Failed to check favorite: {}", e)))?;
        Ok(count > 0)
    }

    /// Favorite books for a user, most recently favorited first.
    pub fn get_favorite_books(&self, user_id: &str) -> Result<Vec<Book>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT b.id, b.title, b.author, b.description, b.content_path, b.content_type,
                        b.cover_url, b.owner_id, b.views, b.downloads, b.created_at, b.updated_at
                 FROM books b JOIN favorites f ON f.book_id = b.id
                 WHERE f.user_id = ?1
                 ORDER BY f.created_at DESC",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let books = stmt
            .query_map(params![user_id], Self::row_to_book)
            .map_err(|e| AppError::Internal(format!("Failed to get favorites: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect favorites: {}", e)))?;

        Ok(books)
    }

    // ========== STATS ==========

    /// Total number of books.
    pub fn book_count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .map_err(|e| AppError::Internal(format!("Failed to count books: {}", e)))?;
        Ok(count as usize)
    }

    /// Sum of view and download counters across all books.
    pub fn counter_totals(&self) -> Result<(i64, i64)> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COALESCE(SUM(views), 0), COALESCE(SUM(downloads), 0) FROM books",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sum counters: {}", e)))
    }
}
