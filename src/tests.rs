use crate::auth::AuthService;
use crate::comments;
use crate::config::{Config, ContentKind};
use crate::db::{Book, Comment, Database, Session, User, now_timestamp};
use crate::reader::{MemoryStore, ReaderSession, ReadingState, ReadingStateCache};

fn test_db() -> Database {
    Database::open_memory().unwrap()
}

fn create_user(db: &Database, id: &str, username: &str) {
    let user = User {
        id: id.to_string(),
        username: username.to_string(),
        password_hash: "hash".to_string(),
        display_name: None,
        role: "user".to_string(),
        created_at: now_timestamp(),
        last_login: None,
    };
    db.create_user(&user).unwrap();
}

fn create_book(db: &Database, id: &str, title: &str) {
    let book = Book {
        id: id.to_string(),
        title: title.to_string(),
        author: None,
        description: None,
        content_path: Some(format!("{}.txt", id)),
        content_type: Some("text/plain".to_string()),
        cover_url: None,
        owner_id: None,
        views: 0,
        downloads: 0,
        created_at: now_timestamp(),
        updated_at: now_timestamp(),
    };
    db.save_book(&book).unwrap();
}

fn create_comment(db: &Database, book_id: &str, user_id: &str, parent_id: Option<i64>) -> i64 {
    let comment = Comment {
        id: 0,
        book_id: book_id.to_string(),
        user_id: user_id.to_string(),
        username: String::new(),
        parent_id,
        content: "hello".to_string(),
        is_edited: false,
        is_deleted: false,
        created_at: now_timestamp(),
        updated_at: now_timestamp(),
    };
    db.insert_comment(&comment).unwrap()
}

fn setup_user_and_book(db: &Database) {
    create_user(db, "user-1", "testuser");
    create_book(db, "book-1", "Test Book");
}

#[test]
fn db_create_and_get_user() {
    let db = test_db();
    let user = User {
        id: "user-1".to_string(),
        username: "alice".to_string(),
        password_hash: "hash".to_string(),
        display_name: Some("Alice".to_string()),
        role: "user".to_string(),
        created_at: now_timestamp(),
        last_login: None,
    };

    db.create_user(&user).unwrap();

    let found = db.get_user_by_username("alice").unwrap().unwrap();
    assert_eq!(found.id, "user-1");
    assert_eq!(found.username, "alice");

    let found_by_id = db.get_user_by_id("user-1").unwrap().unwrap();
    assert_eq!(found_by_id.username, "alice");
}

#[test]
fn db_duplicate_username_fails() {
    let db = test_db();
    create_user(&db, "user-1", "alice");

    let dup = User {
        id: "user-2".to_string(),
        username: "alice".to_string(),
        password_hash: "hash2".to_string(),
        display_name: None,
        role: "user".to_string(),
        created_at: now_timestamp(),
        last_login: None,
    };

    assert!(db.create_user(&dup).is_err());
}

#[test]
fn db_delete_user() {
    let db = test_db();
    create_user(&db, "user-1", "bob");

    assert!(db.delete_user("bob").unwrap());
    assert!(db.get_user_by_username("bob").unwrap().is_none());
}

#[test]
fn db_update_display_name() {
    let db = test_db();
    create_user(&db, "user-1", "alice");

    assert!(db.update_user_display_name("user-1", "Alice B").unwrap());
    let found = db.get_user_by_id("user-1").unwrap().unwrap();
    assert_eq!(found.display_name.as_deref(), Some("Alice B"));
}

#[test]
fn db_create_and_delete_session() {
    let db = test_db();
    create_user(&db, "user-1", "testuser");

    let session = Session {
        token: "token123".to_string(),
        user_id: "user-1".to_string(),
        expires_at: now_timestamp() + 3600,
    };

    db.create_session(&session).unwrap();

    let found = db.get_session("token123").unwrap().unwrap();
    assert_eq!(found.user_id, "user-1");

    db.delete_session("token123").unwrap();
    assert!(db.get_session("token123").unwrap().is_none());
}

#[test]
fn db_expired_sessions_cleanup() {
    let db = test_db();
    create_user(&db, "user-1", "testuser");

    let expired = Session {
        token: "expired".to_string(),
        user_id: "user-1".to_string(),
        expires_at: now_timestamp() - 3600,
    };
    let valid = Session {
        token: "valid".to_string(),
        user_id: "user-1".to_string(),
        expires_at: now_timestamp() + 3600,
    };

    db.create_session(&expired).unwrap();
    db.create_session(&valid).unwrap();

    db.cleanup_expired_sessions().unwrap();

    assert!(db.get_session("expired").unwrap().is_none());
    assert!(db.get_session("valid").unwrap().is_some());
}

#[test]
fn db_save_and_get_book() {
    let db = test_db();
    create_book(&db, "book-1", "Test Book");

    let found = db.get_book("book-1").unwrap().unwrap();
    assert_eq!(found.title, "Test Book");
    assert_eq!(found.content_type.as_deref(), Some("text/plain"));
}

#[test]
fn db_save_book_upsert_keeps_counters() {
    let db = test_db();
    create_book(&db, "book-1", "Original");
    db.increment_views("book-1").unwrap();
    db.increment_views("book-1").unwrap();

    let mut book = db.get_book("book-1").unwrap().unwrap();
    book.title = "Renamed".to_string();
    db.save_book(&book).unwrap();

    let found = db.get_book("book-1").unwrap().unwrap();
    assert_eq!(found.title, "Renamed");
    assert_eq!(found.views, 2);
}

#[test]
fn db_list_books_search() {
    let db = test_db();
    create_book(&db, "book-1", "The Rust Book");
    create_book(&db, "book-2", "Cooking for Two");

    let all = db.list_books(None).unwrap();
    assert_eq!(all.len(), 2);

    let hits = db.list_books(Some("rust")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "book-1");

    assert!(db.list_books(Some("nothing")).unwrap().is_empty());
}

#[test]
fn db_delete_book() {
    let db = test_db();
    create_book(&db, "book-del", "To Delete");

    assert!(db.delete_book("book-del").unwrap());
    assert!(db.get_book("book-del").unwrap().is_none());
}

#[test]
fn db_counters_and_totals() {
    let db = test_db();
    create_book(&db, "book-1", "A");
    create_book(&db, "book-2", "B");

    db.increment_views("book-1").unwrap();
    db.increment_views("book-2").unwrap();
    db.increment_downloads("book-1").unwrap();

    assert_eq!(db.book_count().unwrap(), 2);
    assert_eq!(db.counter_totals().unwrap(), (2, 1));
}

#[test]
fn db_comment_insert_and_fetch_with_username() {
    let db = test_db();
    setup_user_and_book(&db);

    let id = create_comment(&db, "book-1", "user-1", None);

    let found = db.get_comment(id).unwrap().unwrap();
    assert_eq!(found.username, "testuser");
    assert!(!found.is_edited);
}

#[test]
fn db_comments_ordered_parents_first() {
    let db = test_db();
    setup_user_and_book(&db);

    let parent = create_comment(&db, "book-1", "user-1", None);
    let reply = create_comment(&db, "book-1", "user-1", Some(parent));

    let rows = db.get_book_comments("book-1").unwrap();
    let parent_pos = rows.iter().position(|c| c.id == parent).unwrap();
    let reply_pos = rows.iter().position(|c| c.id == reply).unwrap();
    assert!(parent_pos < reply_pos);
}

#[test]
fn db_comment_update_marks_edited() {
    let db = test_db();
    setup_user_and_book(&db);
    let id = create_comment(&db, "book-1", "user-1", None);

    assert!(db.update_comment(id, "user-1", "edited").unwrap());

    let found = db.get_comment(id).unwrap().unwrap();
    assert_eq!(found.content, "edited");
    assert!(found.is_edited);
}

#[test]
fn db_comment_update_guards_author() {
    let db = test_db();
    setup_user_and_book(&db);
    create_user(&db, "user-2", "other");
    let id = create_comment(&db, "book-1", "user-1", None);

    assert!(!db.update_comment(id, "user-2", "hijacked").unwrap());
    assert_eq!(db.get_comment(id).unwrap().unwrap().content, "hello");
}

#[test]
fn db_tombstone_keeps_replies_threaded() {
    let db = test_db();
    setup_user_and_book(&db);

    let parent = create_comment(&db, "book-1", "user-1", None);
    let reply = create_comment(&db, "book-1", "user-1", Some(parent));

    assert!(db.comment_has_replies(parent).unwrap());
    assert!(db.tombstone_comment(parent).unwrap());

    let tree = comments::build_tree(db.get_book_comments("book-1").unwrap());
    assert_eq!(tree.len(), 1);
    assert!(tree[0].comment.is_deleted);
    assert!(tree[0].comment.content.is_empty());
    assert_eq!(tree[0].replies[0].comment.id, reply);
}

#[test]
fn db_leaf_comment_deleted_outright() {
    let db = test_db();
    setup_user_and_book(&db);

    let id = create_comment(&db, "book-1", "user-1", None);
    assert!(!db.comment_has_replies(id).unwrap());
    assert!(db.delete_comment(id).unwrap());
    assert!(db.get_comment(id).unwrap().is_none());
}

#[test]
fn db_favorites_round_trip() {
    let db = test_db();
    setup_user_and_book(&db);
    create_book(&db, "book-2", "Second");

    db.add_favorite("user-1", "book-1").unwrap();
    db.add_favorite("user-1", "book-2").unwrap();
    // Idempotent re-add
    db.add_favorite("user-1", "book-1").unwrap();

    assert!(db.is_favorite("user-1", "book-1").unwrap());
    assert_eq!(db.get_favorite_books("user-1").unwrap().len(), 2);

    assert!(db.remove_favorite("user-1", "book-1").unwrap());
    assert!(!db.remove_favorite("user-1", "book-1").unwrap());
    assert!(!db.is_favorite("user-1", "book-1").unwrap());
}

#[test]
fn db_deleting_book_cascades_comments_and_favorites() {
    let db = test_db();
    setup_user_and_book(&db);

    create_comment(&db, "book-1", "user-1", None);
    db.add_favorite("user-1", "book-1").unwrap();

    db.delete_book("book-1").unwrap();

    assert!(db.get_book_comments("book-1").unwrap().is_empty());
    assert!(db.get_favorite_books("user-1").unwrap().is_empty());
}

#[test]
fn auth_create_user_and_login() {
    let db = test_db();
    let auth = AuthService::new(db, 30, true);

    let user = auth.create_user("testuser", "password123", "user").unwrap();
    assert_eq!(user.username, "testuser");
    assert_eq!(user.role, "user");

    let (logged_in, token) = auth.login("testuser", "password123").unwrap();
    assert_eq!(logged_in.username, "testuser");
    assert!(!token.is_empty());
}

#[test]
fn auth_validate_token() {
    let db = test_db();
    let auth = AuthService::new(db, 30, true);

    auth.create_user("alice", "pass1234", "admin").unwrap();
    let (_, token) = auth.login("alice", "pass1234").unwrap();

    let user = auth.validate_token(&token).unwrap().unwrap();
    assert_eq!(user.username, "alice");

    assert!(auth.validate_token("invalid_token").unwrap().is_none());
}

#[test]
fn auth_logout() {
    let db = test_db();
    let auth = AuthService::new(db, 30, true);

    auth.create_user("bob", "password", "user").unwrap();
    let (_, token) = auth.login("bob", "password").unwrap();

    auth.logout(&token).unwrap();
    assert!(auth.validate_token(&token).unwrap().is_none());
}

#[test]
fn auth_registration_disabled() {
    let db = test_db();
    let auth = AuthService::new(db, 30, false);

    let result = auth.register("newuser", "password");
    assert!(result.is_err());
}

#[test]
fn auth_invalid_password() {
    let db = test_db();
    let auth = AuthService::new(db, 30, true);

    auth.create_user("user", "correct", "user").unwrap();
    assert!(auth.login("user", "wrong").is_err());
}

#[test]
fn auth_change_password() {
    let db = test_db();
    let auth = AuthService::new(db, 30, true);

    auth.create_user("user", "oldpass", "user").unwrap();
    auth.change_password("user", "newpass").unwrap();

    assert!(auth.login("user", "oldpass").is_err());
    assert!(auth.login("user", "newpass").is_ok());
}

#[test]
fn auth_short_password_rejected() {
    let db = test_db();
    let auth = AuthService::new(db, 30, true);

    assert!(auth.create_user("user", "abc", "user").is_err());
}

#[test]
fn auth_invalid_username_rejected() {
    let db = test_db();
    let auth = AuthService::new(db, 30, true);

    assert!(auth.create_user("user@email", "password", "user").is_err());
    assert!(auth.create_user("user name", "password", "user").is_err());
    assert!(auth.create_user("", "password", "user").is_err());
}

#[test]
fn auth_is_admin() {
    let db = test_db();
    let auth = AuthService::new(db, 30, true);

    let admin = auth.create_user("admin", "password", "admin").unwrap();
    let user = auth.create_user("user", "password", "user").unwrap();

    assert!(auth.is_admin(&admin));
    assert!(!auth.is_admin(&user));
}

#[test]
fn config_parse_toml() {
    let toml = r#"
[server]
bind = "127.0.0.1:9090"
title = "Test Library"

[database]
path = "/tmp/test.db"

[auth]
registration = "disabled"
session_days = 7

[reader]
default_lines_per_page = 100
lines_per_page_options = [100, 200]
max_recent_books = 5
"#;
    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.server.bind.port(), 9090);
    assert_eq!(config.server.title, "Test Library");
    assert!(!config.auth.registration_enabled());
    assert_eq!(config.auth.session_days, 7);
    assert_eq!(config.reader.default_lines_per_page, 100);
    assert_eq!(config.reader.lines_per_page_options, vec![100, 200]);
    assert_eq!(config.reader.max_recent_books, 5);
}

#[test]
fn config_default_values() {
    let config = Config::default();
    assert_eq!(config.server.bind.port(), 8080);
    assert!(config.auth.registration_enabled());
    assert_eq!(config.reader.default_lines_per_page, 80);
    assert_eq!(config.reader.lines_per_page_options, vec![80, 100, 150, 200, 400]);
    assert_eq!(config.reader.max_recent_books, 10);
}

#[test]
fn config_generated_default_parses() {
    let config: Config = toml::from_str(&Config::generate_default()).unwrap();
    assert_eq!(config.server.title, "My Library");
}

#[test]
fn config_sanitize_lines_per_page() {
    let config = Config::default();
    assert_eq!(config.reader.sanitize_lines_per_page(Some(200)), 200);
    assert_eq!(config.reader.sanitize_lines_per_page(Some(0)), 80);
    assert_eq!(config.reader.sanitize_lines_per_page(None), 80);
}

#[test]
fn content_kind_from_mime() {
    assert_eq!(ContentKind::from_mime("application/json"), Some(ContentKind::Json));
    assert_eq!(ContentKind::from_mime("text/html"), Some(ContentKind::Html));
    assert_eq!(ContentKind::from_mime("application/rtf"), Some(ContentKind::Rtf));
    assert_eq!(ContentKind::from_mime("application/pdf"), Some(ContentKind::Pdf));
    assert_eq!(ContentKind::from_mime("application/msword"), Some(ContentKind::Doc));
    assert_eq!(
        ContentKind::from_mime(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        ),
        Some(ContentKind::Docx)
    );
    assert_eq!(ContentKind::from_mime("text/plain"), Some(ContentKind::Text));
    assert_eq!(ContentKind::from_mime("image/png"), None);
}

#[test]
fn content_kind_ignores_charset() {
    assert_eq!(
        ContentKind::from_mime("text/plain; charset=utf-8"),
        Some(ContentKind::Text)
    );
}

#[test]
fn content_kind_from_extension() {
    assert_eq!(ContentKind::from_extension("txt"), Some(ContentKind::Text));
    assert_eq!(ContentKind::from_extension("PDF"), Some(ContentKind::Pdf));
    assert_eq!(ContentKind::from_extension("htm"), Some(ContentKind::Html));
    assert_eq!(ContentKind::from_extension("exe"), None);
}

#[test]
fn content_kind_inline_renderable() {
    assert!(ContentKind::Text.inline_renderable());
    assert!(ContentKind::Json.inline_renderable());
    assert!(ContentKind::Html.inline_renderable());
    assert!(ContentKind::Rtf.inline_renderable());
    assert!(!ContentKind::Pdf.inline_renderable());
    assert!(!ContentKind::Doc.inline_renderable());
    assert!(!ContentKind::Docx.inline_renderable());
}

#[test]
fn book_title_slug_and_download_filename() {
    let mut book = Book {
        id: "book-1".to_string(),
        title: "  The Great   Adventure ".to_string(),
        author: None,
        description: None,
        content_path: Some("book-1.txt".to_string()),
        content_type: Some("text/plain".to_string()),
        cover_url: None,
        owner_id: None,
        views: 0,
        downloads: 0,
        created_at: 0,
        updated_at: 0,
    };

    assert_eq!(book.title_slug(), "the-great-adventure");
    assert_eq!(book.download_filename(), "the-great-adventure.txt");

    book.content_type = None;
    assert_eq!(book.download_filename(), "the-great-adventure.unknown");
}

#[test]
fn reader_session_resumes_from_cache() {
    let store = MemoryStore::new();
    let mut cache = ReadingStateCache::open(&store, "user-1", 10);

    // First visit: read a bit and leave.
    let mut session = ReaderSession::new(2);
    let ticket = session.begin_load("book-1");
    assert!(session.complete_load(ticket, "a\nb\nc\nd\ne\nf", cache.get("book-1")));
    session.next();
    session.next();
    cache.save(session.state("My Book").unwrap());

    // Second visit through a fresh cache over the same store.
    let cache = ReadingStateCache::open(&store, "user-1", 10);
    let mut session = ReaderSession::new(2);
    let ticket = session.begin_load("book-1");
    assert!(session.complete_load(ticket, "a\nb\nc\nd\ne\nf", cache.get("book-1")));

    assert_eq!(session.current_page(), 2);
    assert_eq!(session.page(), "e\nf");
}

#[test]
fn reader_cache_is_scoped_per_key() {
    let store = MemoryStore::new();

    let mut alice = ReadingStateCache::open(&store, "alice", 10);
    alice.save(ReadingState {
        book_id: "book-1".to_string(),
        current_page: 3,
        lines_per_page: 80,
        display_name: "Book".to_string(),
        last_accessed: 0,
    });

    let bob = ReadingStateCache::open(&store, "bob", 10);
    assert!(bob.get("book-1").is_none());
}
