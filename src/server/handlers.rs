//! HTTP request handlers.

use crate::auth;
use crate::comments::{self, CommentNode};
use crate::config::ContentKind;
use crate::db::{self, Book, Comment, User};
use crate::error::{AppError, Result};
use crate::reader::{ReadingState, paginate};
use crate::server::AppState;
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, Response},
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

// ============================================================================
// WEB PAGES
// ============================================================================

/// Index page (simple HTML).
pub async fn index(State(state): State<AppState>) -> Result<Html<String>> {
    let book_count = state.db.book_count()?;
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 600px; margin: 2rem auto; padding: 0 1rem; }}
        h1 {{ color: #333; }}
        a {{ color: #0066cc; }}
        .stats {{ background: #f5f5f5; padding: 1rem; border-radius: 8px; margin: 1rem 0; }}
        code {{ background: #e8e8e8; padding: 0.2rem 0.4rem; border-radius: 4px; }}
    </style>
</head>
<body>
    <h1>📚 {title}</h1>
    <div class="stats">
        <p><strong>{book_count}</strong> books in library</p>
    </div>
    <h2>API</h2>
    <ul>
        <li><a href="/api/books">Book listing (JSON)</a></li>
        <li><a href="/api/stats">Stats (JSON)</a></li>
        <li><code>POST /api/auth/login</code> to get a token</li>
    </ul>
</body>
</html>"#,
        title = state.config.server.title,
        book_count = book_count,
    );

    Ok(Html(html))
}

// ============================================================================
// AUTH API
// ============================================================================

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
    user_id: String,
    username: String,
    role: String,
}

/// Register request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    username: String,
    password: String,
}

/// Auth login.
pub async fn auth_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (user, token) = state.auth.login(&req.username, &req.password)?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
        role: user.role,
    }))
}

/// Auth register.
pub async fn auth_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<LoginResponse>> {
    let _user = state.auth.register(&req.username, &req.password)?;
    let (user, token) = state.auth.login(&req.username, &req.password)?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
        role: user.role,
    }))
}

/// Auth logout.
pub async fn auth_logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    if let Some(token) = extract_token(&headers) {
        state.auth.logout(&token)?;
    }
    Ok(StatusCode::OK)
}

/// Get current user info.
pub async fn auth_me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<User>> {
    let user = get_authenticated_user(&state, &headers).await?;
    Ok(Json(user))
}

/// Password change request.
#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    current_password: String,
    new_password: String,
}

/// Change the authenticated user's password.
pub async fn auth_change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PasswordRequest>,
) -> Result<StatusCode> {
    let user = get_authenticated_user(&state, &headers).await?;

    if !auth::verify_password(&req.current_password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Wrong password".to_string()));
    }

    state.auth.change_password(&user.username, &req.new_password)?;
    Ok(StatusCode::OK)
}

/// Profile update request.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    display_name: String,
}

/// Update the authenticated user's display name.
pub async fn auth_update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<User>> {
    let user = get_authenticated_user(&state, &headers).await?;
    state.auth.set_display_name(&user.id, &req.display_name)?;

    state
        .db
        .get_user_by_id(&user.id)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
        .map(Json)
}

// ============================================================================
// BOOK API
// ============================================================================

/// Book listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    q: Option<String>,
}

/// List all books, optionally filtered by a title/author search.
pub async fn books_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Book>>> {
    let query = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    Ok(Json(state.db.list_books(query)?))
}

/// Book detail response.
#[derive(Debug, Serialize)]
pub struct BookDetail {
    /// The book record.
    #[serde(flatten)]
    pub book: Book,
    /// Human-readable file type, "Unknown File" for unrecognized types.
    /// `None` until content has been uploaded.
    pub file_type: Option<String>,
    /// Whether the content can be shown in the paginated reader.
    pub inline_renderable: bool,
}

impl BookDetail {
    fn from_book(book: Book) -> Self {
        let kind = book.content_kind();
        let file_type = book.content_type.as_ref().map(|_| {
            kind.map(|k| k.display_name().to_string())
                .unwrap_or_else(|| "Unknown File".to_string())
        });

        Self {
            // Unrecognized types are treated as plain text in the reader.
            inline_renderable: book.content_path.is_some()
                && kind.map(|k| k.inline_renderable()).unwrap_or(true),
            file_type,
            book,
        }
    }
}

/// Book metadata. Counts a view.
pub async fn book_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookDetail>> {
    state.db.increment_views(&id)?;

    let book = state
        .db
        .get_book(&id)?
        .ok_or_else(|| AppError::NotFound(format!("Book not found: {}", id)))?;

    Ok(Json(BookDetail::from_book(book)))
}

/// Book creation request.
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    title: String,
    author: Option<String>,
    description: Option<String>,
    cover_url: Option<String>,
}

/// Create a book (metadata only; content is uploaded separately).
pub async fn book_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateBookRequest>,
) -> Result<Json<Book>> {
    let user = get_authenticated_user(&state, &headers).await?;

    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title must not be empty".to_string()));
    }

    let now = db::now_timestamp();
    let book = Book {
        id: uuid::Uuid::new_v4().to_string(),
        title: title.to_string(),
        author: req.author,
        description: req.description,
        content_path: None,
        content_type: None,
        cover_url: req.cover_url,
        owner_id: Some(user.id),
        views: 0,
        downloads: 0,
        created_at: now,
        updated_at: now,
    };

    state.db.save_book(&book)?;
    Ok(Json(book))
}

/// Book update request. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    title: Option<String>,
    author: Option<String>,
    description: Option<String>,
    cover_url: Option<String>,
}

/// Update book metadata. Owner or admin only.
pub async fn book_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<Json<Book>> {
    let user = get_authenticated_user(&state, &headers).await?;
    let mut book = get_owned_book(&state, &user, &id)?;

    if let Some(title) = req.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Title must not be empty".to_string()));
        }
        book.title = title;
    }
    if let Some(author) = req.author {
        book.author = Some(author);
    }
    if let Some(description) = req.description {
        book.description = Some(description);
    }
    if let Some(cover_url) = req.cover_url {
        book.cover_url = Some(cover_url);
    }
    book.updated_at = db::now_timestamp();

    state.db.save_book(&book)?;
    Ok(Json(book))
}

/// Delete a book and its stored content. Owner or admin only.
pub async fn book_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let user = get_authenticated_user(&state, &headers).await?;
    let book = get_owned_book(&state, &user, &id)?;

    if let Some(ref relative) = book.content_path {
        state.delete_content(relative);
    }

    state.db.delete_book(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload book content. The request body is the raw file; the
/// Content-Type header is recorded and drives classification.
pub async fn book_upload_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: axum::body::Bytes,
) -> Result<Json<BookDetail>> {
    let user = get_authenticated_user(&state, &headers).await?;
    let mut book = get_owned_book(&state, &user, &id)?;

    if body.is_empty() {
        return Err(AppError::Validation("Empty upload".to_string()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let extension = ContentKind::from_mime(&content_type)
        .map(|k| k.extension())
        .unwrap_or("bin");

    // Replace any previous content file.
    if let Some(ref old) = book.content_path {
        state.delete_content(old);
    }

    book.content_path = Some(state.store_content(&book.id, extension, &body)?);
    book.content_type = Some(content_type);
    book.updated_at = db::now_timestamp();
    state.db.save_book(&book)?;

    Ok(Json(BookDetail::from_book(book)))
}

/// Query parameters for paginated content.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Zero-based page to return. Absent means raw content.
    page: Option<usize>,
    /// Lines per page; zero or absent falls back to the default.
    lines: Option<usize>,
}

/// One page of paginated content.
#[derive(Debug, Serialize)]
pub struct PageResponse {
    /// Zero-based index of the returned page, clamped into range.
    pub page: usize,
    /// Total number of pages at this lines-per-page.
    pub page_count: usize,
    /// Lines-per-page used for pagination.
    pub lines_per_page: usize,
    /// The page text.
    pub content: String,
}

/// Book content. With `?page=N` returns one paginated page as JSON;
/// without it streams the raw file.
pub async fn book_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<Response<Body>> {
    let book = state
        .db
        .get_book(&id)?
        .ok_or_else(|| AppError::NotFound(format!("Book not found: {}", id)))?;

    let relative = book
        .content_path
        .as_deref()
        .ok_or_else(|| AppError::NotFound(format!("No content uploaded for book: {}", id)))?;
    let path = state.content_path(relative);

    let Some(page) = params.page else {
        // Raw content stream.
        let file = tokio::fs::File::open(&path).await?;
        let stream = ReaderStream::new(file);

        return Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                book.content_type.as_deref().unwrap_or("application/octet-stream"),
            )
            .body(Body::from_stream(stream))
            .map_err(|e| AppError::Internal(e.to_string()));
    };

    if let Some(kind) = book.content_kind()
        && !kind.inline_renderable()
    {
        return Err(AppError::Validation(format!(
            "{} content must be downloaded",
            kind.display_name()
        )));
    }

    let text = tokio::fs::read_to_string(&path).await?;
    let lines_per_page = state.config.reader.sanitize_lines_per_page(params.lines);
    let pages = paginate(&text, lines_per_page)?;

    let page = page.min(pages.len() - 1);
    let body = PageResponse {
        page,
        page_count: pages.len(),
        lines_per_page,
        content: pages[page].clone(),
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body)?))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Book download. Counts a download and offers the file as an
/// attachment named from the title slug.
pub async fn book_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response<Body>> {
    let book = state
        .db
        .get_book(&id)?
        .ok_or_else(|| AppError::NotFound(format!("Book not found: {}", id)))?;

    let relative = book
        .content_path
        .as_deref()
        .ok_or_else(|| AppError::NotFound(format!("No content uploaded for book: {}", id)))?;
    let path = state.content_path(relative);

    let metadata = tokio::fs::metadata(&path).await?;
    let file = tokio::fs::File::open(&path).await?;
    let stream = ReaderStream::new(file);

    state.db.increment_downloads(&id)?;

    let content_disposition = format!("attachment; filename=\"{}\"", book.download_filename());

    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            book.content_type.as_deref().unwrap_or("application/octet-stream"),
        )
        .header(header::CONTENT_DISPOSITION, content_disposition)
        .header(header::CONTENT_LENGTH, metadata.len())
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(e.to_string()))
}

// ============================================================================
// COMMENT API
// ============================================================================

/// Threaded comments for a book, parents before replies.
pub async fn comments_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CommentNode>>> {
    if state.db.get_book(&id)?.is_none() {
        return Err(AppError::NotFound(format!("Book not found: {}", id)));
    }

    let rows = state.db.get_book_comments(&id)?;
    Ok(Json(comments::build_tree(rows)))
}

/// Comment creation request.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    content: String,
    parent_id: Option<i64>,
}

/// Post a comment or a reply on a book.
pub async fn comment_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<Comment>> {
    let user = get_authenticated_user(&state, &headers).await?;

    if state.db.get_book(&id)?.is_none() {
        return Err(AppError::NotFound(format!("Book not found: {}", id)));
    }

    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Comment must not be empty".to_string()));
    }

    if let Some(parent_id) = req.parent_id {
        let parent = state
            .db
            .get_comment(parent_id)?
            .filter(|p| p.book_id == id)
            .ok_or_else(|| {
                AppError::Validation(format!("Parent comment not found: {}", parent_id))
            })?;

        if parent.is_deleted {
            return Err(AppError::Validation(
                "Cannot reply to a deleted comment".to_string(),
            ));
        }
    }

    let now = db::now_timestamp();
    let comment = Comment {
        id: 0, // Assigned by the database.
        book_id: id,
        user_id: user.id,
        username: user.username,
        parent_id: req.parent_id,
        content: content.to_string(),
        is_edited: false,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    };

    let comment_id = state.db.insert_comment(&comment)?;
    state
        .db
        .get_comment(comment_id)?
        .ok_or_else(|| AppError::Internal("Comment vanished after insert".to_string()))
        .map(Json)
}

/// Comment edit request.
#[derive(Debug, Deserialize)]
pub struct EditCommentRequest {
    content: String,
}

/// Edit one's own comment.
pub async fn comment_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<EditCommentRequest>,
) -> Result<Json<Comment>> {
    let user = get_authenticated_user(&state, &headers).await?;

    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Comment must not be empty".to_string()));
    }

    if !state.db.update_comment(id, &user.id, content)? {
        return Err(AppError::NotFound(format!(
            "Comment not found or not editable: {}",
            id
        )));
    }

    state
        .db
        .get_comment(id)?
        .ok_or_else(|| AppError::Internal("Comment vanished after update".to_string()))
        .map(Json)
}

/// Delete a comment. A comment with replies is tombstoned so the
/// thread under it survives; a leaf comment is removed outright.
pub async fn comment_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let user = get_authenticated_user(&state, &headers).await?;

    let comment = state
        .db
        .get_comment(id)?
        .ok_or_else(|| AppError::NotFound(format!("Comment not found: {}", id)))?;

    if comment.user_id != user.id && !state.auth.is_admin(&user) {
        return Err(AppError::Forbidden(
            "Only the author or an admin can delete a comment".to_string(),
        ));
    }

    if state.db.comment_has_replies(id)? {
        state.db.tombstone_comment(id)?;
    } else {
        state.db.delete_comment(id)?;
    }

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// FAVORITES API
// ============================================================================

/// The authenticated user's favorite books, most recently added first.
pub async fn favorites_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Book>>> {
    let user = get_authenticated_user(&state, &headers).await?;
    Ok(Json(state.db.get_favorite_books(&user.id)?))
}

/// Mark a book as a favorite. Idempotent.
pub async fn favorite_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<String>,
) -> Result<StatusCode> {
    let user = get_authenticated_user(&state, &headers).await?;

    if state.db.get_book(&book_id)?.is_none() {
        return Err(AppError::NotFound(format!("Book not found: {}", book_id)));
    }

    state.db.add_favorite(&user.id, &book_id)?;
    Ok(StatusCode::OK)
}

/// Remove a favorite marker.
pub async fn favorite_remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<String>,
) -> Result<StatusCode> {
    let user = get_authenticated_user(&state, &headers).await?;
    state.db.remove_favorite(&user.id, &book_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// READER STATE API
// ============================================================================

/// Saved reading position for a book, if any.
pub async fn reader_get_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<String>,
) -> Result<Json<Option<ReadingState>>> {
    let user = get_authenticated_user(&state, &headers).await?;
    let saved = state.with_reader_cache(&user.id, |cache| cache.get(&book_id).cloned());
    Ok(Json(saved))
}

/// Reading position save request.
#[derive(Debug, Deserialize)]
pub struct SaveStateRequest {
    current_page: usize,
    lines_per_page: Option<usize>,
}

/// Save the reading position for a book.
pub async fn reader_save_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<String>,
    Json(req): Json<SaveStateRequest>,
) -> Result<StatusCode> {
    let user = get_authenticated_user(&state, &headers).await?;

    let book = state
        .db
        .get_book(&book_id)?
        .ok_or_else(|| AppError::NotFound(format!("Book not found: {}", book_id)))?;

    let entry = ReadingState {
        book_id,
        current_page: req.current_page,
        lines_per_page: state.config.reader.sanitize_lines_per_page(req.lines_per_page),
        display_name: book.title,
        last_accessed: 0, // Stamped by the cache.
    };

    state.with_reader_cache(&user.id, |cache| cache.save(entry));
    Ok(StatusCode::OK)
}

/// Forget the reading position for a book.
pub async fn reader_delete_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<String>,
) -> Result<StatusCode> {
    let user = get_authenticated_user(&state, &headers).await?;
    state.with_reader_cache(&user.id, |cache| cache.remove(&book_id));
    Ok(StatusCode::NO_CONTENT)
}

/// Recently read books, most recent first.
pub async fn reader_recent(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ReadingState>>> {
    let user = get_authenticated_user(&state, &headers).await?;
    let recent = state.with_reader_cache(&user.id, |cache| {
        cache.list().into_iter().cloned().collect()
    });
    Ok(Json(recent))
}

/// Reader settings exposed to clients.
#[derive(Debug, Serialize)]
pub struct ReaderSettingsResponse {
    default_lines_per_page: usize,
    lines_per_page_options: Vec<usize>,
}

/// Reader defaults and the lines-per-page choices.
pub async fn reader_settings(State(state): State<AppState>) -> Json<ReaderSettingsResponse> {
    Json(ReaderSettingsResponse {
        default_lines_per_page: state.config.reader.default_lines_per_page,
        lines_per_page_options: state.config.reader.lines_per_page_options.clone(),
    })
}

// ============================================================================
// USER ADMIN API
// ============================================================================

/// List all users. Admin only.
pub async fn users_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<User>>> {
    require_admin(&state, &headers).await?;
    Ok(Json(state.auth.list_users()?))
}

/// Delete a user. Admin only.
pub async fn user_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Result<StatusCode> {
    let admin = require_admin(&state, &headers).await?;

    if admin.username == username {
        return Err(AppError::Validation(
            "Cannot delete your own account".to_string(),
        ));
    }

    if !state.auth.delete_user(&username)? {
        return Err(AppError::NotFound(format!("User not found: {}", username)));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// STATS API
// ============================================================================

/// Stats response.
#[derive(Serialize)]
pub struct StatsResponse {
    total_books: usize,
    total_views: i64,
    total_downloads: i64,
}

/// API: Get library statistics.
pub async fn api_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let total_books = state.db.book_count()?;
    let (total_views, total_downloads) = state.db.counter_totals()?;

    Ok(Json(StatsResponse {
        total_books,
        total_views,
        total_downloads,
    }))
}

// ============================================================================
// HELPERS
// ============================================================================

/// Extract token from Authorization header.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Get authenticated user from token.
async fn get_authenticated_user(state: &AppState, headers: &HeaderMap) -> Result<User> {
    let token = extract_token(headers)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    state
        .auth
        .validate_token(&token)?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
}

/// Get authenticated user, requiring the admin role.
async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<User> {
    let user = get_authenticated_user(state, headers).await?;
    if !state.auth.is_admin(&user) {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(user)
}

/// Fetch a book the user is allowed to modify (owner or admin).
fn get_owned_book(state: &AppState, user: &User, id: &str) -> Result<Book> {
    let book = state
        .db
        .get_book(id)?
        .ok_or_else(|| AppError::NotFound(format!("Book not found: {}", id)))?;

    let is_owner = book.owner_id.as_deref() == Some(user.id.as_str());
    if !is_owner && !state.auth.is_admin(user) {
        return Err(AppError::Forbidden(
            "Only the owner or an admin can modify a book".to_string(),
        ));
    }

    Ok(book)
}
