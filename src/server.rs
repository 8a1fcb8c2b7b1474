//! HTTP server and routes.

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth_login))
        .route("/register", post(handlers::auth_register))
        .route("/logout", post(handlers::auth_logout))
        .route("/me", get(handlers::auth_me))
        .route("/password", post(handlers::auth_change_password))
        .route("/profile", put(handlers::auth_update_profile));

    let book_routes = Router::new()
        .route("/", get(handlers::books_list).post(handlers::book_create))
        .route(
            "/{id}",
            get(handlers::book_get)
                .put(handlers::book_update)
                .delete(handlers::book_delete),
        )
        .route(
            "/{id}/content",
            get(handlers::book_content).put(handlers::book_upload_content),
        )
        .route("/{id}/download", get(handlers::book_download))
        .route(
            "/{id}/comments",
            get(handlers::comments_get).post(handlers::comment_post),
        );

    let comment_routes = Router::new().route(
        "/{id}",
        put(handlers::comment_update).delete(handlers::comment_delete),
    );

    let favorite_routes = Router::new().route("/", get(handlers::favorites_list)).route(
        "/{book_id}",
        put(handlers::favorite_add).delete(handlers::favorite_remove),
    );

    let user_routes = Router::new()
        .route("/", get(handlers::users_list))
        .route("/{username}", delete(handlers::user_delete));

    let reader_routes = Router::new()
        .route("/settings", get(handlers::reader_settings))
        .route("/recent", get(handlers::reader_recent))
        .route(
            "/state/{book_id}",
            get(handlers::reader_get_state)
                .put(handlers::reader_save_state)
                .delete(handlers::reader_delete_state),
        );

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/stats", get(handlers::api_stats))
        .nest("/api/auth", auth_routes)
        .nest("/api/books", book_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/favorites", favorite_routes)
        .nest("/api/users", user_routes)
        .nest("/api/reader", reader_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
