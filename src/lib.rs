//! libris: a self-hosted book library with a paginated text reader.
//!
//! This crate provides a small HTTP server for a personal library of
//! text documents, with per-user accounts, threaded comments, favorites
//! and a reader that splits content into fixed line-count pages and
//! remembers where each user left off.
//!
//! # Features
//!
//! - Book catalog with search, view and download counters
//! - Content uploads classified by MIME type
//! - Paginated reading with per-user saved positions
//! - Bounded "recently read" cache with oldest-first eviction
//! - Threaded comments with tombstoned deletions
//! - Favorites
//! - Token-based authentication
//! - Terminal reader for local files

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Authentication and user management.
pub mod auth;
/// Threaded comment trees.
pub mod comments;
/// Configuration and CLI.
pub mod config;
/// Database operations.
pub mod db;
/// Error types.
pub mod error;
/// Paginated reader core.
pub mod reader;
/// HTTP server.
pub mod server;

#[cfg(test)]
mod tests;

pub use config::{Cli, Command, Config};
pub use db::Database;
pub use error::{AppError, Result};
pub use server::AppState;
