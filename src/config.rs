use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Self-hosted book library with a paginated text reader.
#[derive(Parser, Debug, Clone)]
#[command(name = "libris")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "LIBRIS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the server (default if no command given).
    Serve {
        /// Address to bind the server to.
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// User management commands.
    User {
        /// User subcommand action.
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Book management commands.
    Book {
        /// Book subcommand action.
        #[command(subcommand)]
        action: BookCommand,
    },

    /// Read a local text file in the terminal.
    Read {
        /// Path to the text file.
        file: PathBuf,

        /// Lines per page (defaults to the configured value).
        #[arg(short, long)]
        lines: Option<usize>,
    },

    /// Initialize database and create default config.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

/// User management subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum UserCommand {
    /// Add a new user.
    Add {
        /// Username.
        username: String,
        /// Password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
        /// User role (admin or user).
        #[arg(short, long, default_value = "user")]
        role: String,
    },

    /// Delete a user.
    Del {
        /// Username to delete.
        username: String,
    },

    /// List all users.
    List,

    /// Change user password.
    Passwd {
        /// Username.
        username: String,
        /// New password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
    },
}

/// Book management subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum BookCommand {
    /// Add a book from a local file.
    Add {
        /// Book title.
        title: String,
        /// Path to the content file.
        #[arg(short, long)]
        file: PathBuf,
        /// Author name.
        #[arg(short, long)]
        author: Option<String>,
        /// Description.
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Remove a book (and its stored content).
    Del {
        /// Book id.
        id: String,
    },

    /// List all books.
    List,
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Content and reader-state storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Reader configuration.
    #[serde(default)]
    pub reader: ReaderConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Library title shown on the index page.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            title: default_title(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::new(
        std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        8080,
    )
}

fn default_title() -> String {
    "My Library".to_string()
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/libris.db")
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Registration mode: "open", "disabled".
    #[serde(default = "default_registration")]
    pub registration: String,

    /// Session token duration in days.
    #[serde(default = "default_session_days")]
    pub session_days: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            registration: default_registration(),
            session_days: default_session_days(),
        }
    }
}

fn default_registration() -> String {
    "open".to_string()
}

fn default_session_days() -> u32 {
    30
}

impl AuthConfig {
    /// Check if registration is enabled.
    pub fn registration_enabled(&self) -> bool {
        self.registration == "open"
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for uploaded book content.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Directory for persisted reading state.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            state_dir: default_state_dir(),
        }
    }
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("data/content")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("data/reader")
}

/// Reader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Default lines per page.
    #[serde(default = "default_lines_per_page")]
    pub default_lines_per_page: usize,

    /// Lines-per-page choices offered to clients.
    #[serde(default = "default_lines_options")]
    pub lines_per_page_options: Vec<usize>,

    /// Maximum number of reading-state entries kept per user.
    #[serde(default = "default_max_recent_books")]
    pub max_recent_books: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            default_lines_per_page: default_lines_per_page(),
            lines_per_page_options: default_lines_options(),
            max_recent_books: default_max_recent_books(),
        }
    }
}

fn default_lines_per_page() -> usize {
    80
}

fn default_lines_options() -> Vec<usize> {
    vec![80, 100, 150, 200, 400]
}

fn default_max_recent_books() -> usize {
    10
}

impl ReaderConfig {
    /// Correct a requested lines-per-page to a usable value: zero falls
    /// back to the default.
    pub fn sanitize_lines_per_page(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(l) if l > 0 => l,
            _ => self.default_lines_per_page,
        }
    }
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("config.toml"),
            PathBuf::from("libris.toml"),
            dirs::config_dir()
                .map(|p| p.join("libris").join("config.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/libris/config.toml"),
        ];

        candidates.into_iter().find(|p| p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# libris configuration

[server]
bind = "0.0.0.0:8080"
title = "My Library"

[database]
# path = "/var/lib/libris/libris.db"

[auth]
# Registration mode: "open" or "disabled"
registration = "open"
# Session duration in days
session_days = 30

[storage]
# content_dir = "/var/lib/libris/content"
# state_dir = "/var/lib/libris/reader"

[reader]
default_lines_per_page = 80
lines_per_page_options = [80, 100, 150, 200, 400]
max_recent_books = 10
"#
        .to_string()
    }
}

/// Content kinds the reader knows how to classify.
///
/// Selected from the `Content-Type` recorded at upload; drives the
/// download filename extension and whether the content can be paginated
/// inline or must be downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// JSON document.
    Json,
    /// HTML document.
    Html,
    /// Rich text.
    Rtf,
    /// PDF document.
    Pdf,
    /// Legacy Word document.
    Doc,
    /// Word document.
    Docx,
    /// Plain text.
    Text,
}

impl ContentKind {
    /// Classify a MIME type. Unknown types return `None` and are shown
    /// as "Unknown File".
    pub fn from_mime(mime: &str) -> Option<Self> {
        // Ignore any charset parameter.
        let mime = mime.split(';').next().unwrap_or(mime).trim();

        match mime {
            "application/json" => Some(ContentKind::Json),
            "text/html" => Some(ContentKind::Html),
            "application/rtf" => Some(ContentKind::Rtf),
            "application/pdf" => Some(ContentKind::Pdf),
            "application/msword" => Some(ContentKind::Doc),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(ContentKind::Docx)
            }
            "text/plain" => Some(ContentKind::Text),
            _ => None,
        }
    }

    /// Human-readable file type for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            ContentKind::Json => "JSON File",
            ContentKind::Html => "HTML File",
            ContentKind::Rtf => "Rich Text File",
            ContentKind::Pdf => "PDF File",
            ContentKind::Doc | ContentKind::Docx => "Word Document",
            ContentKind::Text => "Text File",
        }
    }

    /// Classify a filename extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(ContentKind::Json),
            "html" | "htm" => Some(ContentKind::Html),
            "rtf" => Some(ContentKind::Rtf),
            "pdf" => Some(ContentKind::Pdf),
            "doc" => Some(ContentKind::Doc),
            "docx" => Some(ContentKind::Docx),
            "txt" | "text" => Some(ContentKind::Text),
            _ => None,
        }
    }

    /// Canonical MIME type for the kind.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ContentKind::Json => "application/json",
            ContentKind::Html => "text/html",
            ContentKind::Rtf => "application/rtf",
            ContentKind::Pdf => "application/pdf",
            ContentKind::Doc => "application/msword",
            ContentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ContentKind::Text => "text/plain",
        }
    }

    /// Filename extension used for downloads.
    pub fn extension(&self) -> &'static str {
        match self {
            ContentKind::Json => "json",
            ContentKind::Html => "html",
            ContentKind::Rtf => "rtf",
            ContentKind::Pdf => "pdf",
            ContentKind::Doc => "doc",
            ContentKind::Docx => "docx",
            ContentKind::Text => "txt",
        }
    }

    /// Whether the content can be rendered inline by the paginated
    /// reader. PDF and Word documents are download-only.
    pub fn inline_renderable(&self) -> bool {
        !matches!(self, ContentKind::Pdf | ContentKind::Doc | ContentKind::Docx)
    }
}
