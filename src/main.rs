//! libris server entry point.

use clap::Parser;
use libris::{
    auth::AuthService,
    config::{BookCommand, Cli, Command, Config, ContentKind, UserCommand},
    db::{self, Database},
    reader::{FileStore, ReaderSession, ReadingStateCache},
    server,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    // Handle command
    match cli.command {
        Some(Command::Init { force }) => cmd_init(force).await,
        Some(Command::User { action }) => cmd_user(action, &config).await,
        Some(Command::Book { action }) => cmd_book(action, &config).await,
        Some(Command::Read { file, lines }) => cmd_read(file, lines, &config),
        Some(Command::Serve { bind }) => cmd_serve(config, bind).await,
        None => {
            // Default: start server
            cmd_serve(config, None).await
        }
    }
}

/// Initialize config and database.
async fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    // Write default config
    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    // Initialize database
    let config = Config::default();
    if let Some(parent) = config.database.path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let _db = Database::open(&config.database.path)?;
    println!("Initialized database: {}", config.database.path.display());

    println!("\nEdit config.toml to configure your server.");
    println!("Then run: libris user add <username> --password <password> --role admin");
    println!("And: libris book add \"Title\" --file /path/to/book.txt");

    Ok(())
}

/// User management commands.
async fn cmd_user(action: UserCommand, config: &Config) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)?;
    let auth = AuthService::new(
        db,
        config.auth.session_days,
        config.auth.registration_enabled(),
    );

    match action {
        UserCommand::Add {
            username,
            password,
            role,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password("Password: ")?,
            };

            let user = auth.create_user(&username, &password, &role)?;
            println!(
                "Created user: {} (role: {}, id: {})",
                user.username, user.role, user.id
            );
        }

        UserCommand::Del { username } => {
            if auth.delete_user(&username)? {
                println!("Deleted user: {}", username);
            } else {
                println!("User not found: {}", username);
            }
        }

        UserCommand::List => {
            let users = auth.list_users()?;
            if users.is_empty() {
                println!("No users found.");
            } else {
                println!("{:<20} {:<10} {:<36} LAST LOGIN", "USERNAME", "ROLE", "ID");
                println!("{}", "-".repeat(80));
                for user in users {
                    let last_login = user
                        .last_login
                        .map(|ts| {
                            db::timestamp_to_datetime(ts)
                                .format("%Y-%m-%d %H:%M")
                                .to_string()
                        })
                        .unwrap_or_else(|| "never".to_string());
                    println!(
                        "{:<20} {:<10} {:<36} {}",
                        user.username, user.role, user.id, last_login
                    );
                }
            }
        }

        UserCommand::Passwd { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password("New password: ")?,
            };

            if auth.change_password(&username, &password)? {
                println!("Password changed for: {}", username);
            } else {
                println!("User not found: {}", username);
            }
        }
    }

    Ok(())
}

/// Book management commands.
async fn cmd_book(action: BookCommand, config: &Config) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)?;

    match action {
        BookCommand::Add {
            title,
            file,
            author,
            description,
        } => {
            if !file.is_file() {
                anyhow::bail!("Not a file: {}", file.display());
            }

            let kind = file
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ContentKind::from_extension);

            let id = uuid::Uuid::new_v4().to_string();
            let extension = kind.map(|k| k.extension()).unwrap_or("bin");
            let relative = format!("{}.{}", id, extension);

            std::fs::create_dir_all(&config.storage.content_dir)?;
            std::fs::copy(&file, config.storage.content_dir.join(&relative))?;

            let now = db::now_timestamp();
            let book = db::Book {
                id,
                title,
                author,
                description,
                content_path: Some(relative),
                content_type: kind.map(|k| k.mime_type().to_string()),
                cover_url: None,
                owner_id: None,
                views: 0,
                downloads: 0,
                created_at: now,
                updated_at: now,
            };

            db.save_book(&book)?;
            println!("Added book: {} (id: {})", book.title, book.id);
        }

        BookCommand::Del { id } => {
            let Some(book) = db.get_book(&id)? else {
                println!("Book not found: {}", id);
                return Ok(());
            };

            if let Some(relative) = book.content_path {
                let _ = std::fs::remove_file(config.storage.content_dir.join(relative));
            }

            db.delete_book(&id)?;
            println!("Deleted book: {}", book.title);
        }

        BookCommand::List => {
            let books = db.list_books(None)?;
            if books.is_empty() {
                println!("No books found.");
            } else {
                println!("{:<36} {:<30} {:<20} VIEWS", "ID", "TITLE", "AUTHOR");
                println!("{}", "-".repeat(96));
                for book in books {
                    println!(
                        "{:<36} {:<30} {:<20} {}",
                        book.id,
                        book.title,
                        book.author.as_deref().unwrap_or("-"),
                        book.views
                    );
                }
            }
        }
    }

    Ok(())
}

/// Read a local text file in the terminal, resuming from the last
/// saved position.
fn cmd_read(file: PathBuf, lines: Option<usize>, config: &Config) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&file)?;
    let display_name = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string();

    // Stable id derived from the path, so reopening the same file
    // resumes where it left off.
    let book_id = uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_URL,
        file.to_string_lossy().as_bytes(),
    )
    .to_string();

    let store = FileStore::new(config.storage.state_dir.clone());
    let mut cache = ReadingStateCache::open(store, "local", config.reader.max_recent_books);

    let mut session = ReaderSession::new(config.reader.default_lines_per_page);
    let ticket = session.begin_load(&book_id);
    session.complete_load(ticket, &text, cache.get(&book_id));

    if lines.is_some() {
        session.set_lines_per_page(config.reader.sanitize_lines_per_page(lines));
    }

    let stdin = io::stdin();
    loop {
        println!(
            "\n=== {} | page {}/{} | {} lines/page ===",
            display_name,
            session.current_page() + 1,
            session.page_count(),
            session.lines_per_page()
        );
        println!("{}", session.page());
        print!("[n]ext [p]rev [j <page>] [l <lines>] [q]uit > ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("n") => session.next(),
            Some("p") => session.prev(),
            Some("j") => {
                if let Some(page) = parts.next().and_then(|s| s.parse::<usize>().ok()) {
                    session.jump(page.saturating_sub(1));
                } else {
                    println!("Usage: j <page>");
                }
            }
            Some("l") => {
                if let Some(lines) = parts.next().and_then(|s| s.parse::<usize>().ok()) {
                    session.set_lines_per_page(lines);
                } else {
                    println!("Usage: l <lines>");
                }
            }
            Some("q") => break,
            Some(other) => println!("Unknown command: {}", other),
            None => {}
        }

        if let Some(state) = session.state(&display_name) {
            cache.save(state);
        }
    }

    if let Some(state) = session.state(&display_name) {
        cache.save(state);
    }

    Ok(())
}

/// Start the server.
async fn cmd_serve(mut config: Config, bind: Option<std::net::SocketAddr>) -> anyhow::Result<()> {
    // Override bind address if specified
    if let Some(addr) = bind {
        config.server.bind = addr;
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "libris=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Open database
    let db = Database::open(&config.database.path)?;

    let removed = db.cleanup_expired_sessions()?;
    if removed > 0 {
        tracing::info!(removed, "Cleaned up expired sessions");
    }

    // Create auth service
    let auth = AuthService::new(
        db.clone(),
        config.auth.session_days,
        config.auth.registration_enabled(),
    );

    tracing::info!(
        bind = %config.server.bind,
        database = %config.database.path.display(),
        "Starting libris server"
    );

    // Create application state
    let state = server::AppState::new(config.clone(), db.clone(), auth);

    // Expired sessions are swept hourly
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(3600));
        ticker.tick().await; // Skip first immediate tick

        loop {
            ticker.tick().await;
            match db.cleanup_expired_sessions() {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Cleaned up expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
            }
        }
    });

    // Create router
    let app = server::create_router(state);

    let listener = TcpListener::bind(config.server.bind).await?;
    tracing::info!(address = %config.server.bind, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Prompt for password input.
fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;

    Ok(password.trim().to_string())
}
