//! Taleweave server binary.
//!
//! Reads `taleweave.toml` (or the path given with `--config`) and
//! `TALEWEAVE_*` environment variables, opens the SQLite store, and serves the
//! JSON API under `/api`.
//!
//! # Moderation
//!
//! Stories can be hidden from listing and lookup without deleting them:
//!
//! ```text
//! taleweave hide <slug>
//! taleweave unhide <slug>
//! ```

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use taleweave_server::ServerConfig;
use taleweave_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Taleweave collaborative story server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "taleweave.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Hide a story from listing and lookup.
  Hide { slug: String },
  /// Make a hidden story visible again.
  Unhide { slug: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("TALEWEAVE")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("blocked_words")
        .with_list_parse_key("allowed_words"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.validate().context("invalid configuration")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let pipeline = Arc::new(taleweave_server::pipeline(Arc::new(store), &server_cfg));

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => {}
    Command::Hide { slug } => {
      pipeline
        .set_story_active(&slug, false)
        .await
        .with_context(|| format!("failed to hide story {slug:?}"))?;
      println!("hidden: {slug}");
      return Ok(());
    }
    Command::Unhide { slug } => {
      pipeline
        .set_story_active(&slug, true)
        .await
        .with_context(|| format!("failed to unhide story {slug:?}"))?;
      println!("visible: {slug}");
      return Ok(());
    }
  }

  let _sweeper = pipeline.limiter().spawn_sweeper();

  let app = taleweave_server::router(pipeline, &server_cfg)?;
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(
    listener,
    app.into_make_service_with_connect_info::<SocketAddr>(),
  )
  .await
  .context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
