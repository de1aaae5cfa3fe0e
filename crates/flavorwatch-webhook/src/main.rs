//! flavorwatch server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus
//! `FLAVORWATCH_*` environment variables, opens the SQLite store, and serves
//! the public API and the mail-provider webhook over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use flavorwatch_api::ApiSettings;
use flavorwatch_http::ResendMailer;
use flavorwatch_store_sqlite::SqliteStore;
use flavorwatch_webhook::{AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "flavorwatch API and webhook server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
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
  let server_cfg = ServerConfig::load(&cli.config).context("invalid configuration")?;
  let secret = server_cfg.webhook_secret().context("invalid configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let mailer = match server_cfg.resend_api_key.as_deref() {
    Some(key) => Some(Arc::new(
      ResendMailer::new(key, server_cfg.http_timeout()).context("failed to build mailer")?,
    )),
    None => {
      tracing::warn!("resend_api_key not set, confirmation emails are disabled");
      None
    }
  };

  // Build application state.
  let state = AppState {
    store: Arc::new(store),
    mailer,
    secret: Arc::new(secret),
    settings: Arc::new(ApiSettings {
      app_url:   server_cfg.app_url.clone(),
      mail_from: server_cfg.mail_from.clone(),
    }),
  };

  let app = flavorwatch_webhook::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

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
