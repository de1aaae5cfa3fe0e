//! flavorwatch scout binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus
//! `FLAVORWATCH_*` environment variables, opens the SQLite store and runs the
//! pipeline once. Intended to be invoked from a scheduler.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use flavorwatch_http::{HttpFetcher, ResendMailer};
use flavorwatch_scout::{
  Pipeline,
  config::ScoutConfig,
  pipeline::PipelineSettings,
};
use flavorwatch_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Scrape flavor pages and notify subscribers")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Treat this UTC date as "today" instead of the current date.
  #[arg(long)]
  date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ScoutConfig::load(&cli.config).context("invalid configuration")?;
  let store_path = expand_tilde(&cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let fetcher = HttpFetcher::new(cfg.http_timeout()).context("failed to build fetcher")?;
  let mailer = cfg
    .resend_api_key
    .as_deref()
    .map(|key| ResendMailer::new(key, cfg.http_timeout()))
    .transpose()
    .context("failed to build mailer")?;

  let today = cli.date.unwrap_or_else(|| Utc::now().date_naive());
  let pipeline = Pipeline::new(store, fetcher, mailer, PipelineSettings::from_config(&cfg));
  pipeline.run(today).await;

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
