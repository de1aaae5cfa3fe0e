//! Scout configuration.
//!
//! Values come from an optional TOML file layered under `FLAVORWATCH_*`
//! environment variables. Nested keys use a double underscore, e.g.
//! `FLAVORWATCH_RECONCILE__MAX_ADDITIONS=3`.

use std::{path::{Path, PathBuf}, time::Duration};

use flavorwatch_core::reconcile::ReconcilePolicy;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to load configuration: {0}")]
  Load(#[from] config::ConfigError),

  #[error("missing required setting `{0}`")]
  Missing(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoutConfig {
  /// Path to the SQLite database file. Required.
  #[serde(default)]
  pub store_path:        PathBuf,
  /// Directory page that links to every location.
  #[serde(default = "default_site_url")]
  pub site_url:          String,
  /// Public base URL used for tracker and unsubscribe links.
  #[serde(default = "default_app_url")]
  pub app_url:           String,
  /// Without a key, notification is skipped.
  #[serde(default)]
  pub resend_api_key:    Option<String>,
  #[serde(default = "default_mail_from")]
  pub mail_from:         String,
  /// Upper bound on in-flight page fetches and email sends.
  #[serde(default = "default_concurrency")]
  pub concurrency:       usize,
  #[serde(default = "default_http_timeout_secs")]
  pub http_timeout_secs: u64,
  #[serde(default)]
  pub reconcile:         ReconcilePolicy,
}

fn default_site_url() -> String { "https://sweetcow.com".into() }
fn default_app_url() -> String { "http://localhost:3000".into() }
fn default_mail_from() -> String { "Flavorwatch <noreply@localhost>".into() }
fn default_concurrency() -> usize { 4 }
fn default_http_timeout_secs() -> u64 { 30 }

impl ScoutConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("FLAVORWATCH")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?;

    let cfg: Self = settings.try_deserialize()?;
    cfg.validated()
  }

  fn validated(mut self) -> Result<Self, ConfigError> {
    if self.store_path.as_os_str().is_empty() {
      return Err(ConfigError::Missing("store_path"));
    }
    self.resend_api_key = self.resend_api_key.filter(|k| !k.trim().is_empty());
    self.concurrency = self.concurrency.max(1);
    Ok(self)
  }

  pub fn http_timeout(&self) -> Duration { Duration::from_secs(self.http_timeout_secs) }
}
