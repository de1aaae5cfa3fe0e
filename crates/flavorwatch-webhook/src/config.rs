//! Server configuration, deserialised from `config.toml` and `FLAVORWATCH_*`
//! environment variables.

use std::{path::{Path, PathBuf}, time::Duration};

use serde::Deserialize;
use thiserror::Error;

use crate::signature::{SecretError, WebhookSecret};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to load configuration: {0}")]
  Load(#[from] config::ConfigError),

  #[error("missing required setting `{0}`")]
  Missing(&'static str),

  #[error("invalid `resend_webhook_secret`: {0}")]
  InvalidSecret(#[from] SecretError),
}

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  #[serde(default)]
  pub store_path:            PathBuf,
  #[serde(default = "default_app_url")]
  pub app_url:               String,
  #[serde(default = "default_mail_from")]
  pub mail_from:             String,
  #[serde(default)]
  pub resend_api_key:        Option<String>,
  /// `whsec_…` signing secret from the mail provider. Required.
  #[serde(default)]
  pub resend_webhook_secret: String,
  #[serde(default = "default_http_timeout_secs")]
  pub http_timeout_secs:     u64,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3000 }
fn default_app_url() -> String { "http://localhost:3000".into() }
fn default_mail_from() -> String { "Flavorwatch <noreply@localhost>".into() }
fn default_http_timeout_secs() -> u64 { 30 }

impl ServerConfig {
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
    let mut cfg: Self = settings.try_deserialize()?;

    if cfg.store_path.as_os_str().is_empty() {
      return Err(ConfigError::Missing("store_path"));
    }
    if cfg.resend_webhook_secret.trim().is_empty() {
      return Err(ConfigError::Missing("resend_webhook_secret"));
    }
    cfg.resend_api_key = cfg.resend_api_key.filter(|k| !k.trim().is_empty());
    Ok(cfg)
  }

  /// Decode the webhook secret; fails at startup rather than per request.
  pub fn webhook_secret(&self) -> Result<WebhookSecret, ConfigError> {
    Ok(WebhookSecret::parse(&self.resend_webhook_secret)?)
  }

  pub fn http_timeout(&self) -> Duration { Duration::from_secs(self.http_timeout_secs) }
}
