//! HTTP server for flavorwatch: the signed mail-provider webhook plus the
//! public JSON API.

pub mod config;
pub mod error;
pub mod signature;
pub mod webhook;

pub use config::ServerConfig;
pub use error::Error;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, routing::post};
use flavorwatch_api::{ApiSettings, ApiState, api_router};
use flavorwatch_core::{mail::Mailer, store::FlavorStore};
use tower_http::trace::TraceLayer;

use signature::WebhookSecret;

/// Webhook payloads are small JSON documents.
pub const MAX_WEBHOOK_BODY: usize = 1024 * 1024;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, M> {
  pub store:    Arc<S>,
  pub mailer:   Option<Arc<M>>,
  pub secret:   Arc<WebhookSecret>,
  pub settings: Arc<ApiSettings>,
}

impl<S, M> Clone for AppState<S, M> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      mailer:   self.mailer.clone(),
      secret:   self.secret.clone(),
      settings: self.settings.clone(),
    }
  }
}

impl<S, M> AppState<S, M> {
  fn api_state(&self) -> ApiState<S, M> {
    ApiState {
      store:    self.store.clone(),
      mailer:   self.mailer.clone(),
      settings: self.settings.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full server router: `/webhooks/resend` and everything under
/// `/api`.
pub fn router<S, M>(state: AppState<S, M>) -> Router
where
  S: FlavorStore + 'static,
  M: Mailer + 'static,
{
  let api = api_router(state.api_state());

  Router::new()
    .route("/webhooks/resend", post(webhook::resend::<S, M>))
    .layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY))
    .with_state(state)
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests;
