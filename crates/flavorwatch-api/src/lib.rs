//! Public JSON API for flavorwatch.
//!
//! Exposes an axum [`Router`] backed by any [`FlavorStore`] and an optional
//! [`Mailer`] for confirmation emails. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", flavorwatch_api::api_router(state))
//! ```

pub mod error;
pub mod flavors;
pub mod subscriptions;

use std::sync::Arc;

use axum::{Router, routing::get};
use flavorwatch_core::{mail::Mailer, store::FlavorStore};

pub use error::ApiError;

/// Values the handlers need to build links and emails.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  /// Public base URL, e.g. `https://flavors.example.com`.
  pub app_url:   String,
  pub mail_from: String,
}

impl ApiSettings {
  pub fn link(&self, path_and_query: &str) -> String {
    format!("{}{path_and_query}", self.app_url.trim_end_matches('/'))
  }
}

/// Shared state threaded through all API handlers.
pub struct ApiState<S, M> {
  pub store:    Arc<S>,
  /// Without a mailer, subscriptions are stored but no confirmation is sent.
  pub mailer:   Option<Arc<M>>,
  pub settings: Arc<ApiSettings>,
}

impl<S, M> Clone for ApiState<S, M> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      mailer:   self.mailer.clone(),
      settings: self.settings.clone(),
    }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, M>(state: ApiState<S, M>) -> Router<()>
where
  S: FlavorStore + 'static,
  M: Mailer + 'static,
{
  Router::new()
    .route("/flavors", get(flavors::list::<S, M>))
    .route(
      "/subscribe",
      get(subscriptions::confirm::<S, M>).post(subscriptions::create::<S, M>),
    )
    .route("/unsubscribe", get(subscriptions::unsubscribe::<S, M>))
    .with_state(state)
}
