//! `POST /webhooks/resend`: bounce and complaint handling.
//!
//! The body is verified as raw bytes before it is parsed. A bounced or
//! complained-about address loses every subscription in a single store call.

use axum::{
  Json,
  extract::State,
  http::HeaderMap,
};
use bytes::Bytes;
use flavorwatch_core::{mail::Mailer, store::FlavorStore};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, error::Error, signature::verify_signature};

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub data: Option<EventData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventData {
  #[serde(default)]
  pub to: Option<Recipients>,
}

/// `data.to` is sometimes a bare string and sometimes a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
  One(String),
  Many(Vec<String>),
}

impl Recipients {
  pub fn into_vec(self) -> Vec<String> {
    match self {
      Self::One(address) => vec![address],
      Self::Many(addresses) => addresses,
    }
  }
}

impl WebhookEvent {
  /// Event types that should remove the recipient's subscriptions.
  pub fn is_suppression(&self) -> bool {
    matches!(self.kind.as_str(), "email.bounced" | "email.complained")
  }

  pub fn recipients(self) -> Vec<String> {
    self
      .data
      .and_then(|d| d.to)
      .map(Recipients::into_vec)
      .unwrap_or_default()
      .into_iter()
      .filter(|a| !a.trim().is_empty())
      .collect()
  }
}

pub async fn resend<S, M>(
  State(state): State<AppState<S, M>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<Value>, Error>
where
  S: FlavorStore,
  M: Mailer,
{
  verify_signature(&state.secret, &headers, &body)?;

  let event: WebhookEvent = serde_json::from_slice(&body)
    .map_err(|e| Error::BadRequest(format!("invalid JSON: {e}")))?;

  if !event.is_suppression() {
    tracing::debug!(event = %event.kind, "ignoring webhook event");
    return Ok(Json(json!({ "ok": true })));
  }

  let kind = event.kind.clone();
  let addresses = event.recipients();
  if !addresses.is_empty() {
    let removed = state
      .store
      .delete_subscriptions_by_email(&addresses)
      .await
      .map_err(Error::store)?;
    tracing::info!(
      event = %kind,
      addresses = addresses.len(),
      removed,
      "removed subscriptions after delivery failure"
    );
  }

  Ok(Json(json!({ "ok": true })))
}
