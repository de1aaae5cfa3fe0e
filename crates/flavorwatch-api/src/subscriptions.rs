//! Handlers for the subscription lifecycle.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/subscribe` | Body: `{"email","flavor_pattern","locations"?}` |
//! | `GET`  | `/subscribe?confirm=<token>` | 302 to the app, 404 if unknown |
//! | `GET`  | `/unsubscribe?token=<token>` | HTML confirmation page |
//!
//! A duplicate `(email, pattern)` answers exactly like a fresh subscription so
//! the endpoint cannot be used to probe for subscribed addresses.

use axum::{
  Json,
  extract::{Query, State},
  http::{StatusCode, header},
  response::{Html, IntoResponse, Response},
};
use flavorwatch_core::{
  email::confirm_email,
  mail::Mailer,
  store::FlavorStore,
  subscription::{NewSubscription, SubscriptionInsert},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Subscribe ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscribeBody {
  #[serde(default)]
  pub email:          String,
  #[serde(default, alias = "flavorPattern")]
  pub flavor_pattern: String,
  /// Location slugs; empty or absent means every location.
  #[serde(default)]
  pub locations:      Option<Vec<String>>,
}

/// `POST /subscribe`
pub async fn create<S, M>(
  State(state): State<ApiState<S, M>>,
  Json(body): Json<SubscribeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FlavorStore,
  M: Mailer,
{
  if body.email.trim().is_empty() || body.flavor_pattern.trim().is_empty() {
    return Err(ApiError::BadRequest("email and flavor_pattern are required".into()));
  }

  let input = NewSubscription::new(
    &body.email,
    &body.flavor_pattern,
    body.locations.unwrap_or_default(),
  )?;

  let subscription = match state
    .store
    .insert_subscription(input)
    .await
    .map_err(ApiError::store)?
  {
    SubscriptionInsert::Created(subscription) => subscription,
    SubscriptionInsert::Duplicate => return Ok(Json(json!({ "ok": true }))),
  };

  match &state.mailer {
    Some(mailer) => {
      let confirm_url = state
        .settings
        .link(&format!("/api/subscribe?confirm={}", subscription.confirm_token));
      let email = confirm_email(
        &state.settings.mail_from,
        &subscription.email,
        body.flavor_pattern.trim(),
        &confirm_url,
      );
      if let Err(e) = mailer.send(&email).await {
        tracing::warn!(to = %subscription.email, error = %e, "failed to send confirmation");
      }
    }
    None => tracing::warn!("no mailer configured, confirmation email not sent"),
  }

  Ok(Json(json!({ "ok": true })))
}

// ─── Confirm ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
  pub confirm: Option<String>,
}

/// `GET /subscribe?confirm=<token>`
pub async fn confirm<S, M>(
  State(state): State<ApiState<S, M>>,
  Query(params): Query<ConfirmParams>,
) -> Result<Response, ApiError>
where
  S: FlavorStore,
  M: Mailer,
{
  let token = params
    .confirm
    .filter(|t| !t.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest("confirm token required".into()))?;

  let unknown = || ApiError::NotFound("unknown confirmation token".into());
  let token = Uuid::parse_str(token.trim()).map_err(|_| unknown())?;

  if !state
    .store
    .confirm_subscription(token)
    .await
    .map_err(ApiError::store)?
  {
    return Err(unknown());
  }

  let location = state.settings.link("/?subscribed=1");
  Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

// ─── Unsubscribe ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UnsubscribeParams {
  pub token: Option<String>,
}

/// `GET /unsubscribe?token=<token>`
///
/// Answers the same page whether or not the token matched anything, so a
/// second click on the link is harmless.
pub async fn unsubscribe<S, M>(
  State(state): State<ApiState<S, M>>,
  Query(params): Query<UnsubscribeParams>,
) -> Result<Response, ApiError>
where
  S: FlavorStore,
  M: Mailer,
{
  let Some(token) = params
    .token
    .as_deref()
    .and_then(|t| Uuid::parse_str(t.trim()).ok())
  else {
    return Ok(
      (StatusCode::BAD_REQUEST, Html("<h2>Invalid unsubscribe link.</h2>")).into_response(),
    );
  };

  let removed = state
    .store
    .delete_subscription_by_unsubscribe_token(token)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(removed, "unsubscribe");

  Ok(Html(UNSUBSCRIBED_PAGE).into_response())
}

const UNSUBSCRIBED_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Unsubscribed</title>
  <style>
    body { font-family: sans-serif; max-width: 480px; margin: 80px auto; text-align: center; color: #3D2817; }
    a { color: #FF6B9D; font-weight: 700; }
  </style>
</head>
<body>
  <h1>🍦 You've been unsubscribed</h1>
  <p>You won't receive any more flavor alerts.</p>
  <p><a href="/">Back to the tracker</a></p>
</body>
</html>"#;
