//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::signature::SignatureError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid signature: {0}")]
  Signature(#[from] SignatureError),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Signature(e) => {
        tracing::warn!(error = %e, "rejected webhook");
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid signature" }))).into_response()
      }
      Error::BadRequest(msg) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store failure while handling webhook");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Database error" })))
          .into_response()
      }
    }
  }
}
