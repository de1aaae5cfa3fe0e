//! The mail dispatcher collaborator.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;

/// A fully rendered message, ready for the mail provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
  pub from:    String,
  pub to:      String,
  pub subject: String,
  pub html:    String,
}

#[derive(Debug, Error)]
pub enum SendError {
  #[error("mail provider rejected the message ({status}): {message}")]
  Rejected { status: u16, message: String },

  #[error("mail transport error: {0}")]
  Transport(String),

  #[error("mail request timed out")]
  Timeout,
}

/// Sends one email per call. Implementations must bound every request with a
/// timeout.
pub trait Mailer: Send + Sync {
  fn send<'a>(
    &'a self,
    email: &'a OutgoingEmail,
  ) -> impl Future<Output = Result<(), SendError>> + Send + 'a;
}
