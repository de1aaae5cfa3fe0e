//! [`ResendMailer`] delivers [`OutgoingEmail`]s through the Resend HTTP API.

use std::time::Duration;

use flavorwatch_core::mail::{Mailer, OutgoingEmail, SendError};
use reqwest::Client;

use crate::Result;

pub const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ResendMailer {
  client:   Client,
  api_key:  String,
  endpoint: String,
}

impl ResendMailer {
  pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
    Self::with_endpoint(api_key, RESEND_ENDPOINT, timeout)
  }

  /// Post to `endpoint` instead of the public Resend API.
  pub fn with_endpoint(
    api_key: impl Into<String>,
    endpoint: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, api_key: api_key.into(), endpoint: endpoint.into() })
  }
}

impl Mailer for ResendMailer {
  async fn send<'a>(&'a self, email: &'a OutgoingEmail) -> Result<(), SendError> {
    let resp = self
      .client
      .post(&self.endpoint)
      .bearer_auth(&self.api_key)
      .json(email)
      .send()
      .await
      .map_err(|e| {
        if e.is_timeout() { SendError::Timeout } else { SendError::Transport(e.to_string()) }
      })?;

    let status = resp.status();
    if !status.is_success() {
      let message = resp.text().await.unwrap_or_default();
      return Err(SendError::Rejected { status: status.as_u16(), message });
    }

    tracing::debug!(to = %email.to, subject = %email.subject, "email accepted");
    Ok(())
  }
}
