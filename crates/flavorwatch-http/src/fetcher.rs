//! [`HttpFetcher`], the reqwest-backed [`Fetcher`].

use std::time::Duration;

use flavorwatch_core::fetch::{FetchError, FetchResponse, Fetcher};
use reqwest::Client;

use crate::Result;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; flavorwatch/1.0)";

/// Fetches pages with a fixed user agent and a per-request timeout.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpFetcher {
  client: Client,
}

impl HttpFetcher {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(USER_AGENT)
      .build()?;
    Ok(Self { client })
  }
}

impl Fetcher for HttpFetcher {
  async fn get<'a>(&'a self, url: &'a str) -> Result<FetchResponse, FetchError> {
    let resp = self
      .client
      .get(url)
      .send()
      .await
      .map_err(|e| transport_error(url, e))?;

    let status = resp.status().as_u16();
    let body = resp.text().await.map_err(|e| transport_error(url, e))?;
    tracing::debug!(url, status, bytes = body.len(), "fetched page");

    Ok(FetchResponse { status, body })
  }
}

fn transport_error(url: &str, e: reqwest::Error) -> FetchError {
  if e.is_timeout() {
    FetchError::Timeout { url: url.to_owned() }
  } else {
    FetchError::Transport { url: url.to_owned(), message: e.to_string() }
  }
}
