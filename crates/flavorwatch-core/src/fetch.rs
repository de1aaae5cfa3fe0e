//! The HTTP fetch collaborator.
//!
//! Implemented by `flavorwatch-http` for production and by in-memory stubs in
//! tests. Implementations must bound every request with a timeout.

use std::future::Future;

use thiserror::Error;

/// Status and body of a completed request. Non-2xx statuses are not errors
/// at this level; see [`fetch_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
  pub status: u16,
  pub body:   String,
}

impl FetchResponse {
  pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("HTTP {status} for {url}")]
  Status { url: String, status: u16 },

  #[error("request to {url} failed: {message}")]
  Transport { url: String, message: String },

  #[error("request to {url} timed out")]
  Timeout { url: String },
}

/// Fetches pages over HTTP.
pub trait Fetcher: Send + Sync {
  /// Issue a `GET` for `url`.
  fn get<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send + 'a;
}

/// `GET` a page and return its body, treating any non-2xx status as a
/// [`FetchError::Status`].
pub async fn fetch_page<F: Fetcher>(fetcher: &F, url: &str) -> Result<String, FetchError> {
  let response = fetcher.get(url).await?;
  if !response.is_success() {
    return Err(FetchError::Status { url: url.to_owned(), status: response.status });
  }
  Ok(response.body)
}
