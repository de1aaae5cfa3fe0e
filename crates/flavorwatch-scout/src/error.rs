use flavorwatch_core::{fetch::FetchError, mail::SendError};
use thiserror::Error;

/// A location page that parsed but held nothing recognisable.
#[derive(Debug, Error)]
pub enum ParseError {
  #[error("no items found at {url}")]
  NoItems { url: String },
}

/// Failure of one unit of pipeline work: a location or a subscriber.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Parse(#[from] ParseError),

  #[error("storage error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error(transparent)]
  Send(#[from] SendError),
}

impl Error {
  /// Box any backend error; the pipeline is generic over the store.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
