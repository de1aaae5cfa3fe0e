//! Error types for `flavorwatch-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("email address is required")]
  MissingEmail,

  #[error("invalid email address: {0:?}")]
  InvalidEmail(String),

  #[error("flavor pattern {0:?} has no letters or digits")]
  EmptyPattern(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
