//! Outbound HTTP for flavorwatch: page fetching and mail delivery.
//!
//! Both clients wrap a [`reqwest::Client`] built with a request timeout, so no
//! call can hang a pipeline run.

mod fetcher;
mod mailer;

pub mod error;

pub use error::{Error, Result};
pub use fetcher::HttpFetcher;
pub use mailer::{RESEND_ENDPOINT, ResendMailer};
