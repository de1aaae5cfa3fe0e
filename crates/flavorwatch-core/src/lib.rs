//! Core types and trait definitions for flavorwatch.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! store, the page fetcher and the mail dispatcher are expressed as traits;
//! everything else here is pure and unit-testable.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod diff;
pub mod email;
pub mod error;
pub mod fetch;
pub mod location;
pub mod mail;
pub mod matcher;
pub mod normalize;
pub mod observation;
pub mod reconcile;
pub mod store;
pub mod subscription;

pub use error::{Error, Result};
