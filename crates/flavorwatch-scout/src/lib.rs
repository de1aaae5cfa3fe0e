//! The flavorwatch batch pipeline.
//!
//! One [`Pipeline::run`](pipeline::Pipeline::run) discovers locations,
//! reconciles them against the store, refreshes the item ledger for every
//! active location, detects items first seen today and notifies matching
//! subscribers. Every stage isolates its own failures; a run never aborts
//! halfway.

pub mod config;
pub mod detector;
pub mod discovery;
pub mod error;
pub mod ledger;
pub mod notifier;
pub mod pipeline;
pub mod reconciler;

pub use error::{Error, ParseError, Result};
pub use pipeline::{Pipeline, RunReport};
