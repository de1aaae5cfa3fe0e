//! Item observations: the presence history of a flavor at a location.
//!
//! Each row carries an *observation watermark*: `first_seen` is the day the
//! item was first sighted at the location and never changes; `last_seen` is
//! moved forward on every later sighting. A row whose `last_seen` is in the
//! past describes an item that is currently believed unavailable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One `(location_slug, item_name)` row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemObservation {
  pub location_slug: String,
  pub item_name:     String,
  pub first_seen:    NaiveDate,
  pub last_seen:     NaiveDate,
}

impl ItemObservation {
  /// A row for an item sighted for the very first time on `day`.
  pub fn first_sighting(
    location_slug: impl Into<String>,
    item_name: impl Into<String>,
    day: NaiveDate,
  ) -> Self {
    Self {
      location_slug: location_slug.into(),
      item_name:     item_name.into(),
      first_seen:    day,
      last_seen:     day,
    }
  }
}
