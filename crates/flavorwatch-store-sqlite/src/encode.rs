//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase strings and the location filter is compact JSON.

use chrono::{DateTime, NaiveDate, Utc};
use flavorwatch_core::{
  location::Location,
  observation::ItemObservation,
  subscription::{Delivery, LocationFilter, Subscription},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── LocationFilter ───────────────────────────────────────────────────────────

pub fn encode_filter(f: &LocationFilter) -> Result<String> { Ok(serde_json::to_string(f)?) }

pub fn decode_filter(s: &str) -> Result<LocationFilter> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const LOCATION_COLUMNS: &str = "slug, name, url, address, active";

/// Values read directly from a `locations` row.
pub struct RawLocation {
  pub slug:    String,
  pub name:    String,
  pub url:     String,
  pub address: Option<String>,
  pub active:  bool,
}

impl RawLocation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      slug:    row.get(0)?,
      name:    row.get(1)?,
      url:     row.get(2)?,
      address: row.get(3)?,
      active:  row.get(4)?,
    })
  }

  pub fn into_location(self) -> Location {
    Location {
      slug:    self.slug,
      name:    self.name,
      url:     self.url,
      address: self.address,
      active:  self.active,
    }
  }
}

pub const OBSERVATION_COLUMNS: &str = "location_slug, item_name, first_seen, last_seen";

/// Raw strings read directly from an `observations` row.
pub struct RawObservation {
  pub location_slug: String,
  pub item_name:     String,
  pub first_seen:    String,
  pub last_seen:     String,
}

impl RawObservation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      location_slug: row.get(0)?,
      item_name:     row.get(1)?,
      first_seen:    row.get(2)?,
      last_seen:     row.get(3)?,
    })
  }

  pub fn into_observation(self) -> Result<ItemObservation> {
    Ok(ItemObservation {
      location_slug: self.location_slug,
      item_name:     self.item_name,
      first_seen:    decode_date(&self.first_seen)?,
      last_seen:     decode_date(&self.last_seen)?,
    })
  }
}

pub const SUBSCRIPTION_COLUMNS: &str = "subscription_id, email, pattern, locations, confirmed, \
                                        confirm_token, unsubscribe_token, created_at";

/// Raw strings read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub subscription_id:   String,
  pub email:             String,
  pub pattern:           String,
  pub locations:         String,
  pub confirmed:         bool,
  pub confirm_token:     String,
  pub unsubscribe_token: String,
  pub created_at:        String,
}

impl RawSubscription {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id:   row.get(0)?,
      email:             row.get(1)?,
      pattern:           row.get(2)?,
      locations:         row.get(3)?,
      confirmed:         row.get(4)?,
      confirm_token:     row.get(5)?,
      unsubscribe_token: row.get(6)?,
      created_at:        row.get(7)?,
    })
  }

  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      subscription_id:   decode_uuid(&self.subscription_id)?,
      email:             self.email,
      pattern:           self.pattern,
      locations:         decode_filter(&self.locations)?,
      confirmed:         self.confirmed,
      confirm_token:     decode_uuid(&self.confirm_token)?,
      unsubscribe_token: decode_uuid(&self.unsubscribe_token)?,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `deliveries` row.
pub struct RawDelivery {
  pub subscription_id: String,
  pub location_slug:   String,
  pub item_name:       String,
  pub delivered_on:    String,
}

impl RawDelivery {
  pub fn into_delivery(self) -> Result<Delivery> {
    Ok(Delivery {
      subscription_id: decode_uuid(&self.subscription_id)?,
      location_slug:   self.location_slug,
      item_name:       self.item_name,
      delivered_on:    decode_date(&self.delivered_on)?,
    })
  }
}
