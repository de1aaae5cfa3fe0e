//! Subscriptions and the delivery ledger.
//!
//! A subscription watches for a normalized flavor fragment at a set of
//! locations. Only confirmed subscriptions are visible to the matcher.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, normalize::normalize};

/// Which locations a subscription cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "slugs", rename_all = "snake_case")]
pub enum LocationFilter {
  #[default]
  All,
  Only(BTreeSet<String>),
}

impl LocationFilter {
  /// An empty slug list means "every location".
  pub fn from_slugs(slugs: impl IntoIterator<Item = String>) -> Self {
    let slugs: BTreeSet<String> = slugs
      .into_iter()
      .map(|s| s.trim().to_owned())
      .filter(|s| !s.is_empty())
      .collect();
    if slugs.is_empty() { Self::All } else { Self::Only(slugs) }
  }

  pub fn allows(&self, location_slug: &str) -> bool {
    match self {
      Self::All => true,
      Self::Only(slugs) => slugs.contains(location_slug),
    }
  }
}

/// A persisted subscription row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
  pub subscription_id:   Uuid,
  pub email:             String,
  /// Already normalized; matched by substring containment.
  pub pattern:           String,
  pub locations:         LocationFilter,
  pub confirmed:         bool,
  pub confirm_token:     Uuid,
  pub unsubscribe_token: Uuid,
  pub created_at:        DateTime<Utc>,
}

/// Input for [`FlavorStore::insert_subscription`](crate::store::FlavorStore::insert_subscription).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
  pub email:     String,
  pub pattern:   String,
  pub locations: LocationFilter,
}

impl NewSubscription {
  /// Validate the address and normalize the raw flavor pattern.
  pub fn new(
    email: &str,
    raw_pattern: &str,
    locations: impl IntoIterator<Item = String>,
  ) -> Result<Self> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
      return Err(Error::MissingEmail);
    }
    match email.split_once('@') {
      Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
      _ => return Err(Error::InvalidEmail(email)),
    }

    let pattern = normalize(raw_pattern);
    if pattern.is_empty() {
      return Err(Error::EmptyPattern(raw_pattern.to_owned()));
    }

    Ok(Self { email, pattern, locations: LocationFilter::from_slugs(locations) })
  }
}

/// Outcome of inserting a subscription; `(email, pattern)` is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionInsert {
  Created(Subscription),
  Duplicate,
}

/// Records that a subscriber has been told about an item at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
  pub subscription_id: Uuid,
  pub location_slug:   String,
  pub item_name:       String,
  pub delivered_on:    NaiveDate,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_location_list_means_all() {
    assert_eq!(LocationFilter::from_slugs(vec![]), LocationFilter::All);
    assert_eq!(LocationFilter::from_slugs(vec!["  ".into()]), LocationFilter::All);
    assert!(LocationFilter::All.allows("anywhere"));
  }

  #[test]
  fn only_filter_checks_membership() {
    let f = LocationFilter::from_slugs(vec!["louisville".into()]);
    assert!(f.allows("louisville"));
    assert!(!f.allows("longmont"));
  }

  #[test]
  fn new_subscription_normalizes() {
    let s = NewSubscription::new(" Fan@Example.com ", "Salted Caramel!", vec![]).unwrap();
    assert_eq!(s.email, "fan@example.com");
    assert_eq!(s.pattern, "saltedcaramel");
    assert_eq!(s.locations, LocationFilter::All);
  }

  #[test]
  fn new_subscription_rejects_bad_input() {
    assert!(matches!(NewSubscription::new("", "Mint", vec![]), Err(Error::MissingEmail)));
    assert!(matches!(
      NewSubscription::new("not-an-address", "Mint", vec![]),
      Err(Error::InvalidEmail(_))
    ));
    assert!(matches!(
      NewSubscription::new("a@b.c", "!!!", vec![]),
      Err(Error::EmptyPattern(_))
    ));
  }

  #[test]
  fn filter_serializes_tagged() {
    let json = serde_json::to_string(&LocationFilter::All).unwrap();
    assert_eq!(json, r#"{"kind":"all"}"#);
    let only = LocationFilter::from_slugs(vec!["a".into()]);
    let back: LocationFilter =
      serde_json::from_str(&serde_json::to_string(&only).unwrap()).unwrap();
    assert_eq!(back, only);
  }
}
