//! Matching today's new items against confirmed subscriptions.
//!
//! Every subscription with at least one match yields exactly one
//! [`Notification`] grouping all of its matches, however many locations they
//! span.

use std::collections::{HashMap, HashSet};

use crate::{
  location::Location,
  normalize::normalize,
  observation::ItemObservation,
  subscription::{Delivery, Subscription},
};

/// One `(location, item)` pair listed in a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedItem {
  pub location_slug: String,
  /// Display name; falls back to the slug for unknown locations.
  pub location_name: String,
  pub item_name:     String,
}

/// Everything a single subscriber should be told about in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub subscription: Subscription,
  pub items:        Vec<MatchedItem>,
}

impl Notification {
  /// Drop items the subscriber has already been told about.
  pub fn retain_undelivered(&mut self, delivered: &[Delivery]) {
    let seen: HashSet<(&str, &str)> = delivered
      .iter()
      .map(|d| (d.location_slug.as_str(), d.item_name.as_str()))
      .collect();
    self
      .items
      .retain(|i| !seen.contains(&(i.location_slug.as_str(), i.item_name.as_str())));
  }
}

/// Does `item` fall inside `subscription`'s location filter and contain its
/// pattern?
pub fn matches(subscription: &Subscription, item: &ItemObservation) -> bool {
  subscription.locations.allows(&item.location_slug)
    && normalize(&item.item_name).contains(subscription.pattern.as_str())
}

/// Build one notification per subscription that has at least one match.
///
/// Unconfirmed subscriptions are ignored even if the caller passes them in.
pub fn build_notifications(
  new_items: &[ItemObservation],
  locations: &[Location],
  subscriptions: &[Subscription],
) -> Vec<Notification> {
  let names: HashMap<&str, &str> = locations
    .iter()
    .map(|l| (l.slug.as_str(), l.name.as_str()))
    .collect();

  subscriptions
    .iter()
    .filter(|s| s.confirmed)
    .filter_map(|subscription| {
      let items: Vec<MatchedItem> = new_items
        .iter()
        .filter(|item| matches(subscription, item))
        .map(|item| MatchedItem {
          location_slug: item.location_slug.clone(),
          location_name: names
            .get(item.location_slug.as_str())
            .map_or_else(|| item.location_slug.clone(), |n| (*n).to_owned()),
          item_name:     item.item_name.clone(),
        })
        .collect();

      (!items.is_empty()).then(|| Notification { subscription: subscription.clone(), items })
    })
    .collect()
}
