//! The `FlavorStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `flavorwatch-store-sqlite`). The pipeline, the API and the webhook depend on
//! this abstraction, not on any concrete backend, and only on the narrow set
//! of operations they actually perform.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  location::Location,
  observation::ItemObservation,
  subscription::{Delivery, NewSubscription, Subscription, SubscriptionInsert},
};

/// Abstraction over a flavorwatch store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`). Implementations must bound every
/// operation with a timeout rather than wait indefinitely.
pub trait FlavorStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Locations ─────────────────────────────────────────────────────────

  /// Every location, active or not.
  fn list_locations(
    &self,
  ) -> impl Future<Output = Result<Vec<Location>, Self::Error>> + Send + '_;

  fn list_active_locations(
    &self,
  ) -> impl Future<Output = Result<Vec<Location>, Self::Error>> + Send + '_;

  /// Insert a new location. Fails if the slug or url is already taken.
  fn insert_location(
    &self,
    location: Location,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Flip the active flag. Returns `false` if no such slug exists.
  fn set_location_active<'a>(
    &'a self,
    slug: &'a str,
    active: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Observations ──────────────────────────────────────────────────────

  /// All observations recorded for one location.
  fn list_observations<'a>(
    &'a self,
    location_slug: &'a str,
  ) -> impl Future<Output = Result<Vec<ItemObservation>, Self::Error>> + Send + 'a;

  /// Insert first sightings. A row whose natural key already exists is left
  /// untouched, so `first_seen` can never be rewritten. Returns the number of
  /// rows actually inserted.
  fn insert_observations<'a>(
    &'a self,
    observations: &'a [ItemObservation],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Move `last_seen` forward to `day` for the named items at a location.
  /// Never moves it backwards and never touches `first_seen`. Returns the
  /// number of rows changed.
  fn touch_observations<'a>(
    &'a self,
    location_slug: &'a str,
    item_names: &'a [String],
    day: NaiveDate,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Observations with `first_seen == day AND last_seen == day`.
  fn new_observations(
    &self,
    day: NaiveDate,
  ) -> impl Future<Output = Result<Vec<ItemObservation>, Self::Error>> + Send + '_;

  /// Observations with `last_seen == day`, the live availability view.
  fn available_observations(
    &self,
    day: NaiveDate,
  ) -> impl Future<Output = Result<Vec<ItemObservation>, Self::Error>> + Send + '_;

  // ── Subscriptions ─────────────────────────────────────────────────────

  /// Insert an unconfirmed subscription with fresh tokens.
  fn insert_subscription(
    &self,
    input: NewSubscription,
  ) -> impl Future<Output = Result<SubscriptionInsert, Self::Error>> + Send + '_;

  /// Mark the subscription holding `confirm_token` as confirmed. Returns
  /// `false` if the token is unknown.
  fn confirm_subscription(
    &self,
    confirm_token: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn list_confirmed_subscriptions(
    &self,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + '_;

  /// Returns the number of subscriptions removed (0 or 1).
  fn delete_subscription_by_unsubscribe_token(
    &self,
    unsubscribe_token: Uuid,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Remove every subscription for any of `emails` in one batch operation.
  /// Addresses are compared case-insensitively. Returns the number of
  /// subscriptions removed.
  fn delete_subscriptions_by_email<'a>(
    &'a self,
    emails: &'a [String],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  // ── Deliveries ────────────────────────────────────────────────────────

  fn list_deliveries(
    &self,
    subscription_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Delivery>, Self::Error>> + Send + '_;

  /// Record deliveries; already-recorded pairs are ignored. Returns the
  /// number of new rows.
  fn record_deliveries<'a>(
    &'a self,
    deliveries: &'a [Delivery],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;
}
