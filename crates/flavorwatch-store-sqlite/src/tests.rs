//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use flavorwatch_core::{
  location::Location,
  observation::ItemObservation,
  store::FlavorStore,
  subscription::{Delivery, LocationFilter, NewSubscription, SubscriptionInsert},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 6, d).unwrap() }

fn location(slug: &str) -> Location {
  Location {
    slug:    slug.into(),
    name:    slug.to_uppercase(),
    url:     format!("https://sweetcow.com/{slug}/"),
    address: None,
    active:  true,
  }
}

fn names(observations: &[ItemObservation]) -> Vec<&str> {
  observations.iter().map(|o| o.item_name.as_str()).collect()
}

// ─── Locations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_list_locations() {
  let s = store().await;
  s.insert_location(location("south")).await.unwrap();
  s.insert_location(location("north")).await.unwrap();

  let all = s.list_locations().await.unwrap();
  let slugs: Vec<&str> = all.iter().map(|l| l.slug.as_str()).collect();
  assert_eq!(slugs, ["north", "south"]);
  assert!(all.iter().all(|l| l.active));
}

#[tokio::test]
async fn duplicate_location_is_rejected() {
  let s = store().await;
  s.insert_location(location("north")).await.unwrap();
  assert!(s.insert_location(location("north")).await.is_err());
}

#[tokio::test]
async fn deactivation_hides_location_from_active_list() {
  let s = store().await;
  s.insert_location(location("north")).await.unwrap();
  s.insert_location(location("south")).await.unwrap();

  assert!(s.set_location_active("south", false).await.unwrap());
  assert!(!s.set_location_active("nowhere", false).await.unwrap());

  let active = s.list_active_locations().await.unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].slug, "north");
  // Deactivated rows are kept, not deleted.
  assert_eq!(s.list_locations().await.unwrap().len(), 2);

  assert!(s.set_location_active("south", true).await.unwrap());
  assert_eq!(s.list_active_locations().await.unwrap().len(), 2);
}

// ─── Observations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_observations_ignores_existing_keys() {
  let s = store().await;
  let first = [
    ItemObservation::first_sighting("x", "Vanilla", day(1)),
    ItemObservation::first_sighting("x", "Mint", day(1)),
  ];
  assert_eq!(s.insert_observations(&first).await.unwrap(), 2);

  // A second "first sighting" must not rewrite first_seen.
  let again = [ItemObservation::first_sighting("x", "Vanilla", day(3))];
  assert_eq!(s.insert_observations(&again).await.unwrap(), 0);

  let stored = s.list_observations("x").await.unwrap();
  assert_eq!(names(&stored), ["Mint", "Vanilla"]);
  assert!(stored.iter().all(|o| o.first_seen == day(1)));
}

#[tokio::test]
async fn touch_moves_last_seen_forward_only() {
  let s = store().await;
  s.insert_observations(&[ItemObservation::first_sighting("x", "Vanilla", day(2))])
    .await
    .unwrap();

  let names = vec!["Vanilla".to_owned(), "Unknown".to_owned()];
  assert_eq!(s.touch_observations("x", &names, day(4)).await.unwrap(), 1);
  // Same day again, and an earlier day, change nothing.
  assert_eq!(s.touch_observations("x", &names, day(4)).await.unwrap(), 0);
  assert_eq!(s.touch_observations("x", &names, day(3)).await.unwrap(), 0);

  let stored = s.list_observations("x").await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].first_seen, day(2));
  assert_eq!(stored[0].last_seen, day(4));
}

#[tokio::test]
async fn new_and_available_views() {
  let s = store().await;

  // Day 1: A and B appear.
  s.insert_observations(&[
    ItemObservation::first_sighting("x", "A", day(1)),
    ItemObservation::first_sighting("x", "B", day(1)),
  ])
  .await
  .unwrap();
  assert_eq!(names(&s.new_observations(day(1)).await.unwrap()), ["A", "B"]);

  // Day 2: B stays, C appears, A disappears.
  s.touch_observations("x", &["B".to_owned()], day(2)).await.unwrap();
  s.insert_observations(&[ItemObservation::first_sighting("x", "C", day(2))])
    .await
    .unwrap();

  assert_eq!(names(&s.new_observations(day(2)).await.unwrap()), ["C"]);
  assert_eq!(names(&s.available_observations(day(2)).await.unwrap()), ["B", "C"]);

  let a = s
    .list_observations("x")
    .await
    .unwrap()
    .into_iter()
    .find(|o| o.item_name == "A")
    .unwrap();
  assert_eq!(a.last_seen, day(1));
}

#[tokio::test]
async fn returning_item_is_not_new() {
  let s = store().await;
  s.insert_observations(&[ItemObservation::first_sighting("x", "A", day(1))])
    .await
    .unwrap();
  // Gone on day 2, back on day 3.
  s.touch_observations("x", &["A".to_owned()], day(3)).await.unwrap();

  assert!(s.new_observations(day(3)).await.unwrap().is_empty());
  assert_eq!(names(&s.available_observations(day(3)).await.unwrap()), ["A"]);
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn subscribe_confirm_and_list() {
  let s = store().await;
  let input = NewSubscription::new("Fan@Example.com", "Salted Caramel", vec![]).unwrap();

  let SubscriptionInsert::Created(sub) = s.insert_subscription(input).await.unwrap() else {
    panic!("expected a new subscription");
  };
  assert!(!sub.confirmed);
  assert_eq!(sub.email, "fan@example.com");
  assert_eq!(sub.pattern, "saltedcaramel");

  // Unconfirmed subscriptions are invisible to the matcher.
  assert!(s.list_confirmed_subscriptions().await.unwrap().is_empty());

  assert!(s.confirm_subscription(sub.confirm_token).await.unwrap());
  assert!(!s.confirm_subscription(Uuid::new_v4()).await.unwrap());

  let confirmed = s.list_confirmed_subscriptions().await.unwrap();
  assert_eq!(confirmed.len(), 1);
  assert_eq!(confirmed[0].subscription_id, sub.subscription_id);
  assert_eq!(confirmed[0].locations, LocationFilter::All);
  assert!(confirmed[0].confirmed);
}

#[tokio::test]
async fn duplicate_subscription_is_reported() {
  let s = store().await;
  let input = NewSubscription::new("fan@example.com", "Mint", vec![]).unwrap();
  assert!(matches!(
    s.insert_subscription(input.clone()).await.unwrap(),
    SubscriptionInsert::Created(_)
  ));
  assert_eq!(s.insert_subscription(input).await.unwrap(), SubscriptionInsert::Duplicate);
}

#[tokio::test]
async fn location_filter_round_trips() {
  let s = store().await;
  let input =
    NewSubscription::new("fan@example.com", "Mint", vec!["north".into(), "south".into()]).unwrap();
  let SubscriptionInsert::Created(sub) = s.insert_subscription(input).await.unwrap() else {
    panic!("expected a new subscription");
  };
  s.confirm_subscription(sub.confirm_token).await.unwrap();

  let stored = &s.list_confirmed_subscriptions().await.unwrap()[0];
  assert!(stored.locations.allows("south"));
  assert!(!stored.locations.allows("east"));
}

#[tokio::test]
async fn unsubscribe_by_token() {
  let s = store().await;
  let input = NewSubscription::new("fan@example.com", "Mint", vec![]).unwrap();
  let SubscriptionInsert::Created(sub) = s.insert_subscription(input).await.unwrap() else {
    panic!("expected a new subscription");
  };

  assert_eq!(s.delete_subscription_by_unsubscribe_token(Uuid::new_v4()).await.unwrap(), 0);
  assert_eq!(
    s.delete_subscription_by_unsubscribe_token(sub.unsubscribe_token).await.unwrap(),
    1
  );
  assert!(!s.confirm_subscription(sub.confirm_token).await.unwrap());
}

#[tokio::test]
async fn delete_by_email_is_batched_and_case_insensitive() {
  let s = store().await;
  for (email, pattern) in [
    ("a@example.com", "Mint"),
    ("a@example.com", "Vanilla"),
    ("b@example.com", "Mint"),
    ("c@example.com", "Mint"),
  ] {
    s.insert_subscription(NewSubscription::new(email, pattern, vec![]).unwrap())
      .await
      .unwrap();
  }

  let deleted = s
    .delete_subscriptions_by_email(&["A@Example.com".into(), "b@example.com".into()])
    .await
    .unwrap();
  assert_eq!(deleted, 3);
  assert_eq!(s.delete_subscriptions_by_email(&[]).await.unwrap(), 0);
  assert_eq!(
    s.delete_subscriptions_by_email(&["nobody@example.com".into()])
      .await
      .unwrap(),
    0
  );
}

// ─── Deliveries ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn deliveries_are_recorded_once_and_cascade() {
  let s = store().await;
  let input = NewSubscription::new("fan@example.com", "Mint", vec![]).unwrap();
  let SubscriptionInsert::Created(sub) = s.insert_subscription(input).await.unwrap() else {
    panic!("expected a new subscription");
  };

  let delivery = Delivery {
    subscription_id: sub.subscription_id,
    location_slug:   "north".into(),
    item_name:       "Mint Chip".into(),
    delivered_on:    day(1),
  };
  assert_eq!(s.record_deliveries(&[delivery.clone()]).await.unwrap(), 1);
  assert_eq!(s.record_deliveries(&[delivery.clone()]).await.unwrap(), 0);
  assert_eq!(s.list_deliveries(sub.subscription_id).await.unwrap(), vec![delivery]);

  s.delete_subscriptions_by_email(&["fan@example.com".into()])
    .await
    .unwrap();
  assert!(s.list_deliveries(sub.subscription_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn reopening_a_file_store_keeps_data() {
  let path = std::env::temp_dir().join(format!("flavorwatch-{}.db", Uuid::new_v4()));

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.insert_location(location("north")).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.list_locations().await.unwrap().len(), 1);

  drop(s);
  let _ = std::fs::remove_file(&path);
}
