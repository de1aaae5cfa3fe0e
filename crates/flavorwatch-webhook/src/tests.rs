//! Router tests for the webhook endpoint, driven with `oneshot`.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{HeaderMap, Request, StatusCode},
  response::Response,
};
use chrono::{NaiveDate, Utc};
use flavorwatch_api::ApiSettings;
use flavorwatch_core::{
  location::Location,
  observation::ItemObservation,
  store::FlavorStore,
  subscription::{Delivery, NewSubscription, Subscription, SubscriptionInsert},
};
use flavorwatch_http::ResendMailer;
use flavorwatch_store_sqlite::SqliteStore;
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{
  AppState, MAX_WEBHOOK_BODY, router,
  signature::{
    WebhookSecret,
    tests::{SECRET, sign, signed_headers},
  },
};

fn state_for<S>(store: S) -> AppState<S, ResendMailer> {
  AppState {
    store:    Arc::new(store),
    mailer:   None,
    secret:   Arc::new(WebhookSecret::parse(SECRET).unwrap()),
    settings: Arc::new(ApiSettings {
      app_url:   "https://app.example".into(),
      mail_from: "alerts@example.com".into(),
    }),
  }
}

async fn make_state() -> AppState<SqliteStore, ResendMailer> {
  state_for(SqliteStore::open_in_memory().await.unwrap())
}

async fn post_raw<S: FlavorStore + 'static>(
  state: AppState<S, ResendMailer>,
  headers: HeaderMap,
  body: Vec<u8>,
) -> Response {
  let mut req = Request::builder()
    .method("POST")
    .uri("/webhooks/resend")
    .body(Body::from(body))
    .unwrap();
  req.headers_mut().extend(headers);
  router(state).oneshot(req).await.unwrap()
}

/// POST `body` with a fresh, valid signature.
async fn post_signed<S: FlavorStore + 'static>(
  state: AppState<S, ResendMailer>,
  body: &str,
) -> Response {
  let now = Utc::now().timestamp();
  let headers = signed_headers("msg_1", now, &sign(SECRET, "msg_1", now, body.as_bytes()));
  post_raw(state, headers, body.as_bytes().to_vec()).await
}

async fn subscribe(store: &SqliteStore, email: &str, pattern: &str) {
  let input = NewSubscription::new(email, pattern, Vec::new()).unwrap();
  let SubscriptionInsert::Created(sub) = store.insert_subscription(input).await.unwrap() else {
    panic!("expected a new subscription");
  };
  store.confirm_subscription(sub.confirm_token).await.unwrap();
}

async fn subscribers(store: &SqliteStore) -> Vec<String> {
  store
    .list_confirmed_subscriptions()
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.email)
    .collect()
}

// ── Suppression events ────────────────────────────────────────────────────────

#[tokio::test]
async fn bounce_removes_every_subscription_for_the_address() {
  let state = make_state().await;
  subscribe(&state.store, "gone@example.com", "Mint").await;
  subscribe(&state.store, "gone@example.com", "Vanilla").await;
  subscribe(&state.store, "fan@example.com", "Mint").await;

  let resp = post_signed(
    state.clone(),
    r#"{"type":"email.bounced","data":{"to":"Gone@Example.com"}}"#,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(subscribers(&state.store).await, ["fan@example.com"]);
}

#[tokio::test]
async fn complaint_accepts_a_recipient_list() {
  let state = make_state().await;
  subscribe(&state.store, "a@example.com", "Mint").await;
  subscribe(&state.store, "b@example.com", "Mint").await;
  subscribe(&state.store, "c@example.com", "Mint").await;

  let resp = post_signed(
    state.clone(),
    r#"{"type":"email.complained","data":{"to":["a@example.com","b@example.com"]}}"#,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(subscribers(&state.store).await, ["c@example.com"]);
}

#[tokio::test]
async fn other_events_are_acknowledged_and_ignored() {
  let state = make_state().await;
  subscribe(&state.store, "a@example.com", "Mint").await;

  let resp = post_signed(
    state.clone(),
    r#"{"type":"email.delivered","data":{"to":["a@example.com"]}}"#,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  assert_eq!(&bytes[..], br#"{"ok":true}"#);
  assert_eq!(subscribers(&state.store).await, ["a@example.com"]);
}

// ── Rejections ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn bad_signature_is_401_and_mutates_nothing() {
  let state = make_state().await;
  subscribe(&state.store, "a@example.com", "Mint").await;

  let body = r#"{"type":"email.bounced","data":{"to":"a@example.com"}}"#;
  let now = Utc::now().timestamp();
  let headers = signed_headers("msg_1", now, &sign(SECRET, "msg_1", now, b"something else"));

  let resp = post_raw(state.clone(), headers, body.as_bytes().to_vec()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(subscribers(&state.store).await, ["a@example.com"]);
}

#[tokio::test]
async fn unsigned_request_is_401() {
  let state = make_state().await;
  let resp = post_raw(state, HeaderMap::new(), b"{}".to_vec()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_json_after_valid_signature_is_400() {
  let state = make_state().await;
  let resp = post_signed(state, "not json").await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
  let state = make_state().await;
  let resp = post_raw(state, HeaderMap::new(), vec![b' '; MAX_WEBHOOK_BODY + 1]).await;
  assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn wrong_method_is_405() {
  let state = make_state().await;
  let req = Request::builder()
    .method("GET")
    .uri("/webhooks/resend")
    .body(Body::empty())
    .unwrap();
  let resp = router(state).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn api_is_mounted_under_api() {
  let state = make_state().await;
  let req = Request::builder()
    .method("GET")
    .uri("/api/flavors")
    .body(Body::empty())
    .unwrap();
  let resp = router(state).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
}

// ── Store failure ─────────────────────────────────────────────────────────────

/// A store whose every operation fails.
struct BrokenStore;

fn broken<T>() -> Result<T, std::io::Error> {
  Err(std::io::Error::other("database is locked"))
}

impl FlavorStore for BrokenStore {
  type Error = std::io::Error;
  async fn list_locations(&self) -> Result<Vec<Location>, Self::Error> { broken() }
  async fn list_active_locations(&self) -> Result<Vec<Location>, Self::Error> { broken() }
  async fn insert_location(&self, _: Location) -> Result<(), Self::Error> { broken() }
  async fn set_location_active<'a>(&'a self, _: &'a str, _: bool) -> Result<bool, Self::Error> { broken() }
  async fn list_observations<'a>(&'a self, _: &'a str) -> Result<Vec<ItemObservation>, Self::Error> { broken() }
  async fn insert_observations<'a>(&'a self, _: &'a [ItemObservation]) -> Result<usize, Self::Error> { broken() }
  async fn touch_observations<'a>(&'a self, _: &'a str, _: &'a [String], _: NaiveDate) -> Result<usize, Self::Error> { broken() }
  async fn new_observations(&self, _: NaiveDate) -> Result<Vec<ItemObservation>, Self::Error> { broken() }
  async fn available_observations(&self, _: NaiveDate) -> Result<Vec<ItemObservation>, Self::Error> { broken() }
  async fn insert_subscription(&self, _: NewSubscription) -> Result<SubscriptionInsert, Self::Error> { broken() }
  async fn confirm_subscription(&self, _: Uuid) -> Result<bool, Self::Error> { broken() }
  async fn list_confirmed_subscriptions(&self) -> Result<Vec<Subscription>, Self::Error> { broken() }
  async fn delete_subscription_by_unsubscribe_token(&self, _: Uuid) -> Result<usize, Self::Error> { broken() }
  async fn delete_subscriptions_by_email<'a>(&'a self, _: &'a [String]) -> Result<usize, Self::Error> { broken() }
  async fn list_deliveries(&self, _: Uuid) -> Result<Vec<Delivery>, Self::Error> { broken() }
  async fn record_deliveries<'a>(&'a self, _: &'a [Delivery]) -> Result<usize, Self::Error> { broken() }
}

#[tokio::test]
async fn store_failure_is_500() {
  let state = state_for(BrokenStore);
  let resp = post_signed(state, r#"{"type":"email.bounced","data":{"to":"a@example.com"}}"#).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
