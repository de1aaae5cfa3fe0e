//! Subscriber notification.
//!
//! Matching is pure and lives in `flavorwatch_core::matcher`; this module
//! dispatches the resulting notifications and keeps the delivery ledger so a
//! rerun on the same day does not repeat itself.

use chrono::NaiveDate;
use flavorwatch_core::{
  email::notify_email,
  location::Location,
  mail::Mailer,
  matcher::{Notification, build_notifications},
  observation::ItemObservation,
  store::FlavorStore,
  subscription::Delivery,
};
use futures::{StreamExt as _, stream};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct NotifySettings {
  /// `From:` header of every notification.
  pub from:        String,
  /// Public base URL for the tracker and unsubscribe links.
  pub app_url:     String,
  pub concurrency: usize,
}

impl NotifySettings {
  pub fn unsubscribe_url(&self, token: Uuid) -> String {
    format!("{}/api/unsubscribe?token={token}", self.app_url.trim_end_matches('/'))
  }
}

/// What happened to one subscriber's notification.
#[derive(Debug)]
pub enum DispatchOutcome {
  Sent { subscription_id: Uuid, items: usize },
  /// Every matched pair had been delivered by an earlier run.
  AlreadyDelivered { subscription_id: Uuid },
  Failed { subscription_id: Uuid, error: Error },
}

#[derive(Debug, Default)]
pub struct NotifyReport {
  pub outcomes: Vec<DispatchOutcome>,
}

impl NotifyReport {
  pub fn sent(&self) -> usize {
    self
      .outcomes
      .iter()
      .filter(|o| matches!(o, DispatchOutcome::Sent { .. }))
      .count()
  }

  pub fn failed(&self) -> usize {
    self
      .outcomes
      .iter()
      .filter(|o| matches!(o, DispatchOutcome::Failed { .. }))
      .count()
  }
}

/// Match `new_items` against confirmed subscriptions and send one email per
/// matching subscriber.
///
/// Fails only if the subscription list cannot be read. Each dispatch reports
/// its own outcome; a failed send never stops the others.
pub async fn notify<S: FlavorStore, M: Mailer>(
  store: &S,
  mailer: &M,
  new_items: &[ItemObservation],
  locations: &[Location],
  settings: &NotifySettings,
  today: NaiveDate,
) -> Result<NotifyReport> {
  if new_items.is_empty() {
    return Ok(NotifyReport::default());
  }

  let subscriptions = store
    .list_confirmed_subscriptions()
    .await
    .map_err(Error::store)?;
  let notifications = build_notifications(new_items, locations, &subscriptions);
  info!(
    subscriptions = subscriptions.len(),
    matched = notifications.len(),
    "matched new items against subscriptions"
  );

  let outcomes = stream::iter(
    notifications
      .into_iter()
      .map(|n| dispatch(store, mailer, n, settings, today)),
  )
  .buffer_unordered(settings.concurrency.max(1))
  .collect()
  .await;

  Ok(NotifyReport { outcomes })
}

async fn dispatch<S: FlavorStore, M: Mailer>(
  store: &S,
  mailer: &M,
  mut notification: Notification,
  settings: &NotifySettings,
  today: NaiveDate,
) -> DispatchOutcome {
  let subscription_id = notification.subscription.subscription_id;

  let delivered = match store.list_deliveries(subscription_id).await {
    Ok(delivered) => delivered,
    Err(e) => {
      warn!(subscription = %subscription_id, error = %e, "failed to read delivery ledger");
      return DispatchOutcome::Failed { subscription_id, error: Error::store(e) };
    }
  };

  notification.retain_undelivered(&delivered);
  if notification.items.is_empty() {
    return DispatchOutcome::AlreadyDelivered { subscription_id };
  }

  let unsubscribe_url = settings.unsubscribe_url(notification.subscription.unsubscribe_token);
  let email = notify_email(&settings.from, &notification, &settings.app_url, &unsubscribe_url);

  if let Err(e) = mailer.send(&email).await {
    warn!(to = %email.to, error = %e, "failed to notify subscriber");
    return DispatchOutcome::Failed { subscription_id, error: e.into() };
  }
  info!(to = %email.to, items = notification.items.len(), "notified subscriber");

  let deliveries: Vec<Delivery> = notification
    .items
    .iter()
    .map(|item| Delivery {
      subscription_id,
      location_slug: item.location_slug.clone(),
      item_name: item.item_name.clone(),
      delivered_on: today,
    })
    .collect();

  if let Err(e) = store.record_deliveries(&deliveries).await {
    warn!(subscription = %subscription_id, error = %e, "sent but failed to record deliveries");
  }

  DispatchOutcome::Sent { subscription_id, items: deliveries.len() }
}
