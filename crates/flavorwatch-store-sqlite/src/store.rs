//! [`SqliteStore`], the SQLite implementation of [`FlavorStore`].

use std::{path::Path, time::Duration};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use flavorwatch_core::{
  location::Location,
  observation::ItemObservation,
  store::FlavorStore,
  subscription::{Delivery, NewSubscription, Subscription, SubscriptionInsert},
};

use crate::{
  Result,
  encode::{
    LOCATION_COLUMNS, OBSERVATION_COLUMNS, RawDelivery, RawLocation, RawObservation,
    RawSubscription, SUBSCRIPTION_COLUMNS, encode_date, encode_dt, encode_filter, encode_uuid,
  },
  schema::SCHEMA,
};

/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A flavorwatch store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_locations(&self, active_only: bool) -> Result<Vec<Location>> {
    let sql = if active_only {
      format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE active = 1 ORDER BY slug")
    } else {
      format!("SELECT {LOCATION_COLUMNS} FROM locations ORDER BY slug")
    };

    let raws: Vec<RawLocation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawLocation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawLocation::into_location).collect())
  }

  /// Observations whose date columns equal `day`, per `condition`.
  async fn query_observations_on(
    &self,
    condition: &'static str,
    day: NaiveDate,
  ) -> Result<Vec<ItemObservation>> {
    let day_str = encode_date(day);
    let sql = format!(
      "SELECT {OBSERVATION_COLUMNS} FROM observations WHERE {condition}
       ORDER BY location_slug, item_name"
    );

    let raws: Vec<RawObservation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![day_str], RawObservation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawObservation::into_observation).collect()
  }
}

// ─── FlavorStore impl ────────────────────────────────────────────────────────

impl FlavorStore for SqliteStore {
  type Error = crate::Error;

  // ── Locations ─────────────────────────────────────────────────────────────

  async fn list_locations(&self) -> Result<Vec<Location>> { self.query_locations(false).await }

  async fn list_active_locations(&self) -> Result<Vec<Location>> {
    self.query_locations(true).await
  }

  async fn insert_location(&self, location: Location) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO locations (slug, name, url, address, active) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            location.slug,
            location.name,
            location.url,
            location.address,
            location.active,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_location_active<'a>(&'a self, slug: &'a str, active: bool) -> Result<bool> {
    let slug = slug.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE locations SET active = ?2 WHERE slug = ?1",
          rusqlite::params![slug, active],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Observations ──────────────────────────────────────────────────────────

  async fn list_observations<'a>(
    &'a self,
    location_slug: &'a str,
  ) -> Result<Vec<ItemObservation>> {
    let slug = location_slug.to_owned();

    let raws: Vec<RawObservation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {OBSERVATION_COLUMNS} FROM observations
           WHERE location_slug = ?1 ORDER BY item_name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![slug], RawObservation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawObservation::into_observation).collect()
  }

  async fn insert_observations<'a>(
    &'a self,
    observations: &'a [ItemObservation],
  ) -> Result<usize> {
    let rows: Vec<(String, String, String, String)> = observations
      .iter()
      .map(|o| {
        (
          o.location_slug.clone(),
          o.item_name.clone(),
          encode_date(o.first_seen),
          encode_date(o.last_seen),
        )
      })
      .collect();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO observations (location_slug, item_name, first_seen, last_seen)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (location_slug, item_name) DO NOTHING",
          )?;
          for (slug, name, first, last) in &rows {
            inserted += stmt.execute(rusqlite::params![slug, name, first, last])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    Ok(inserted)
  }

  async fn touch_observations<'a>(
    &'a self,
    location_slug: &'a str,
    item_names: &'a [String],
    day: NaiveDate,
  ) -> Result<usize> {
    let slug    = location_slug.to_owned();
    let names   = item_names.to_vec();
    let day_str = encode_date(day);

    let touched = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut touched = 0;
        {
          let mut stmt = tx.prepare(
            "UPDATE observations SET last_seen = ?3
             WHERE location_slug = ?1 AND item_name = ?2 AND last_seen < ?3",
          )?;
          for name in &names {
            touched += stmt.execute(rusqlite::params![slug, name, day_str])?;
          }
        }
        tx.commit()?;
        Ok(touched)
      })
      .await?;

    Ok(touched)
  }

  async fn new_observations(&self, day: NaiveDate) -> Result<Vec<ItemObservation>> {
    self
      .query_observations_on("first_seen = ?1 AND last_seen = ?1", day)
      .await
  }

  async fn available_observations(&self, day: NaiveDate) -> Result<Vec<ItemObservation>> {
    self.query_observations_on("last_seen = ?1", day).await
  }

  // ── Subscriptions ─────────────────────────────────────────────────────────

  async fn insert_subscription(&self, input: NewSubscription) -> Result<SubscriptionInsert> {
    let subscription = Subscription {
      subscription_id:   Uuid::new_v4(),
      email:             input.email,
      pattern:           input.pattern,
      locations:         input.locations,
      confirmed:         false,
      confirm_token:     Uuid::new_v4(),
      unsubscribe_token: Uuid::new_v4(),
      created_at:        Utc::now(),
    };

    let id_str      = encode_uuid(subscription.subscription_id);
    let email       = subscription.email.clone();
    let pattern     = subscription.pattern.clone();
    let filter_str  = encode_filter(&subscription.locations)?;
    let confirm_str = encode_uuid(subscription.confirm_token);
    let unsub_str   = encode_uuid(subscription.unsubscribe_token);
    let at_str      = encode_dt(subscription.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO subscriptions (
             subscription_id, email, pattern, locations, confirmed,
             confirm_token, unsubscribe_token, created_at
           ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7)
           ON CONFLICT (email, pattern) DO NOTHING",
          rusqlite::params![id_str, email, pattern, filter_str, confirm_str, unsub_str, at_str],
        )?)
      })
      .await?;

    Ok(if inserted == 0 {
      SubscriptionInsert::Duplicate
    } else {
      SubscriptionInsert::Created(subscription)
    })
  }

  async fn confirm_subscription(&self, confirm_token: Uuid) -> Result<bool> {
    let token_str = encode_uuid(confirm_token);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subscriptions SET confirmed = 1 WHERE confirm_token = ?1",
          rusqlite::params![token_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn list_confirmed_subscriptions(&self) -> Result<Vec<Subscription>> {
    let raws: Vec<RawSubscription> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
           WHERE confirmed = 1 ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map([], RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }

  async fn delete_subscription_by_unsubscribe_token(
    &self,
    unsubscribe_token: Uuid,
  ) -> Result<usize> {
    let token_str = encode_uuid(unsubscribe_token);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subscriptions WHERE unsubscribe_token = ?1",
          rusqlite::params![token_str],
        )?)
      })
      .await?;

    Ok(deleted)
  }

  async fn delete_subscriptions_by_email<'a>(&'a self, emails: &'a [String]) -> Result<usize> {
    let mut addresses: Vec<String> = emails
      .iter()
      .map(|e| e.trim().to_lowercase())
      .filter(|e| !e.is_empty())
      .collect();
    addresses.sort();
    addresses.dedup();

    if addresses.is_empty() {
      return Ok(0);
    }

    let placeholders = (1..=addresses.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!("DELETE FROM subscriptions WHERE lower(email) IN ({placeholders})");

    let deleted = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(addresses.iter()))?))
      .await?;

    Ok(deleted)
  }

  // ── Deliveries ────────────────────────────────────────────────────────────

  async fn list_deliveries(&self, subscription_id: Uuid) -> Result<Vec<Delivery>> {
    let id_str = encode_uuid(subscription_id);

    let raws: Vec<RawDelivery> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subscription_id, location_slug, item_name, delivered_on
           FROM deliveries WHERE subscription_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawDelivery {
              subscription_id: row.get(0)?,
              location_slug:   row.get(1)?,
              item_name:       row.get(2)?,
              delivered_on:    row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDelivery::into_delivery).collect()
  }

  async fn record_deliveries<'a>(&'a self, deliveries: &'a [Delivery]) -> Result<usize> {
    let rows: Vec<(String, String, String, String)> = deliveries
      .iter()
      .map(|d| {
        (
          encode_uuid(d.subscription_id),
          d.location_slug.clone(),
          d.item_name.clone(),
          encode_date(d.delivered_on),
        )
      })
      .collect();

    let recorded = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut recorded = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO deliveries (subscription_id, location_slug, item_name, delivered_on)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (subscription_id, location_slug, item_name) DO NOTHING",
          )?;
          for (id, slug, name, on) in &rows {
            recorded += stmt.execute(rusqlite::params![id, slug, name, on])?;
          }
        }
        tx.commit()?;
        Ok(recorded)
      })
      .await?;

    Ok(recorded)
  }
}
