//! The item observation ledger.
//!
//! Each run scrapes every active location and folds today's item set into the
//! persisted presence history:
//!
//! - items never seen at the location get a first sighting dated today;
//! - items already known have `last_seen` moved forward to today;
//! - items missing today are left alone, so their history survives.

use std::collections::HashSet;

use chrono::NaiveDate;
use flavorwatch_core::{
  diff::diff,
  fetch::{Fetcher, fetch_page},
  location::Location,
  normalize::is_valid,
  observation::ItemObservation,
  store::FlavorStore,
};
use futures::{StreamExt as _, stream};
use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::{Error, ParseError, Result};

/// Result of refreshing one location.
#[derive(Debug)]
pub enum LocationOutcome {
  Refreshed { slug: String, summary: UpsertSummary },
  Failed { slug: String, error: Error },
}

impl LocationOutcome {
  pub fn slug(&self) -> &str {
    match self {
      Self::Refreshed { slug, .. } | Self::Failed { slug, .. } => slug,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
  /// First sightings inserted.
  pub added:      usize,
  /// Known items whose `last_seen` moved to today.
  pub seen_again: usize,
}

/// Every valid `h3` heading in `html`, whitespace-collapsed, first occurrence
/// kept.
pub fn extract_items(html: &str) -> Vec<String> {
  let document = Html::parse_document(html);
  let heading = Selector::parse("h3").expect("h3 selector is valid");

  let mut seen = HashSet::new();
  document
    .select(&heading)
    .map(|el| el.text().collect::<String>())
    .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
    .filter(|text| is_valid(text))
    .filter(|text| seen.insert(text.clone()))
    .collect()
}

/// Fetch a location page and extract its items. A page with no items is a
/// [`ParseError::NoItems`]; it almost always means the markup changed.
pub async fn scrape_location<F: Fetcher>(fetcher: &F, location: &Location) -> Result<Vec<String>> {
  let html = fetch_page(fetcher, &location.url).await?;
  let items = extract_items(&html);
  if items.is_empty() {
    return Err(ParseError::NoItems { url: location.url.clone() }.into());
  }
  Ok(items)
}

/// Fold today's item set for one location into the store.
pub async fn upsert_items<S: FlavorStore>(
  store: &S,
  location_slug: &str,
  items: &[String],
  today: NaiveDate,
) -> Result<UpsertSummary> {
  let known = store
    .list_observations(location_slug)
    .await
    .map_err(Error::store)?;

  let d = diff(
    known.iter().map(|o| o.item_name.clone()),
    items.iter().cloned(),
  );

  let sightings: Vec<ItemObservation> = d
    .added
    .iter()
    .map(|name| ItemObservation::first_sighting(location_slug, name, today))
    .collect();

  let added = if sightings.is_empty() {
    0
  } else {
    store
      .insert_observations(&sightings)
      .await
      .map_err(Error::store)?
  };

  let seen_again = if d.unchanged.is_empty() {
    0
  } else {
    store
      .touch_observations(location_slug, &d.unchanged, today)
      .await
      .map_err(Error::store)?
  };

  Ok(UpsertSummary { added, seen_again })
}

async fn refresh_location<S: FlavorStore, F: Fetcher>(
  store: &S,
  fetcher: &F,
  location: &Location,
  today: NaiveDate,
) -> LocationOutcome {
  let result = async {
    let items = scrape_location(fetcher, location).await?;
    upsert_items(store, &location.slug, &items, today).await
  }
  .await;

  match result {
    Ok(summary) => {
      info!(
        location = %location.slug,
        added = summary.added,
        seen_again = summary.seen_again,
        "ledger updated"
      );
      LocationOutcome::Refreshed { slug: location.slug.clone(), summary }
    }
    Err(error) => {
      warn!(location = %location.slug, error = %error, "failed to refresh location");
      LocationOutcome::Failed { slug: location.slug.clone(), error }
    }
  }
}

/// Refresh every location with at most `concurrency` in flight. One outcome
/// per location, in completion order.
pub async fn refresh_locations<S: FlavorStore, F: Fetcher>(
  store: &S,
  fetcher: &F,
  locations: &[Location],
  today: NaiveDate,
  concurrency: usize,
) -> Vec<LocationOutcome> {
  stream::iter(
    locations
      .iter()
      .map(|location| refresh_location(store, fetcher, location, today)),
  )
  .buffer_unordered(concurrency.max(1))
  .collect()
  .await
}
