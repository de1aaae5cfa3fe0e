//! `GET /flavors`: what every active location is serving today.

use std::collections::HashMap;

use axum::{
  Json,
  extract::State,
  http::header,
  response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use flavorwatch_core::{mail::Mailer, store::FlavorStore};
use serde::Serialize;

use crate::{ApiState, error::ApiError};

const CACHE_CONTROL: &str = "s-maxage=3600, stale-while-revalidate=600";

#[derive(Debug, Serialize)]
pub struct LocationFlavors {
  pub slug:    String,
  pub name:    String,
  pub url:     String,
  pub address: Option<String>,
  pub flavors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FlavorsResponse {
  pub date:      NaiveDate,
  pub locations: Vec<LocationFlavors>,
}

/// `GET /flavors`
pub async fn list<S, M>(
  State(state): State<ApiState<S, M>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FlavorStore,
  M: Mailer,
{
  let today = Utc::now().date_naive();
  let body = availability(&*state.store, today).await?;
  Ok(([(header::CACHE_CONTROL, CACHE_CONTROL)], Json(body)))
}

/// Active locations, each with the items whose `last_seen` is `day`.
pub async fn availability<S: FlavorStore>(
  store: &S,
  day: NaiveDate,
) -> Result<FlavorsResponse, ApiError> {
  let locations = store.list_active_locations().await.map_err(ApiError::store)?;
  let available = store
    .available_observations(day)
    .await
    .map_err(ApiError::store)?;

  let mut by_slug: HashMap<String, Vec<String>> = HashMap::new();
  for observation in available {
    by_slug
      .entry(observation.location_slug)
      .or_default()
      .push(observation.item_name);
  }

  let locations = locations
    .into_iter()
    .map(|l| LocationFlavors {
      flavors: by_slug.remove(&l.slug).unwrap_or_default(),
      slug:    l.slug,
      name:    l.name,
      url:     l.url,
      address: l.address,
    })
    .collect();

  Ok(FlavorsResponse { date: day, locations })
}
