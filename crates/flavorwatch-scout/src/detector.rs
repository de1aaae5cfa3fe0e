//! New-item detection.

use chrono::NaiveDate;
use flavorwatch_core::{observation::ItemObservation, store::FlavorStore};

use crate::{Error, Result};

/// Items whose first sighting is `today` and that are still present today.
///
/// An item that disappeared and came back keeps its original `first_seen`, so
/// it is not reported again.
pub async fn new_items<S: FlavorStore>(store: &S, today: NaiveDate) -> Result<Vec<ItemObservation>> {
  store.new_observations(today).await.map_err(Error::store)
}
