//! Applies a [`ReconcilePlan`] to the store under a [`ReconcilePolicy`].

use flavorwatch_core::{
  location::DiscoveredLocation,
  reconcile::{ReconcilePolicy, plan},
  store::FlavorStore,
};
use tracing::{info, warn};

use crate::{Error, Result};

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
  pub added:             Vec<String>,
  pub removed:           Vec<String>,
  pub reactivated:       Vec<String>,
  /// Number of additions withheld because the category exceeded its limit.
  pub skipped_additions: usize,
  pub skipped_removals:  usize,
  /// Slugs whose individual store write failed.
  pub failed:            Vec<String>,
}

/// Reconcile the persisted directory with `discovered`.
///
/// The plan is computed once from a single read of the store. Only the initial
/// read can fail the whole pass; individual writes are logged and collected
/// in [`ReconcileReport::failed`].
pub async fn reconcile<S: FlavorStore>(
  store: &S,
  discovered: &[DiscoveredLocation],
  policy: &ReconcilePolicy,
) -> Result<ReconcileReport> {
  let persisted = store.list_locations().await.map_err(Error::store)?;
  let plan = plan(discovered, &persisted);
  let mut report = ReconcileReport::default();

  for location in &plan.reactivations {
    match store.set_location_active(&location.slug, true).await {
      Ok(_) => {
        info!(location = %location.slug, "location reactivated");
        report.reactivated.push(location.slug.clone());
      }
      Err(e) => {
        warn!(location = %location.slug, error = %e, "failed to reactivate location");
        report.failed.push(location.slug.clone());
      }
    }
  }

  if plan.additions_allowed(policy) {
    for found in &plan.additions {
      match store.insert_location(found.clone().into_location()).await {
        Ok(()) => {
          info!(location = %found.slug, url = %found.url, "new location detected");
          report.added.push(found.slug.clone());
        }
        Err(e) => {
          warn!(location = %found.slug, error = %e, "failed to insert location");
          report.failed.push(found.slug.clone());
        }
      }
    }
  } else {
    warn!(
      count = plan.additions.len(),
      limit = policy.max_additions,
      "too many new locations at once, skipping additions"
    );
    report.skipped_additions = plan.additions.len();
  }

  if plan.removals_allowed(policy) {
    for location in &plan.removals {
      match store.set_location_active(&location.slug, false).await {
        Ok(_) => {
          warn!(location = %location.slug, url = %location.url, "location no longer listed, deactivated");
          report.removed.push(location.slug.clone());
        }
        Err(e) => {
          warn!(location = %location.slug, error = %e, "failed to deactivate location");
          report.failed.push(location.slug.clone());
        }
      }
    }
  } else {
    warn!(
      count = plan.removals.len(),
      limit = policy.max_removals,
      "too many locations vanished at once, skipping removals"
    );
    report.skipped_removals = plan.removals.len();
  }

  Ok(report)
}
