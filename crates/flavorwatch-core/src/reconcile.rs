//! Location reconciliation planning.
//!
//! A [`ReconcilePlan`] is computed once from a single snapshot of discovered
//! and persisted locations. Applying it is the caller's job; the
//! [`ReconcilePolicy`] decides which categories may be applied at all.

use std::collections::HashMap;

use serde::Deserialize;

use crate::{
  diff::diff,
  location::{DiscoveredLocation, Location},
};

/// Blast-radius limits for a single reconciliation pass.
///
/// More than one simultaneous addition or removal is far more likely to be a
/// scraping failure than real-world churn, so a category over its limit is
/// skipped wholesale for the run. Reactivations are never limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReconcilePolicy {
  pub max_additions: usize,
  pub max_removals:  usize,
}

impl Default for ReconcilePolicy {
  fn default() -> Self { Self { max_additions: 1, max_removals: 1 } }
}

/// Three disjoint changes keyed by location `url`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
  /// Discovered, never persisted.
  pub additions:     Vec<DiscoveredLocation>,
  /// Persisted and active, no longer discovered.
  pub removals:      Vec<Location>,
  /// Persisted but inactive, discovered again.
  pub reactivations: Vec<Location>,
}

impl ReconcilePlan {
  pub fn additions_allowed(&self, policy: &ReconcilePolicy) -> bool {
    self.additions.len() <= policy.max_additions
  }

  pub fn removals_allowed(&self, policy: &ReconcilePolicy) -> bool {
    self.removals.len() <= policy.max_removals
  }

  pub fn is_empty(&self) -> bool {
    self.additions.is_empty() && self.removals.is_empty() && self.reactivations.is_empty()
  }
}

/// Diff `discovered` against every persisted location, active or not.
pub fn plan(discovered: &[DiscoveredLocation], persisted: &[Location]) -> ReconcilePlan {
  let discovered_by_url: HashMap<&str, &DiscoveredLocation> =
    discovered.iter().map(|d| (d.url.as_str(), d)).collect();
  let persisted_by_url: HashMap<&str, &Location> =
    persisted.iter().map(|l| (l.url.as_str(), l)).collect();

  let d = diff(
    persisted_by_url.keys().copied(),
    discovered_by_url.keys().copied(),
  );

  ReconcilePlan {
    additions:     d
      .added
      .iter()
      .map(|url| discovered_by_url[url].clone())
      .collect(),
    removals:      d
      .removed
      .iter()
      .map(|url| persisted_by_url[url])
      .filter(|l| l.active)
      .cloned()
      .collect(),
    reactivations: d
      .unchanged
      .iter()
      .map(|url| persisted_by_url[url])
      .filter(|l| !l.active)
      .cloned()
      .collect(),
  }
}
