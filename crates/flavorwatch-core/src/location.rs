//! Locations: the retail shops whose pages are scraped.
//!
//! Locations are never deleted. A shop that disappears from the directory page
//! is soft-deactivated so that its observation history survives.

use serde::{Deserialize, Serialize};

/// A persisted location row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
  /// Unique key, e.g. `south-boulder`.
  pub slug:    String,
  pub name:    String,
  /// Identity used when diffing against a fresh discovery run.
  pub url:     String,
  pub address: Option<String>,
  pub active:  bool,
}

/// A location candidate extracted from the directory page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredLocation {
  pub slug: String,
  pub url:  String,
  pub name: String,
}

impl DiscoveredLocation {
  /// Promote a discovered record into a new, active [`Location`].
  pub fn into_location(self) -> Location {
    Location {
      slug:    self.slug,
      name:    self.name,
      url:     self.url,
      address: None,
      active:  true,
    }
  }
}
