//! Keyed snapshot diffing, independent of any storage technology.
//!
//! Both the location reconciler and the observation ledger express "what
//! changed since last time" as a [`Diff`] over natural keys.

use std::collections::BTreeSet;

/// The result of comparing an old key set against a new one.
///
/// Each list is sorted and free of duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff<K> {
  /// In `new` only.
  pub added:     Vec<K>,
  /// In `old` only.
  pub removed:   Vec<K>,
  /// In both.
  pub unchanged: Vec<K>,
}

impl<K> Diff<K> {
  pub fn is_empty(&self) -> bool { self.added.is_empty() && self.removed.is_empty() }
}

/// Compare two key collections. Duplicate keys on either side are ignored.
pub fn diff<K: Ord + Clone>(
  old: impl IntoIterator<Item = K>,
  new: impl IntoIterator<Item = K>,
) -> Diff<K> {
  let old: BTreeSet<K> = old.into_iter().collect();
  let new: BTreeSet<K> = new.into_iter().collect();

  Diff {
    added:     new.difference(&old).cloned().collect(),
    removed:   old.difference(&new).cloned().collect(),
    unchanged: old.intersection(&new).cloned().collect(),
  }
}
