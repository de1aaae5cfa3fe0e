//! Flavor-name normalization and noise filtering.
//!
//! The location pages mix flavor headings with navigation headings inside the
//! same markup tag, so [`is_valid`] is the only thing separating signal from
//! noise. [`normalize`] produces the key that subscriptions are matched on.

use std::sync::LazyLock;

use regex::RegexSet;

/// Spelling variants collapsed after punctuation is stripped.
///
/// Every rewrite shortens the string, so applying them until nothing changes
/// terminates, and the result is a fixed point of [`normalize`].
///
/// Word boundaries are gone by the time the rewrites run, so a variant that
/// ends in `s` also swallows an `s` starting the next word: "Big G's
/// Strawberry" keys as `biggtrawberry` and "Dreams Sherbet" as `dreamherbet`.
/// A pattern for "strawberry" therefore misses that item; idempotency is kept
/// at that cost.
const VARIANTS: &[(&str, &str)] = &[
  ("biggs", "bigg"),
  ("gigantics", "gigantic"),
  ("cookies", "cookie"),
  ("dreams", "dream"),
];

static EXCLUSIONS: LazyLock<RegexSet> = LazyLock::new(|| {
  RegexSet::new([
    r"^#",
    r"(?i)sweetcow",
    r"(?i)today['\u{2018}\u{2019}]?s?\s+flavor",
    r"(?i)direction",
  ])
  .expect("exclusion patterns are valid regexes")
});

/// Canonicalize a raw flavor name into a comparable key.
///
/// Lowercases, drops every character that is not an ASCII letter or digit,
/// then collapses the known spelling variants. Idempotent, and never reorders
/// the characters it keeps.
pub fn normalize(raw: &str) -> String {
  let mut key: String = raw
    .chars()
    .flat_map(char::to_lowercase)
    .filter(char::is_ascii_alphanumeric)
    .collect();

  loop {
    let mut changed = false;
    for (from, to) in VARIANTS {
      if key.contains(from) {
        key = key.replace(from, to);
        changed = true;
      }
    }
    if !changed {
      return key;
    }
  }
}

/// Returns `true` if `raw` looks like a flavor name rather than page noise.
pub fn is_valid(raw: &str) -> bool {
  let text = raw.trim();
  if text.chars().count() <= 3 {
    return false;
  }
  !EXCLUSIONS.is_match(text)
}
