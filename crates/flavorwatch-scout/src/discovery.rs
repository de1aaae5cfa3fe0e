//! Location discovery from the site's directory page.

use std::{collections::HashSet, sync::LazyLock};

use flavorwatch_core::{
  fetch::{FetchError, Fetcher, fetch_page},
  location::DiscoveredLocation,
};
use regex::Regex;
use scraper::{Html, Selector};

/// Single-segment paths that appear in the site navigation but are not
/// location pages.
pub const NON_LOCATION_SLUGS: &[&str] = &[
  "about", "catering", "contact", "careers", "merch", "gift-cards", "gift-card",
  "blog", "press", "wholesale", "events", "jobs", "menu", "order", "delivery",
  "franchise", "privacy", "terms", "faq", "newsletter", "rewards", "loyalty",
  "store", "shop", "cart", "checkout", "account", "login", "signup", "search",
  "tag", "category", "locations", "home",
];

static LOCATION_PATH: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^/([a-z][a-z0-9-]+)/?$").expect("location path pattern is a valid regex")
});

/// Fetch the directory page at `site_url` and extract its locations.
pub async fn discover<F: Fetcher>(
  fetcher: &F,
  site_url: &str,
) -> Result<Vec<DiscoveredLocation>, FetchError> {
  let html = fetch_page(fetcher, site_url).await?;
  Ok(parse_locations(&html, site_url))
}

/// Extract location links from directory HTML, deduplicated by url in
/// document order.
pub fn parse_locations(html: &str, site_url: &str) -> Vec<DiscoveredLocation> {
  let site = site_url.trim_end_matches('/');
  let document = Html::parse_document(html);
  let anchor = Selector::parse("a[href]").expect("anchor selector is valid");

  let mut seen = HashSet::new();
  let mut out = Vec::new();

  for element in document.select(&anchor) {
    let Some(href) = element.value().attr("href") else {
      continue;
    };
    let Some(slug) = LOCATION_PATH.captures(href.trim()).map(|c| c[1].to_owned()) else {
      continue;
    };
    if NON_LOCATION_SLUGS.contains(&slug.as_str()) {
      continue;
    }

    let url = format!("{site}/{slug}/");
    if seen.insert(url.clone()) {
      out.push(DiscoveredLocation { name: slug_to_name(&slug), slug, url });
    }
  }

  out
}

/// `"north-boulder"` → `"North Boulder"`.
pub fn slug_to_name(slug: &str) -> String {
  slug
    .split('-')
    .map(|word| {
      let mut chars = word.chars();
      match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
      }
    })
    .collect::<Vec<String>>()
    .join(" ")
}
