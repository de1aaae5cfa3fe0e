//! SQL schema for the flavorwatch SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Locations are never deleted, only deactivated.
CREATE TABLE IF NOT EXISTS locations (
    slug     TEXT PRIMARY KEY,
    name     TEXT NOT NULL,
    url      TEXT NOT NULL UNIQUE,
    address  TEXT,
    active   INTEGER NOT NULL DEFAULT 1
);

-- Presence history. location_slug is a soft reference: history outlives a
-- deactivated location. Dates are YYYY-MM-DD so text order is date order.
CREATE TABLE IF NOT EXISTS observations (
    location_slug TEXT NOT NULL,
    item_name     TEXT NOT NULL,
    first_seen    TEXT NOT NULL,
    last_seen     TEXT NOT NULL,
    PRIMARY KEY (location_slug, item_name),
    CHECK (first_seen <= last_seen)
);

CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id   TEXT PRIMARY KEY,
    email             TEXT NOT NULL,
    pattern           TEXT NOT NULL,
    locations         TEXT NOT NULL DEFAULT '{\"kind\":\"all\"}',
    confirmed         INTEGER NOT NULL DEFAULT 0,
    confirm_token     TEXT NOT NULL UNIQUE,
    unsubscribe_token TEXT NOT NULL UNIQUE,
    created_at        TEXT NOT NULL,
    UNIQUE (email, pattern)
);

-- What each subscriber has already been told about.
CREATE TABLE IF NOT EXISTS deliveries (
    subscription_id TEXT NOT NULL REFERENCES subscriptions(subscription_id) ON DELETE CASCADE,
    location_slug   TEXT NOT NULL,
    item_name       TEXT NOT NULL,
    delivered_on    TEXT NOT NULL,
    PRIMARY KEY (subscription_id, location_slug, item_name)
);

CREATE INDEX IF NOT EXISTS observations_first_seen_idx ON observations(first_seen);
CREATE INDEX IF NOT EXISTS observations_last_seen_idx  ON observations(last_seen);
CREATE INDEX IF NOT EXISTS subscriptions_email_idx     ON subscriptions(email);

PRAGMA user_version = 1;
";
