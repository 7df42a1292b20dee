//! SQL schema for the corner SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Product -> GEP denomination. Keyed by the trimmed product name.
CREATE TABLE IF NOT EXISTS catalog (
    product     TEXT PRIMARY KEY,
    category    TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Append-only temperature log. Rows are never deleted; the reception
-- columns are filled by a single UPDATE guarded on received_at IS NULL.
CREATE TABLE IF NOT EXISTS deliveries (
    delivery_id            TEXT PRIMARY KEY,
    product                TEXT NOT NULL,
    departure_temperature  TEXT NOT NULL,   -- operator text, verbatim
    departure_at           TEXT NOT NULL,   -- RFC 3339 UTC; server-assigned
    category               TEXT,
    reception_temperature  TEXT,
    reception_verdict      TEXT,            -- 'accepted' | 'rejected' | ''
    photo_ref              TEXT,
    received_at            TEXT
);

CREATE TABLE IF NOT EXISTS showcase_items (
    item_id          TEXT PRIMARY KEY,
    product          TEXT NOT NULL,
    production_date  TEXT NOT NULL,   -- YYYY-MM-DD
    expiry_date      TEXT NOT NULL,
    added_on         TEXT NOT NULL,
    lot_id           TEXT NOT NULL,
    removed_on       TEXT
);

-- At most one active item per (product, production date).
CREATE UNIQUE INDEX IF NOT EXISTS showcase_active_uniq
    ON showcase_items(product, production_date)
    WHERE removed_on IS NULL;

CREATE TABLE IF NOT EXISTS supply_requests (
    request_id    TEXT PRIMARY KEY,
    submitted_at  TEXT NOT NULL,
    wanted_on     TEXT NOT NULL,
    product       TEXT NOT NULL,
    quantity      INTEGER NOT NULL CHECK (quantity >= 1),
    comment       TEXT,
    kind          TEXT NOT NULL,   -- 'food' | 'supplies'
    status        TEXT NOT NULL,   -- 'pending' | 'in_production' | 'ready' | 'out_for_delivery'
    lot_id        TEXT
);

CREATE INDEX IF NOT EXISTS deliveries_departure_idx ON deliveries(departure_at);
CREATE INDEX IF NOT EXISTS showcase_expiry_idx      ON showcase_items(expiry_date);
CREATE INDEX IF NOT EXISTS requests_wanted_idx      ON supply_requests(wanted_on);

PRAGMA user_version = 1;
";
