//! SQL schema for the customer store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS customers (
    customer_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL,
    active      INTEGER NOT NULL DEFAULT 1,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC, microseconds, fixed width
    updated_at  TEXT
);

-- Phones belong to exactly one customer and go with it.
CREATE TABLE IF NOT EXISTS phones (
    phone_id    TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL REFERENCES customers(customer_id) ON DELETE CASCADE,
    ddd         TEXT NOT NULL,
    number      TEXT NOT NULL,
    kind        TEXT NOT NULL DEFAULT 'landline',   -- 'landline' | 'mobile'
    active      INTEGER NOT NULL DEFAULT 1,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    updated_at  TEXT
);

-- One live customer per email; soft-deleted rows release the address.
CREATE UNIQUE INDEX IF NOT EXISTS customers_email_live_idx
    ON customers(email) WHERE is_deleted = 0;
CREATE INDEX IF NOT EXISTS customers_created_idx ON customers(created_at);
CREATE INDEX IF NOT EXISTS phones_customer_idx   ON phones(customer_id);
CREATE INDEX IF NOT EXISTS phones_number_idx     ON phones(ddd, number);

PRAGMA user_version = 1;
";
