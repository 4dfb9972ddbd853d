//! SQL schema for the tracked-identity store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS tracked_identities (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,  -- never reused
    chat_id       TEXT    NOT NULL,
    external_id   INTEGER NOT NULL,
    natural_key   TEXT    NOT NULL,
    display_name  TEXT    NOT NULL,
    alias         TEXT,
    last_entry_at TEXT,                -- RFC 3339 UTC, full precision
    last_exit_at  TEXT,                -- RFC 3339 UTC, full precision
    created_at    TEXT    NOT NULL,
    updated_at    TEXT    NOT NULL,
    UNIQUE (chat_id, natural_key)
);

CREATE INDEX IF NOT EXISTS tracked_external_idx ON tracked_identities(external_id);
CREATE INDEX IF NOT EXISTS tracked_chat_idx     ON tracked_identities(chat_id);

PRAGMA user_version = 1;
";
