//! SQL schema for the Impala SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per document. `data_json` is whatever object the writer supplied;
-- the store imposes no schema on it. Listing order is `rowid` order, i.e.
-- insertion order.
CREATE TABLE IF NOT EXISTS documents (
    doc_id      TEXT PRIMARY KEY,
    collection  TEXT NOT NULL,     -- 'contacts' | 'subscriptions' | 'articles'
    data_json   TEXT NOT NULL,     -- JSON object
    written_at  TEXT NOT NULL      -- RFC 3339 UTC; last write
);

CREATE INDEX IF NOT EXISTS documents_collection_idx ON documents(collection);

PRAGMA user_version = 1;
";
