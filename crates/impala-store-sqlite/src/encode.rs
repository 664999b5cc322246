//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, document bodies as compact JSON
//! objects, ids as hyphenated lowercase UUID strings.

use chrono::{DateTime, Utc};
use impala_core::document::{Collection, Document, Fields};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Ids ─────────────────────────────────────────────────────────────────────

pub fn new_doc_id() -> String { Uuid::new_v4().hyphenated().to_string() }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

// ─── Collection ──────────────────────────────────────────────────────────────

pub fn encode_collection(c: Collection) -> &'static str { c.as_str() }

pub fn decode_collection(id: &str, s: &str) -> Result<Collection> {
  Collection::from_name(s).ok_or_else(|| Error::CorruptRow {
    id:     id.to_owned(),
    reason: format!("unknown collection: {s:?}"),
  })
}

// ─── Fields ──────────────────────────────────────────────────────────────────

pub fn encode_fields(data: &Fields) -> Result<String> {
  Ok(serde_json::to_string(data)?)
}

pub fn decode_fields(id: &str, s: &str) -> Result<Fields> {
  match serde_json::from_str(s)? {
    Value::Object(map) => Ok(map),
    other => Err(Error::CorruptRow {
      id:     id.to_owned(),
      reason: format!("document body is not an object: {other}"),
    }),
  }
}

/// Shallow merge: every top-level key in `patch` replaces the key in `base`.
pub fn merge_fields(base: &mut Fields, patch: Fields) {
  for (k, v) in patch {
    base.insert(k, v);
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub doc_id:     String,
  pub collection: String,
  pub data_json:  String,
}

impl RawDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      doc_id:     row.get(0)?,
      collection: row.get(1)?,
      data_json:  row.get(2)?,
    })
  }

  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      collection: decode_collection(&self.doc_id, &self.collection)?,
      data:       decode_fields(&self.doc_id, &self.data_json)?,
      id:         self.doc_id,
    })
  }
}
