//! Documents, the loosely-typed unit of storage.
//!
//! A document is a JSON object filed under a named collection. Nothing in the
//! store enforces a schema: whatever fields the writer supplied are what a
//! reader gets back. Typed views live in [`crate::record`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::time::{Timestamp, parse_timestamp_value};

/// The top-level field map of a document.
pub type Fields = Map<String, Value>;

// ─── Collection ──────────────────────────────────────────────────────────────

/// The named buckets the site writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
  Contacts,
  Subscriptions,
  Articles,
}

impl Collection {
  pub const ALL: [Collection; 3] =
    [Collection::Contacts, Collection::Subscriptions, Collection::Articles];

  /// The collection name as stored.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Contacts => "contacts",
      Self::Subscriptions => "subscriptions",
      Self::Articles => "articles",
    }
  }

  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|c| c.as_str() == name)
  }
}

impl fmt::Display for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// A stored document. `id` is assigned by the store, never by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  pub id:         String,
  pub collection: Collection,
  pub data:       Fields,
}

impl Document {
  /// Raw field value, if present and not `null`.
  pub fn field(&self, name: &str) -> Option<&Value> {
    self.data.get(name).filter(|v| !v.is_null())
  }

  /// Field value as a string slice, if it is a JSON string.
  pub fn str_field(&self, name: &str) -> Option<&str> {
    self.field(name).and_then(Value::as_str)
  }

  /// The first of `names` that is present, in order.
  ///
  /// Used where historical writers disagreed on a field name.
  pub fn first_field(&self, names: &[&str]) -> Option<&Value> {
    names.iter().find_map(|n| self.field(n))
  }

  /// Parse the first present field of `names` as a timestamp.
  ///
  /// Returns `None` when every candidate is missing or unparseable; an
  /// unparseable first candidate does not fall through to the next.
  pub fn timestamp(&self, names: &[&str]) -> Option<Timestamp> {
    self.first_field(names).and_then(parse_timestamp_value)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn doc(data: Value) -> Document {
    Document {
      id:         "d1".into(),
      collection: Collection::Subscriptions,
      data:       data.as_object().cloned().unwrap(),
    }
  }

  #[test]
  fn collection_names_roundtrip() {
    for c in Collection::ALL {
      assert_eq!(Collection::from_name(c.as_str()), Some(c));
    }
    assert_eq!(Collection::from_name("users"), None);
  }

  #[test]
  fn null_fields_read_as_missing() {
    let d = doc(json!({ "email": null, "subscribedAt": "2024-01-01" }));
    assert!(d.field("email").is_none());
    assert_eq!(
      d.first_field(&["subscribed_at", "subscribedAt"]),
      Some(&json!("2024-01-01"))
    );
  }

  #[test]
  fn timestamp_prefers_first_present_name() {
    let d = doc(json!({
      "subscribed_at": "2024-02-01T00:00:00Z",
      "subscribedAt":  "2020-01-01T00:00:00Z",
    }));
    let ts = d.timestamp(&["subscribed_at", "subscribedAt"]).unwrap();
    assert_eq!(ts.to_rfc3339(), "2024-02-01T00:00:00+00:00");
  }
}
