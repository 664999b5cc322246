//! One-off data migrations over a [`DocumentStore`].

use serde_json::Value;

use crate::{
  document::{Collection, Fields},
  record::fields::{LEGACY_SUBSCRIBED_AT, SUBSCRIBED_AT},
  store::DocumentStore,
};

/// Move legacy `subscribedAt` values to the canonical `subscribed_at` field.
///
/// A document with only the legacy key gets its value moved; a document with
/// both keeps `subscribed_at` and loses the legacy key. Documents already in
/// canonical form are not written. Returns how many documents were rewritten.
pub async fn migrate_subscription_timestamps<S: DocumentStore>(
  store: &S,
) -> Result<usize, S::Error> {
  let mut rewritten = 0;
  for doc in store.list(Collection::Subscriptions).await? {
    if let Some(data) = canonical_subscription(&doc.data) {
      store.set(Collection::Subscriptions, &doc.id, data).await?;
      rewritten += 1;
    }
  }
  Ok(rewritten)
}

/// The canonical form of a subscription's fields, or `None` if the document
/// is already canonical.
pub fn canonical_subscription(data: &Fields) -> Option<Fields> {
  if !data.contains_key(LEGACY_SUBSCRIBED_AT) {
    return None;
  }
  let mut out = data.clone();
  let legacy = out.remove(LEGACY_SUBSCRIBED_AT).unwrap_or(Value::Null);
  let has_canonical = out.get(SUBSCRIBED_AT).is_some_and(|v| !v.is_null());
  if !has_canonical {
    out.insert(SUBSCRIBED_AT.to_owned(), legacy);
  }
  Some(out)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn fields(v: Value) -> Fields { v.as_object().cloned().unwrap() }

  #[test]
  fn canonical_documents_are_left_alone() {
    let data = fields(json!({ "email": "a@x", "subscribed_at": "2024-01-01" }));
    assert!(canonical_subscription(&data).is_none());
  }

  #[test]
  fn legacy_key_is_renamed() {
    let data = fields(json!({ "email": "a@x", "subscribedAt": "2024-01-01" }));
    let out = canonical_subscription(&data).unwrap();
    assert_eq!(out, fields(json!({ "email": "a@x", "subscribed_at": "2024-01-01" })));
  }

  #[test]
  fn canonical_value_wins_when_both_present() {
    let data = fields(json!({
      "email": "a@x",
      "subscribed_at": "2024-02-02",
      "subscribedAt": "2020-01-01",
    }));
    let out = canonical_subscription(&data).unwrap();
    assert_eq!(out["subscribed_at"], "2024-02-02");
    assert!(!out.contains_key("subscribedAt"));
  }
}
