//! Rendering documents into CSV text.
//!
//! Output is RFC 4180: one header row, one row per document, `\n` line
//! endings, and quoting only where a cell needs it (commas, quotes, line
//! breaks).

use impala_core::document::Document;
use serde_json::Value;

use crate::{Error, Result, schema::{Column, ExportSchema}};

/// Render `docs` against `schema`.
///
/// Row order follows `docs`. The same input always yields the same bytes.
pub fn to_csv(schema: &ExportSchema, docs: &[Document]) -> Result<String> {
  let mut writer = csv::WriterBuilder::new()
    .terminator(csv::Terminator::Any(b'\n'))
    .from_writer(Vec::new());

  writer.write_record(schema.headers())?;
  for doc in docs {
    writer.write_record(schema.columns.iter().map(|col| cell(doc, col)))?;
  }

  let bytes = writer
    .into_inner()
    .map_err(|e| Error::Flush(e.error().to_string()))?;
  Ok(String::from_utf8(bytes)?)
}

/// The text of one cell.
///
/// Missing and `null` fields are empty; strings are written verbatim;
/// numbers and booleans use their JSON spelling; objects and arrays are
/// written as compact JSON.
pub fn cell(doc: &Document, column: &Column) -> String {
  match doc.first_field(column.fields) {
    None => String::new(),
    Some(Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use impala_core::document::Collection;
  use serde_json::json;

  use super::*;
  use crate::schema::{CONTACTS, SUBSCRIPTIONS};

  fn doc(collection: Collection, id: &str, data: Value) -> Document {
    Document {
      id: id.into(),
      collection,
      data: data.as_object().cloned().unwrap(),
    }
  }

  fn contact(id: &str, data: Value) -> Document { doc(Collection::Contacts, id, data) }

  #[test]
  fn single_contact_matches_expected_bytes() {
    let docs = [contact("c1", json!({
      "name": "A",
      "email": "a@x.com",
      "subject": "Hi",
      "message": "Hello, world",
      "created_at": "2024-01-01T00:00:00Z",
    }))];
    assert_eq!(
      to_csv(&CONTACTS, &docs).unwrap(),
      "Name,Email,Subject,Message,Submitted At\n\
       A,a@x.com,Hi,\"Hello, world\",2024-01-01T00:00:00Z\n"
    );
  }

  #[test]
  fn empty_collection_is_header_only() {
    assert_eq!(to_csv(&SUBSCRIPTIONS, &[]).unwrap(), "Email,Subscribed At\n");
  }

  #[test]
  fn one_row_per_document() {
    let docs: Vec<_> = (0..5)
      .map(|i| contact(&i.to_string(), json!({ "name": format!("n{i}") })))
      .collect();
    let text = to_csv(&CONTACTS, &docs).unwrap();
    assert_eq!(text.lines().count(), 1 + docs.len());
  }

  #[test]
  fn missing_fields_become_empty_cells() {
    let docs = [contact("c1", json!({ "email": "a@x.com" }))];
    assert_eq!(
      to_csv(&CONTACTS, &docs).unwrap().lines().nth(1),
      Some(",a@x.com,,,")
    );
  }

  #[test]
  fn free_text_with_quotes_and_newlines_is_escaped() {
    let docs = [contact("c1", json!({
      "name": "B",
      "message": "line one\nshe said \"hi\"",
    }))];
    let text = to_csv(&CONTACTS, &docs).unwrap();
    assert!(text.contains("\"line one\nshe said \"\"hi\"\"\""), "{text}");

    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][3], "line one\nshe said \"hi\"");
  }

  #[test]
  fn legacy_timestamp_fields_fill_the_column() {
    let contacts = [contact("c1", json!({ "name": "A", "timestamp": "2023-05-05" }))];
    assert!(to_csv(&CONTACTS, &contacts).unwrap().ends_with("A,,,,2023-05-05\n"));

    let subs = [
      doc(Collection::Subscriptions, "s1", json!({ "email": "a@x", "subscribedAt": "old" })),
      doc(Collection::Subscriptions, "s2", json!({ "email": "b@x", "subscribed_at": "new" })),
    ];
    assert_eq!(
      to_csv(&SUBSCRIPTIONS, &subs).unwrap(),
      "Email,Subscribed At\na@x,old\nb@x,new\n"
    );
  }

  #[test]
  fn non_string_values_use_json_text() {
    let docs = [contact("c1", json!({
      "name": 42,
      "email": true,
      "subject": { "k": "v" },
      "message": null,
    }))];
    let line = to_csv(&CONTACTS, &docs).unwrap().lines().nth(1).unwrap().to_owned();
    assert_eq!(line, "42,true,\"{\"\"k\"\":\"\"v\"\"}\",,");
  }

  #[test]
  fn rendering_is_deterministic() {
    let docs = [
      contact("c1", json!({ "name": "A", "message": "x, y" })),
      contact("c2", json!({ "name": "B" })),
    ];
    assert_eq!(to_csv(&CONTACTS, &docs).unwrap(), to_csv(&CONTACTS, &docs).unwrap());
  }
}
