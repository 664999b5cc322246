//! [`SqliteStore`]: the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use chrono::Utc;
use impala_core::{
  document::{Collection, Document, Fields},
  store::DocumentStore,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{
    RawDocument, decode_fields, encode_collection, encode_dt, encode_fields,
    merge_fields, new_doc_id,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Impala document store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// How an existing document's stored body is rewritten.
enum Rewrite {
  Merge(Fields),
  Replace(Fields),
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Read, rewrite and store one document inside a single transaction.
  async fn rewrite(
    &self,
    collection: Collection,
    id: &str,
    rewrite: Rewrite,
  ) -> Result<Document> {
    let id_str   = id.to_owned();
    let coll_str = encode_collection(collection);
    let at_str   = encode_dt(Utc::now());

    let stored: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current: Option<String> = tx
          .query_row(
            "SELECT data_json FROM documents WHERE doc_id = ?1 AND collection = ?2",
            rusqlite::params![id_str, coll_str],
            |row| row.get(0),
          )
          .optional()?;

        let Some(current) = current else {
          return Ok(None);
        };

        let next = match rewrite {
          Rewrite::Replace(data) => data,
          Rewrite::Merge(patch) => {
            let mut base = decode_fields(&id_str, &current)
              .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
            merge_fields(&mut base, patch);
            base
          }
        };
        let next_json = encode_fields(&next)
          .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;

        tx.execute(
          "UPDATE documents SET data_json = ?1, written_at = ?2 WHERE doc_id = ?3",
          rusqlite::params![next_json, at_str, id_str],
        )?;
        tx.commit()?;
        Ok(Some(next_json))
      })
      .await?;

    let stored = stored.ok_or_else(|| Error::DocumentNotFound {
      collection,
      id: id.to_owned(),
    })?;

    Ok(Document {
      id: id.to_owned(),
      collection,
      data: decode_fields(id, &stored)?,
    })
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn add(&self, collection: Collection, data: Fields) -> Result<Document> {
    let doc = Document { id: new_doc_id(), collection, data };

    let id_str    = doc.id.clone();
    let coll_str  = encode_collection(collection);
    let data_json = encode_fields(&doc.data)?;
    let at_str    = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (doc_id, collection, data_json, written_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, coll_str, data_json, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(doc)
  }

  async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
    let id_str   = id.to_owned();
    let coll_str = encode_collection(collection);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT doc_id, collection, data_json FROM documents
             WHERE doc_id = ?1 AND collection = ?2",
            rusqlite::params![id_str, coll_str],
            RawDocument::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
    let coll_str = encode_collection(collection);

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT doc_id, collection, data_json FROM documents
           WHERE collection = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![coll_str], RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  async fn update(
    &self,
    collection: Collection,
    id: &str,
    patch: Fields,
  ) -> Result<Document> {
    self.rewrite(collection, id, Rewrite::Merge(patch)).await
  }

  async fn set(&self, collection: Collection, id: &str, data: Fields) -> Result<Document> {
    self.rewrite(collection, id, Rewrite::Replace(data)).await
  }

  async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
    let id_str   = id.to_owned();
    let coll_str = encode_collection(collection);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM documents WHERE doc_id = ?1 AND collection = ?2",
          rusqlite::params![id_str, coll_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }
}
