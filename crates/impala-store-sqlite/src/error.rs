//! Error type for `impala-store-sqlite`.

use impala_core::{document::Collection, store::StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] impala_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("document not found: {collection}/{id}")]
  DocumentNotFound { collection: Collection, id: String },

  /// A stored row could not be decoded back into a document.
  #[error("corrupt row {id}: {reason}")]
  CorruptRow { id: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  fn is_not_found(&self) -> bool { matches!(self, Self::DocumentNotFound { .. }) }
}
