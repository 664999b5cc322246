//! The `DocumentStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `impala-store-sqlite`).
//! Higher layers (`impala-api`, `impala-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::document::{Collection, Document, Fields};

/// Errors a [`DocumentStore`] reports.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The addressed document does not exist. Lets callers answer 404 when a
  /// document vanishes between a read and a write.
  fn is_not_found(&self) -> bool;
}

/// Abstraction over a schema-less document store.
///
/// Every write touches exactly one document and is atomic for that document.
/// Nothing spans documents; there are no transactions.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: StoreError;

  /// Persist a new document; the store assigns and returns its id.
  fn add(
    &self,
    collection: Collection,
    data: Fields,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  /// Retrieve one document. Returns `None` if not found.
  fn get<'a>(
    &'a self,
    collection: Collection,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + 'a;

  /// Every document in `collection`, in the store's default enumeration
  /// order. No filtering or pagination.
  fn list(
    &self,
    collection: Collection,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  /// Shallow-merge `patch` into the document's top-level fields and return
  /// the result. Errors if the document does not exist.
  fn update<'a>(
    &'a self,
    collection: Collection,
    id: &'a str,
    patch: Fields,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + 'a;

  /// Replace the document's fields wholesale. Errors if it does not exist.
  fn set<'a>(
    &'a self,
    collection: Collection,
    id: &'a str,
    data: Fields,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + 'a;

  /// Remove a document. Returns `true` if something was deleted.
  fn delete<'a>(
    &'a self,
    collection: Collection,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
