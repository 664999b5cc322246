//! JSON REST API for the Impala site.
//!
//! Exposes two axum [`Router`]s backed by any [`DocumentStore`] and
//! [`MediaStore`]: a public one for the site's forms and article pages, and
//! an admin one for article management and dashboard stats.
//!
//! Auth, TLS, and transport concerns are the caller's responsibility. Admin
//! handlers read the signed-in [`Author`](impala_core::record::Author) from
//! request extensions, so the caller must layer authentication over
//! [`admin_router`] that inserts it.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", impala_api::public_router(state.clone()))
//! .nest("/api/admin", impala_api::admin_router(state).layer(auth_layer))
//! ```

pub mod articles;
pub mod error;
pub mod forms;
pub mod stats;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use impala_core::{
  document::{Document, Fields},
  media::MediaStore,
  store::DocumentStore,
};
use serde::{Deserialize, Serialize};

pub use error::ApiError;

/// Shared handler state.
pub struct ApiState<S, M> {
  pub store: Arc<S>,
  pub media: Arc<M>,
}

impl<S, M> ApiState<S, M> {
  pub fn new(store: Arc<S>, media: Arc<M>) -> Self { Self { store, media } }
}

impl<S, M> Clone for ApiState<S, M> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), media: self.media.clone() }
  }
}

/// A document as returned over the wire: its id alongside its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
  pub id:   String,
  #[serde(flatten)]
  pub data: Fields,
}

impl From<Document> for Entry {
  fn from(doc: Document) -> Self { Self { id: doc.id, data: doc.data } }
}

/// Routes reachable without signing in.
pub fn public_router<S, M>(state: ApiState<S, M>) -> Router<()>
where
  S: DocumentStore + 'static,
  M: MediaStore + 'static,
{
  Router::new()
    .route("/contacts", post(forms::submit_contact::<S, M>))
    .route("/subscriptions", post(forms::subscribe::<S, M>))
    .route("/articles", get(articles::list::<S, M>))
    .route("/articles/{id}", get(articles::get_one::<S, M>))
    .with_state(state)
}

/// Routes for the signed-in admin.
pub fn admin_router<S, M>(state: ApiState<S, M>) -> Router<()>
where
  S: DocumentStore + 'static,
  M: MediaStore + 'static,
{
  Router::new()
    .route("/articles", post(articles::create::<S, M>))
    .route(
      "/articles/{id}",
      axum::routing::put(articles::update::<S, M>).delete(articles::delete_one::<S, M>),
    )
    .route("/stats", get(stats::handler::<S, M>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
