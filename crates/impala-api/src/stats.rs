//! Handler for `GET /stats`.
//!
//! Each collection is read independently. A read that fails is logged and
//! leaves that collection's counts at zero; the dashboard still renders.

use axum::{Json, extract::State};
use chrono::Utc;
use impala_core::{
  document::{Collection, Document},
  media::MediaStore,
  stats::DashboardStats,
  store::DocumentStore,
};

use crate::ApiState;

async fn read_or_empty<S: DocumentStore>(store: &S, collection: Collection) -> Vec<Document> {
  match store.list(collection).await {
    Ok(docs) => docs,
    Err(e) => {
      tracing::warn!(%collection, error = %e, "stats read failed; counting as empty");
      Vec::new()
    }
  }
}

/// `GET /stats`
pub async fn handler<S, M>(State(state): State<ApiState<S, M>>) -> Json<DashboardStats>
where
  S: DocumentStore,
  M: MediaStore,
{
  let store = state.store.as_ref();
  let contacts = read_or_empty(store, Collection::Contacts).await;
  let subscriptions = read_or_empty(store, Collection::Subscriptions).await;
  let articles = read_or_empty(store, Collection::Articles).await;

  Json(DashboardStats::tally(Utc::now(), &contacts, &subscriptions, &articles))
}
