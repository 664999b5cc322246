//! Handlers for the public site's forms.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/contacts` | Body: [`NewContact`]; returns 201 + stored document |
//! | `POST` | `/subscriptions` | Body: [`NewSubscription`]; returns 201 + stored document |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use impala_core::{
  media::MediaStore,
  record::{Contact, NewContact, NewSubscription, Subscription},
  store::DocumentStore,
};

use crate::{ApiState, Entry, error::ApiError};

/// `POST /contacts`
pub async fn submit_contact<S, M>(
  State(state): State<ApiState<S, M>>,
  Json(body): Json<NewContact>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
  M: MediaStore,
{
  let contact = body.into_contact(Utc::now())?;
  let fields = contact.to_fields().map_err(ApiError::store)?;
  let doc = state
    .store
    .add(Contact::COLLECTION, fields)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(id = %doc.id, "contact form submitted");
  Ok((StatusCode::CREATED, Json(Entry::from(doc))))
}

/// `POST /subscriptions`
pub async fn subscribe<S, M>(
  State(state): State<ApiState<S, M>>,
  Json(body): Json<NewSubscription>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
  M: MediaStore,
{
  let subscription = body.into_subscription(Utc::now())?;
  let fields = subscription.to_fields().map_err(ApiError::store)?;
  let doc = state
    .store
    .add(Subscription::COLLECTION, fields)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(id = %doc.id, "newsletter subscription added");
  Ok((StatusCode::CREATED, Json(Entry::from(doc))))
}
