//! Handlers for `/articles` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/articles` | Public; newest first |
//! | `GET`    | `/articles/:id` | Public; 404 if not found |
//! | `POST`   | `/articles` | Admin; body: [`ArticleBody`]; returns 201 |
//! | `PUT`    | `/articles/:id` | Admin; body: [`ArticleBody`] |
//! | `DELETE` | `/articles/:id` | Admin; 204, or 404 if not found |

use std::cmp::Reverse;

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::Utc;
use impala_core::{
  document::Document,
  media::{MediaStore, Upload},
  record::{Article, ArticleDraft, Author, fields},
  store::{DocumentStore, StoreError as _},
};
use serde::Deserialize;

use crate::{ApiState, Entry, error::ApiError};

// ─── Reads ────────────────────────────────────────────────────────────────────

/// Newest `created_at` first; articles without a parseable date go last,
/// in store order.
pub fn newest_first(docs: &mut [Document]) {
  docs.sort_by_key(|d| Reverse(d.timestamp(fields::ARTICLE_TIMESTAMP)));
}

/// `GET /articles`
pub async fn list<S, M>(
  State(state): State<ApiState<S, M>>,
) -> Result<Json<Vec<Entry>>, ApiError>
where
  S: DocumentStore,
  M: MediaStore,
{
  let mut docs = state
    .store
    .list(Article::COLLECTION)
    .await
    .map_err(ApiError::store)?;
  newest_first(&mut docs);
  Ok(Json(docs.into_iter().map(Entry::from).collect()))
}

/// `GET /articles/:id`
pub async fn get_one<S, M>(
  State(state): State<ApiState<S, M>>,
  Path(id): Path<String>,
) -> Result<Json<Entry>, ApiError>
where
  S: DocumentStore,
  M: MediaStore,
{
  let doc = state
    .store
    .get(Article::COLLECTION, &id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("article {id} not found")))?;
  Ok(Json(Entry::from(doc)))
}

// ─── Writes ───────────────────────────────────────────────────────────────────

/// A file attached to the article form, base64-encoded.
#[derive(Debug, Deserialize)]
pub struct UploadBody {
  pub file_name:  String,
  pub media_type: String,
  /// Standard base64 with padding.
  pub data:       String,
}

/// JSON body accepted by `POST /articles` and `PUT /articles/:id`.
#[derive(Debug, Deserialize)]
pub struct ArticleBody {
  pub title:              String,
  pub body:               String,
  #[serde(default)]
  pub keywords:           String,
  /// A pasted image URL; also the fallback when `upload` fails.
  #[serde(default)]
  pub featured_image_url: Option<String>,
  #[serde(default)]
  pub upload:             Option<UploadBody>,
}

impl ArticleBody {
  fn split(self) -> (ArticleDraft, Option<String>, Option<UploadBody>) {
    let url = self
      .featured_image_url
      .map(|u| u.trim().to_owned())
      .filter(|u| !u.is_empty());
    let draft = ArticleDraft {
      title:          self.title,
      body:           self.body,
      keywords:       self.keywords,
      featured_image: None,
    };
    (draft, url, self.upload)
  }
}

/// Store `upload` if there is one and return the image URL to save.
///
/// A failed upload falls back to `url` when one was given; otherwise the
/// whole save is aborted before anything is written.
async fn resolve_image<M: MediaStore>(
  media: &M,
  url: Option<String>,
  upload: Option<UploadBody>,
) -> Result<Option<String>, ApiError> {
  let Some(upload) = upload else {
    return Ok(url);
  };

  let stored = match B64.decode(upload.data.as_bytes()) {
    Ok(bytes) => media
      .put(Upload {
        file_name:  upload.file_name,
        media_type: upload.media_type,
        bytes,
      })
      .await
      .map_err(|e| e.to_string()),
    Err(e) => Err(format!("invalid base64: {e}")),
  };

  match (stored, url) {
    (Ok(location), _) => Ok(Some(location)),
    (Err(reason), Some(fallback)) => {
      tracing::warn!(%reason, "image upload failed; using provided URL");
      Ok(Some(fallback))
    }
    (Err(reason), None) => Err(ApiError::Upload(reason)),
  }
}

/// `POST /articles`: returns 201 and the stored article.
pub async fn create<S, M>(
  State(state): State<ApiState<S, M>>,
  Extension(author): Extension<Author>,
  Json(body): Json<ArticleBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
  M: MediaStore,
{
  let (mut draft, url, upload) = body.split();
  draft.validate()?;
  draft.featured_image = resolve_image(state.media.as_ref(), url, upload).await?;

  let article = draft.into_article(author, Utc::now())?;
  let fields = article.to_fields().map_err(ApiError::store)?;
  let doc = state
    .store
    .add(Article::COLLECTION, fields)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(id = %doc.id, title = %article.title, "article created");
  Ok((StatusCode::CREATED, Json(Entry::from(doc))))
}

/// `PUT /articles/:id`: edits content; the author snapshot and creation
/// time are left as they were.
pub async fn update<S, M>(
  State(state): State<ApiState<S, M>>,
  Extension(editor): Extension<Author>,
  Path(id): Path<String>,
  Json(body): Json<ArticleBody>,
) -> Result<Json<Entry>, ApiError>
where
  S: DocumentStore,
  M: MediaStore,
{
  let (mut draft, url, upload) = body.split();
  draft.validate()?;

  state
    .store
    .get(Article::COLLECTION, &id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("article {id} not found")))?;

  draft.featured_image = resolve_image(state.media.as_ref(), url, upload).await?;
  let patch = draft.into_patch(Utc::now()).map_err(|e| match e {
    impala_core::Error::Validation(v) => ApiError::Validation(v),
    other => ApiError::store(other),
  })?;

  let doc = state
    .store
    .update(Article::COLLECTION, &id, patch)
    .await
    .map_err(|e| {
      if e.is_not_found() {
        ApiError::NotFound(format!("article {id} not found"))
      } else {
        ApiError::store(e)
      }
    })?;

  tracing::info!(%id, editor = %editor.uid, "article updated");
  Ok(Json(Entry::from(doc)))
}

/// `DELETE /articles/:id`
pub async fn delete_one<S, M>(
  State(state): State<ApiState<S, M>>,
  Extension(editor): Extension<Author>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: DocumentStore,
  M: MediaStore,
{
  let removed = state
    .store
    .delete(Article::COLLECTION, &id)
    .await
    .map_err(ApiError::store)?;

  if !removed {
    return Err(ApiError::NotFound(format!("article {id} not found")));
  }
  tracing::info!(%id, editor = %editor.uid, "article deleted");
  Ok(StatusCode::NO_CONTENT)
}
