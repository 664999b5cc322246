//! Router-level tests against an in-memory `SqliteStore`.

use std::{
  convert::Infallible,
  sync::{Arc, Mutex},
};

use axum::{
  Extension, Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use impala_core::{
  document::{Collection, Document, Fields},
  media::{MediaStore, Upload},
  record::Author,
  stats::DashboardStats,
  store::{DocumentStore, StoreError},
};
use impala_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiState, Entry, admin_router, public_router};

// ─── Fixtures ─────────────────────────────────────────────────────────────────

/// Records uploads and hands back a predictable URL.
#[derive(Default)]
struct MemoryMedia {
  uploads: Mutex<Vec<Upload>>,
}

impl MediaStore for MemoryMedia {
  type Error = Infallible;

  async fn put(&self, upload: Upload) -> Result<String, Infallible> {
    let url = format!("https://cdn.test/{}", upload.file_name);
    self.uploads.lock().unwrap().push(upload);
    Ok(url)
  }
}

#[derive(Debug, thiserror::Error)]
#[error("bucket unavailable")]
struct BucketDown;

struct FailingMedia;

impl MediaStore for FailingMedia {
  type Error = BucketDown;

  async fn put(&self, _: Upload) -> Result<String, BucketDown> { Err(BucketDown) }
}

/// Wraps SQLite to simulate an outage on one collection, or a delete that
/// lands between a handler's read and its write.
struct FaultyStore {
  inner:            SqliteStore,
  unreadable:       Option<Collection>,
  vanish_on_update: bool,
}

impl FaultyStore {
  async fn new() -> Self {
    Self {
      inner:            SqliteStore::open_in_memory().await.unwrap(),
      unreadable:       None,
      vanish_on_update: false,
    }
  }
}

#[derive(Debug, thiserror::Error)]
enum FaultyError {
  #[error("{0} is unavailable")]
  Unavailable(Collection),
  #[error(transparent)]
  Sqlite(#[from] impala_store_sqlite::Error),
}

impl StoreError for FaultyError {
  fn is_not_found(&self) -> bool { matches!(self, Self::Sqlite(e) if e.is_not_found()) }
}

impl DocumentStore for FaultyStore {
  type Error = FaultyError;

  async fn add(&self, collection: Collection, data: Fields) -> Result<Document, FaultyError> {
    Ok(self.inner.add(collection, data).await?)
  }

  async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, FaultyError> {
    Ok(self.inner.get(collection, id).await?)
  }

  async fn list(&self, collection: Collection) -> Result<Vec<Document>, FaultyError> {
    if self.unreadable == Some(collection) {
      return Err(FaultyError::Unavailable(collection));
    }
    Ok(self.inner.list(collection).await?)
  }

  async fn update(
    &self,
    collection: Collection,
    id: &str,
    patch: Fields,
  ) -> Result<Document, FaultyError> {
    if self.vanish_on_update {
      self.inner.delete(collection, id).await?;
    }
    Ok(self.inner.update(collection, id, patch).await?)
  }

  async fn set(&self, collection: Collection, id: &str, data: Fields) -> Result<Document, FaultyError> {
    Ok(self.inner.set(collection, id, data).await?)
  }

  async fn delete(&self, collection: Collection, id: &str) -> Result<bool, FaultyError> {
    Ok(self.inner.delete(collection, id).await?)
  }
}

fn faulty_state(store: FaultyStore) -> ApiState<FaultyStore, MemoryMedia> {
  ApiState::new(Arc::new(store), Arc::new(MemoryMedia::default()))
}

fn author() -> Author {
  Author { uid: "admin-1".into(), display_name: "Site Admin".into() }
}

async fn state<M: MediaStore>(media: M) -> ApiState<SqliteStore, M> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  ApiState::new(Arc::new(store), Arc::new(media))
}

fn app<S: DocumentStore + 'static, M: MediaStore + 'static>(state: ApiState<S, M>) -> Router {
  Router::new()
    .nest("/api", public_router(state.clone()))
    .nest("/api/admin", admin_router(state).layer(Extension(author())))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

fn article_body(title: &str) -> Value {
  json!({ "title": title, "body": "<p>Body text</p>", "keywords": "health, research" })
}

// ─── Forms ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn contact_form_writes_stamped_document() {
  let state = state(MemoryMedia::default()).await;
  let (status, body) = send(
    app(state.clone()),
    "POST",
    "/api/contacts",
    Some(json!({ "name": "A", "email": "a@x.com", "subject": "Hi", "message": "Hello" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(body["created_at"].as_str().unwrap().ends_with('Z'));

  let stored = state.store.list(Collection::Contacts).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].id, body["id"]);
}

#[tokio::test]
async fn invalid_contact_is_rejected_without_write() {
  let state = state(MemoryMedia::default()).await;
  let (status, body) = send(
    app(state.clone()),
    "POST",
    "/api/contacts",
    Some(json!({ "name": "A", "email": "nope", "message": "Hello" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Please enter a valid email address.");
  assert!(state.store.list(Collection::Contacts).await.unwrap().is_empty());
}

#[tokio::test]
async fn subscription_uses_canonical_timestamp_field() {
  let state = state(MemoryMedia::default()).await;
  let (status, body) = send(
    app(state),
    "POST",
    "/api/subscriptions",
    Some(json!({ "email": "news@x.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(body.get("subscribed_at").is_some());
  assert!(body.get("subscribedAt").is_none());
}

// ─── Articles ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_embeds_author_and_lists_newest_first() {
  let state = state(MemoryMedia::default()).await;
  state
    .store
    .add(
      Collection::Articles,
      json!({ "title": "Old", "created_at": "2020-01-01T00:00:00Z" })
        .as_object()
        .cloned()
        .unwrap(),
    )
    .await
    .unwrap();

  let (status, created) =
    send(app(state.clone()), "POST", "/api/admin/articles", Some(article_body("Fresh"))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["author"], json!({ "uid": "admin-1", "displayName": "Site Admin" }));

  let (_, list) = send(app(state), "GET", "/api/articles", None).await;
  let titles: Vec<_> = list.as_array().unwrap().iter().map(|a| a["title"].clone()).collect();
  assert_eq!(titles, vec![json!("Fresh"), json!("Old")]);
}

#[tokio::test]
async fn empty_editor_body_is_rejected() {
  let state = state(MemoryMedia::default()).await;
  let (status, body) = send(
    app(state),
    "POST",
    "/api/admin/articles",
    Some(json!({ "title": "T", "body": "<p><br></p>" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Content is required.");
}

#[tokio::test]
async fn upload_is_stored_and_linked() {
  let state = state(MemoryMedia::default()).await;
  let mut body = article_body("With image");
  body["upload"] = json!({ "file_name": "cover.png", "media_type": "image/png", "data": "iVBORw0KGgo=" });

  let (status, created) = send(app(state.clone()), "POST", "/api/admin/articles", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["featured_image"], "https://cdn.test/cover.png");
  assert_eq!(state.media.uploads.lock().unwrap()[0].bytes[..4], [0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn failed_upload_falls_back_to_url() {
  let state = state(FailingMedia).await;
  let mut body = article_body("Fallback");
  body["upload"] = json!({ "file_name": "a.png", "media_type": "image/png", "data": "AAAA" });
  body["featured_image_url"] = json!("https://example.org/pasted.jpg");

  let (status, created) = send(app(state), "POST", "/api/admin/articles", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["featured_image"], "https://example.org/pasted.jpg");
}

#[tokio::test]
async fn failed_upload_without_url_aborts_save() {
  let state = state(FailingMedia).await;
  let mut body = article_body("Doomed");
  body["upload"] = json!({ "file_name": "a.png", "media_type": "image/png", "data": "AAAA" });

  let (status, _) = send(app(state.clone()), "POST", "/api/admin/articles", Some(body)).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert!(state.store.list(Collection::Articles).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_keeps_author_and_created_at() {
  let state = state(MemoryMedia::default()).await;
  let (_, created) =
    send(app(state.clone()), "POST", "/api/admin/articles", Some(article_body("First"))).await;
  let id = created["id"].as_str().unwrap().to_owned();

  let (status, updated) = send(
    app(state),
    "PUT",
    &format!("/api/admin/articles/{id}"),
    Some(article_body("Second")),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["title"], "Second");
  assert_eq!(updated["author"], created["author"]);
  assert_eq!(updated["created_at"], created["created_at"]);
}

#[tokio::test]
async fn update_missing_article_is_404() {
  let state = state(MemoryMedia::default()).await;
  let (status, _) =
    send(app(state), "PUT", "/api/admin/articles/missing", Some(article_body("x"))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_article_from_later_reads() {
  let state = state(MemoryMedia::default()).await;
  let (_, created) =
    send(app(state.clone()), "POST", "/api/admin/articles", Some(article_body("Bye"))).await;
  let id = created["id"].as_str().unwrap().to_owned();

  let (status, _) =
    send(app(state.clone()), "DELETE", &format!("/api/admin/articles/{id}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = send(app(state.clone()), "GET", &format!("/api/articles/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (_, list) = send(app(state.clone()), "GET", "/api/articles", None).await;
  assert_eq!(list, json!([]));

  let (status, _) = send(app(state), "DELETE", &format!("/api/admin/articles/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn article_deleted_mid_edit_is_404() {
  let mut store = FaultyStore::new().await;
  store.vanish_on_update = true;
  let state = faulty_state(store);
  let (_, created) =
    send(app(state.clone()), "POST", "/api/admin/articles", Some(article_body("Racy"))).await;
  let id = created["id"].as_str().unwrap().to_owned();

  let (status, body) = send(
    app(state),
    "PUT",
    &format!("/api/admin/articles/{id}"),
    Some(article_body("Edited")),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], format!("article {id} not found"));
}

// ─── Stats ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_count_recent_submissions() {
  let state = state(MemoryMedia::default()).await;
  for email in ["a@x.com", "b@x.com"] {
    send(app(state.clone()), "POST", "/api/subscriptions", Some(json!({ "email": email }))).await;
  }
  state
    .store
    .add(
      Collection::Subscriptions,
      json!({ "email": "old@x.com", "subscribedAt": "2019-01-01T00:00:00Z" })
        .as_object()
        .cloned()
        .unwrap(),
    )
    .await
    .unwrap();
  send(
    app(state.clone()),
    "POST",
    "/api/contacts",
    Some(json!({ "name": "A", "email": "a@x.com", "message": "m" })),
  )
  .await;

  let (status, body) = send(app(state), "GET", "/api/admin/stats", None).await;
  assert_eq!(status, StatusCode::OK);
  let stats: DashboardStats = serde_json::from_value(body).unwrap();
  assert_eq!(stats.total_subscribers, 3);
  assert_eq!(stats.subscribers_this_week, 2);
  assert_eq!(stats.total_contacts, 1);
  assert_eq!(stats.contacts_this_week, 1);
  assert_eq!(stats.total_articles, 0);
}

#[test]
fn entry_flattens_fields_next_to_id() {
  let entry = Entry {
    id:   "abc".into(),
    data: json!({ "title": "T" }).as_object().cloned().unwrap(),
  };
  assert_eq!(serde_json::to_value(entry).unwrap(), json!({ "id": "abc", "title": "T" }));
}

#[tokio::test]
async fn unreadable_collection_counts_as_zero() {
  let mut store = FaultyStore::new().await;
  store.unreadable = Some(Collection::Contacts);
  let state = faulty_state(store);
  send(app(state.clone()), "POST", "/api/subscriptions", Some(json!({ "email": "a@x.com" }))).await;
  send(
    app(state.clone()),
    "POST",
    "/api/contacts",
    Some(json!({ "name": "A", "email": "a@x.com", "message": "m" })),
  )
  .await;

  let (status, body) = send(app(state), "GET", "/api/admin/stats", None).await;
  assert_eq!(status, StatusCode::OK);
  let stats: DashboardStats = serde_json::from_value(body).unwrap();
  assert_eq!(stats.total_contacts, 0);
  assert_eq!(stats.contacts_this_week, 0);
  assert_eq!(stats.total_subscribers, 1);
  assert_eq!(stats.subscribers_this_week, 1);
}
