//! Async HTTP client wrapping the Impala server.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use impala_core::{
  document::{Collection, Document, Fields},
  stats::DashboardStats,
};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

/// Connection settings for the Impala server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub email:    String,
  pub password: String,
}

/// Which collection to download as CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportKind {
  Contacts,
  Subscriptions,
}

impl ExportKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Contacts => "contacts",
      Self::Subscriptions => "subscriptions",
    }
  }

  fn path(&self) -> &'static str {
    match self {
      Self::Contacts => "/generateContactsCSV",
      Self::Subscriptions => "/generateSubscriptionsCSV",
    }
  }
}

/// An image attached to an article, already base64 encoded.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest {
  pub file_name:  String,
  pub media_type: String,
  pub data:       String,
}

/// Body for creating or editing an article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleRequest {
  pub title:              String,
  pub body:               String,
  pub keywords:           String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub featured_image_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub upload:             Option<UploadRequest>,
}

#[derive(Deserialize)]
struct Entry {
  id:   String,
  #[serde(flatten)]
  data: Fields,
}

impl Entry {
  fn into_article(self) -> Document {
    Document { id: self.id, collection: Collection::Articles, data: self.data }
  }
}

#[derive(Deserialize)]
struct LoginResponse {
  token: String,
  user:  SignedInUser,
}

/// The admin the client is signed in as.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedInUser {
  pub uid:          String,
  #[serde(rename = "displayName")]
  pub display_name: String,
  pub email:        String,
}

/// `{code, error}` returned by a refused sign-in; `{error}` elsewhere.
#[derive(Deserialize)]
struct ErrorBody {
  #[serde(default)]
  code:  Option<String>,
  error: String,
}

/// Async HTTP client for the Impala server.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
  token:  Option<String>,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config, token: None })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Turn a non-success response into an error carrying the server's
  /// message when it sent one.
  async fn check(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
      Ok(ErrorBody { code: Some(code), error }) => Err(anyhow!("{error} ({code})")),
      Ok(ErrorBody { error, .. }) => Err(anyhow!("{what} → {status}: {error}")),
      Err(_) => Err(anyhow!("{what} → {status}")),
    }
  }

  // ── Session ───────────────────────────────────────────────────────────────

  /// `POST /auth/login`; later calls carry the returned bearer token.
  pub async fn sign_in(&mut self) -> Result<SignedInUser> {
    if self.config.email.is_empty() || self.config.password.is_empty() {
      return Err(anyhow!("email and password are required to sign in"));
    }
    let resp = self
      .client
      .post(self.url("/auth/login"))
      .json(&serde_json::json!({
        "email": self.config.email,
        "password": self.config.password,
      }))
      .send()
      .await
      .context("POST /auth/login failed")?;

    let login: LoginResponse = Self::check(resp, "POST /auth/login")
      .await?
      .json()
      .await
      .context("deserialising sign-in response")?;
    tracing::debug!(uid = %login.user.uid, "signed in");
    self.token = Some(login.token);
    Ok(login.user)
  }

  // ── Dashboard ─────────────────────────────────────────────────────────────

  /// `GET /api/admin/stats`
  pub async fn stats(&self) -> Result<DashboardStats> {
    let resp = self
      .auth(self.client.get(self.url("/api/admin/stats")))
      .send()
      .await
      .context("GET /api/admin/stats failed")?;
    Self::check(resp, "GET /api/admin/stats")
      .await?
      .json()
      .await
      .context("deserialising stats")
  }

  /// Download one collection as CSV text.
  pub async fn export(&self, kind: ExportKind) -> Result<String> {
    let resp = self
      .auth(self.client.get(self.url(kind.path())))
      .send()
      .await
      .with_context(|| format!("GET {} failed", kind.path()))?;
    Self::check(resp, kind.path())
      .await?
      .text()
      .await
      .context("reading CSV body")
  }

  // ── Articles ──────────────────────────────────────────────────────────────

  /// `GET /api/articles`
  pub async fn list_articles(&self) -> Result<Vec<Document>> {
    let resp = self
      .client
      .get(self.url("/api/articles"))
      .send()
      .await
      .context("GET /api/articles failed")?;
    let entries: Vec<Entry> = Self::check(resp, "GET /api/articles")
      .await?
      .json()
      .await
      .context("deserialising articles")?;
    Ok(entries.into_iter().map(Entry::into_article).collect())
  }

  /// `GET /api/articles/:id`
  pub async fn get_article(&self, id: &str) -> Result<Document> {
    let path = format!("/api/articles/{id}");
    let resp = self
      .client
      .get(self.url(&path))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    let entry: Entry = Self::check(resp, &path)
      .await?
      .json()
      .await
      .context("deserialising article")?;
    Ok(entry.into_article())
  }

  /// `POST /api/admin/articles`
  pub async fn create_article(&self, body: &ArticleRequest) -> Result<Document> {
    let resp = self
      .auth(self.client.post(self.url("/api/admin/articles")))
      .json(body)
      .send()
      .await
      .context("POST /api/admin/articles failed")?;
    let entry: Entry = Self::check(resp, "POST /api/admin/articles")
      .await?
      .json()
      .await
      .context("deserialising created article")?;
    Ok(entry.into_article())
  }

  /// `PUT /api/admin/articles/:id`
  pub async fn update_article(&self, id: &str, body: &ArticleRequest) -> Result<Document> {
    let path = format!("/api/admin/articles/{id}");
    let resp = self
      .auth(self.client.put(self.url(&path)))
      .json(body)
      .send()
      .await
      .with_context(|| format!("PUT {path} failed"))?;
    let entry: Entry = Self::check(resp, &path)
      .await?
      .json()
      .await
      .context("deserialising updated article")?;
    Ok(entry.into_article())
  }

  /// `DELETE /api/admin/articles/:id`
  pub async fn delete_article(&self, id: &str) -> Result<()> {
    let path = format!("/api/admin/articles/{id}");
    let resp = self
      .auth(self.client.delete(self.url(&path)))
      .send()
      .await
      .with_context(|| format!("DELETE {path} failed"))?;
    Self::check(resp, &path).await?;
    Ok(())
  }
}
