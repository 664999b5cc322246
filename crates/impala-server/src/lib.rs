//! HTTP server for the Impala site.
//!
//! Assembles the JSON API from `impala-api`, admin sign-in, and the CSV
//! export endpoints into one axum [`Router`] backed by any
//! [`DocumentStore`] and [`MediaStore`].

pub mod auth;
pub mod error;
pub mod export;
pub mod media;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router, middleware,
  routing::{any, post},
};
use impala_api::ApiState;
use impala_core::{media::MediaStore, store::DocumentStore};
use serde::Deserialize;

use auth::{AdminAccount, SessionTable};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_true() -> bool { true }
fn default_session_ttl() -> i64 { 720 }
fn default_media_dir() -> PathBuf { PathBuf::from("media") }
fn default_admin_name() -> String { "Admin".to_owned() }
fn default_admin_uid() -> String { "admin".to_owned() }

/// Runtime server configuration, deserialised from `config.toml` and
/// `IMPALA_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  /// Origin the server is reachable at; used to build media URLs.
  pub public_url:          String,
  pub project_id:          String,
  pub store_path:          PathBuf,
  #[serde(default = "default_media_dir")]
  pub media_dir:           PathBuf,
  /// Require admin credentials on the CSV export endpoints.
  #[serde(default = "default_true")]
  pub export_auth:         bool,
  #[serde(default = "default_session_ttl")]
  pub session_ttl_minutes: i64,
  #[serde(default)]
  pub admin_email:         String,
  #[serde(default = "default_admin_name")]
  pub admin_display_name:  String,
  #[serde(default = "default_admin_uid")]
  pub admin_uid:           String,
  #[serde(default)]
  pub admin_password_hash: Option<String>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the server's own handlers.
pub struct AppState<S, M> {
  pub store:    Arc<S>,
  pub media:    Arc<M>,
  pub config:   Arc<ServerConfig>,
  pub account:  Arc<AdminAccount>,
  pub sessions: Arc<SessionTable>,
}

impl<S, M> AppState<S, M> {
  pub fn new(store: S, media: M, config: ServerConfig) -> Self {
    let account = AdminAccount::from_config(&config);
    let sessions = SessionTable::new(chrono::Duration::minutes(config.session_ttl_minutes));
    Self {
      store:    Arc::new(store),
      media:    Arc::new(media),
      config:   Arc::new(config),
      account:  Arc::new(account),
      sessions: Arc::new(sessions),
    }
  }
}

impl<S, M> Clone for AppState<S, M> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      media:    self.media.clone(),
      config:   self.config.clone(),
      account:  self.account.clone(),
      sessions: self.sessions.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application [`Router`].
///
/// `/media` and request tracing are left to the binary, which knows where
/// files live on disk.
pub fn router<S, M>(state: AppState<S, M>) -> Router
where
  S: DocumentStore + 'static,
  M: MediaStore + 'static,
{
  let api = ApiState::new(state.store.clone(), state.media.clone());
  let admin = impala_api::admin_router(api.clone()).layer(middleware::from_fn_with_state(
    state.clone(),
    auth::require_admin::<S, M>,
  ));

  Router::new()
    .route("/auth/login", post(auth::login::<S, M>))
    .route("/auth/logout", post(auth::logout::<S, M>))
    .route("/generateContactsCSV", any(export::contacts::<S, M>))
    .route("/generateSubscriptionsCSV", any(export::subscriptions::<S, M>))
    .with_state(state)
    .nest("/api", impala_api::public_router(api))
    .nest("/api/admin", admin)
}

// ─── Integration tests ────────────────────────────────────────────────────────
