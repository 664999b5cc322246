//! Admin sign-in, bearer sessions, and the middleware guarding admin routes.
//!
//! One admin account is configured. Signing in with its email and password
//! yields an opaque bearer token held in an in-memory [`SessionTable`];
//! HTTP Basic with the same credentials is accepted wherever a token is.
//!
//! Failed password checks are counted per client address, whichever route
//! they arrive on. Five in a row lock that client out for five minutes.

use std::{
  collections::HashMap,
  net::{IpAddr, SocketAddr},
  sync::Mutex,
};

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  Json,
  extract::{ConnectInfo, Request, State},
  http::{Extensions, HeaderMap, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::{DateTime, Duration, Utc};
use impala_core::{media::MediaStore, record::Author, store::DocumentStore};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{AppState, ServerConfig, error::Error};

/// Consecutive failed sign-ins before the lock engages.
pub const MAX_FAILED_ATTEMPTS: u32 = 5;
/// How long sign-in stays locked.
pub const LOCKOUT_MINUTES: i64 = 5;

// ─── Account ──────────────────────────────────────────────────────────────────

/// The configured admin.
#[derive(Debug, Clone)]
pub struct AdminAccount {
  pub uid:           String,
  pub display_name:  String,
  pub email:         String,
  /// PHC string produced by argon2. `None` means sign-in is not configured.
  pub password_hash: Option<String>,
}

impl AdminAccount {
  pub fn from_config(config: &ServerConfig) -> Self {
    Self {
      uid:           config.admin_uid.clone(),
      display_name:  config.admin_display_name.clone(),
      email:         config.admin_email.clone(),
      password_hash: config
        .admin_password_hash
        .clone()
        .filter(|h| !h.trim().is_empty()),
    }
  }

  pub fn author(&self) -> Author {
    Author { uid: self.uid.clone(), display_name: self.display_name.clone() }
  }

  /// Check `email` and `password` against this account.
  pub fn check(&self, email: &str, password: &str) -> Result<(), SignInCode> {
    let hash = self
      .password_hash
      .as_deref()
      .ok_or(SignInCode::ConfigurationNotFound)?;

    if !email.trim().eq_ignore_ascii_case(self.email.trim()) {
      return Err(SignInCode::UserNotFound);
    }

    let parsed = PasswordHash::new(hash).map_err(|e| {
      tracing::error!(error = %e, "admin_password_hash is not a valid PHC string");
      SignInCode::ConfigurationNotFound
    })?;

    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .map_err(|_| SignInCode::WrongPassword)
  }
}

/// Why a sign-in was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInCode {
  UserNotFound,
  WrongPassword,
  TooManyRequests,
  ConfigurationNotFound,
}

impl SignInCode {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::UserNotFound => "user-not-found",
      Self::WrongPassword => "wrong-password",
      Self::TooManyRequests => "too-many-requests",
      Self::ConfigurationNotFound => "configuration-not-found",
    }
  }

  /// The message shown to the person signing in.
  pub fn message(&self) -> &'static str {
    match self {
      Self::UserNotFound => "No admin account found with this email.",
      Self::WrongPassword => "Incorrect password.",
      Self::TooManyRequests => "Too many failed attempts. Please try again later.",
      Self::ConfigurationNotFound => {
        "Authentication is not configured. Please contact your administrator."
      }
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::UserNotFound | Self::WrongPassword => StatusCode::UNAUTHORIZED,
      Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
      Self::ConfigurationNotFound => StatusCode::SERVICE_UNAVAILABLE,
    }
  }
}

// ─── Sessions ─────────────────────────────────────────────────────────────────

struct Session {
  author:     Author,
  expires_at: DateTime<Utc>,
}

/// Failed attempts from one client.
struct Attempts {
  failures:     u32,
  last_failure: DateTime<Utc>,
  locked_until: Option<DateTime<Utc>>,
}

impl Attempts {
  fn is_stale(&self, now: DateTime<Utc>) -> bool {
    let window = Duration::minutes(LOCKOUT_MINUTES);
    self.locked_until.is_none_or(|until| until <= now) && now - self.last_failure >= window
  }
}

#[derive(Default)]
struct Inner {
  sessions: HashMap<String, Session>,
  /// Keyed by client address; `None` collects callers whose address is
  /// unknown.
  attempts: HashMap<Option<IpAddr>, Attempts>,
}

/// Live bearer tokens plus per-client failed-attempt counters.
pub struct SessionTable {
  ttl:   Duration,
  inner: Mutex<Inner>,
}

impl SessionTable {
  pub fn new(ttl: Duration) -> Self { Self { ttl, inner: Mutex::default() } }

  fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Verify credentials, counting failures against `client`. Every path that
  /// accepts a password goes through here, so Basic guesses and sign-in
  /// attempts share one lock.
  pub fn check_credentials(
    &self,
    account: &AdminAccount,
    email: &str,
    password: &str,
    client: Option<IpAddr>,
    now: DateTime<Utc>,
  ) -> Result<(), SignInCode> {
    let mut inner = self.lock();
    inner.attempts.retain(|_, a| !a.is_stale(now));

    if let Some(until) = inner.attempts.get(&client).and_then(|a| a.locked_until)
      && now < until
    {
      return Err(SignInCode::TooManyRequests);
    }

    match account.check(email, password) {
      Ok(()) => {
        inner.attempts.remove(&client);
        Ok(())
      }
      Err(SignInCode::ConfigurationNotFound) => Err(SignInCode::ConfigurationNotFound),
      Err(code) => {
        let attempts = inner.attempts.entry(client).or_insert(Attempts {
          failures:     0,
          last_failure: now,
          locked_until: None,
        });
        attempts.failures += 1;
        attempts.last_failure = now;
        if attempts.failures >= MAX_FAILED_ATTEMPTS {
          attempts.failures = 0;
          attempts.locked_until = Some(now + Duration::minutes(LOCKOUT_MINUTES));
          tracing::warn!(
            client = ?client,
            minutes = LOCKOUT_MINUTES,
            "admin sign-in locked after repeated failures"
          );
        }
        Err(code)
      }
    }
  }

  /// Verify credentials and open a session, returning its token.
  pub fn sign_in(
    &self,
    account: &AdminAccount,
    email: &str,
    password: &str,
    client: Option<IpAddr>,
    now: DateTime<Utc>,
  ) -> Result<String, SignInCode> {
    self.check_credentials(account, email, password, client, now)?;
    let token = new_token();
    self.lock().sessions.insert(token.clone(), Session {
      author:     account.author(),
      expires_at: now + self.ttl,
    });
    Ok(token)
  }

  /// The author behind `token`, if the session is still live.
  pub fn resolve(&self, token: &str, now: DateTime<Utc>) -> Option<Author> {
    let mut inner = self.lock();
    inner.sessions.retain(|_, s| s.expires_at > now);
    inner.sessions.get(token).map(|s| s.author.clone())
  }

  /// Drop `token`. Returns `false` if it was not live.
  pub fn revoke(&self, token: &str) -> bool { self.lock().sessions.remove(token).is_some() }
}

/// 32 bytes from the OS RNG, hex encoded.
fn new_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

// ─── Header verification ──────────────────────────────────────────────────────

/// The peer address, when the server was started with connect info.
pub fn client_ip(extensions: &Extensions) -> Option<IpAddr> {
  extensions
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.ip())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let encoded = headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (email, password) = creds.split_once(':')?;
  Some((email.to_owned(), password.to_owned()))
}

/// Verify HTTP Basic credentials against the admin account. Wrong guesses
/// count toward the sign-in lock, and a locked client gets 429.
pub fn verify_basic(
  headers: &HeaderMap,
  account: &AdminAccount,
  sessions: &SessionTable,
  client: Option<IpAddr>,
  now: DateTime<Utc>,
) -> Result<Author, Error> {
  let (email, password) = basic_credentials(headers).ok_or(Error::Unauthorized)?;
  match sessions.check_credentials(account, &email, &password, client, now) {
    Ok(()) => Ok(account.author()),
    Err(SignInCode::TooManyRequests) => Err(Error::SignIn(SignInCode::TooManyRequests)),
    Err(_) => Err(Error::Unauthorized),
  }
}

/// Resolve the caller from a bearer token or Basic credentials.
pub fn authorize<S, M>(
  headers: &HeaderMap,
  client: Option<IpAddr>,
  state: &AppState<S, M>,
) -> Result<Author, Error> {
  let now = Utc::now();
  if let Some(token) = bearer_token(headers) {
    return state.sessions.resolve(token, now).ok_or(Error::Unauthorized);
  }
  verify_basic(headers, &state.account, &state.sessions, client, now)
}

/// Rejects unauthenticated requests and hands the signed-in [`Author`] to
/// downstream handlers through request extensions.
pub async fn require_admin<S, M>(
  State(state): State<AppState<S, M>>,
  mut request: Request,
  next: Next,
) -> Response
where
  S: DocumentStore + 'static,
  M: MediaStore + 'static,
{
  let client = client_ip(request.extensions());
  match authorize(request.headers(), client, &state) {
    Ok(author) => {
      request.extensions_mut().insert(author);
      next.run(request).await
    }
    Err(e) => e.into_response(),
  }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionUser {
  pub uid:          String,
  #[serde(rename = "displayName")]
  pub display_name: String,
  pub email:        String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
  pub token: String,
  pub user:  SessionUser,
}

/// `POST /auth/login`
pub async fn login<S, M>(
  State(state): State<AppState<S, M>>,
  extensions: Extensions,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, Error>
where
  S: DocumentStore + 'static,
  M: MediaStore + 'static,
{
  let token = state
    .sessions
    .sign_in(
      &state.account,
      &body.email,
      &body.password,
      client_ip(&extensions),
      Utc::now(),
    )
    .map_err(|code| {
      tracing::info!(code = code.as_str(), "admin sign-in refused");
      Error::SignIn(code)
    })?;

  tracing::info!(uid = %state.account.uid, "admin signed in");
  Ok(Json(LoginResponse {
    token,
    user: SessionUser {
      uid:          state.account.uid.clone(),
      display_name: state.account.display_name.clone(),
      email:        state.account.email.clone(),
    },
  }))
}

/// `POST /auth/logout`
pub async fn logout<S, M>(
  State(state): State<AppState<S, M>>,
  headers: HeaderMap,
) -> Result<StatusCode, Error>
where
  S: DocumentStore + 'static,
  M: MediaStore + 'static,
{
  let token = bearer_token(&headers).ok_or(Error::Unauthorized)?;
  state.sessions.revoke(token);
  Ok(StatusCode::NO_CONTENT)
}
