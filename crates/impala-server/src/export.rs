//! CSV export endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `OPTIONS` | `/generateContactsCSV`, `/generateSubscriptionsCSV` | 204, preflight |
//! | `GET`, `HEAD`, `POST` | same | 200 `text/csv` attachment; 401 unless authorized |
//!
//! Every response carries the CORS headers so browser callers on another
//! origin can read errors as well as files.

use axum::{
  extract::State,
  http::{Extensions, HeaderMap, HeaderValue, Method, StatusCode, header},
  response::{IntoResponse, Response},
};
use impala_core::{media::MediaStore, store::DocumentStore};
use impala_csv::{CONTACTS, ExportSchema, SUBSCRIPTIONS};

use crate::{
  AppState,
  auth::{authorize, client_ip},
};

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
/// `Allow` on a 405; HEAD is served like GET with the body stripped.
const ALLOWED: &str = "GET, HEAD, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

fn with_cors(mut res: Response) -> Response {
  let headers = res.headers_mut();
  headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
  headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
  headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
  res
}

/// `/generateContactsCSV`
pub async fn contacts<S, M>(
  State(state): State<AppState<S, M>>,
  method: Method,
  headers: HeaderMap,
  extensions: Extensions,
) -> Response
where
  S: DocumentStore + 'static,
  M: MediaStore + 'static,
{
  with_cors(respond(&state, &CONTACTS, &method, &headers, &extensions).await)
}

/// `/generateSubscriptionsCSV`
pub async fn subscriptions<S, M>(
  State(state): State<AppState<S, M>>,
  method: Method,
  headers: HeaderMap,
  extensions: Extensions,
) -> Response
where
  S: DocumentStore + 'static,
  M: MediaStore + 'static,
{
  with_cors(respond(&state, &SUBSCRIPTIONS, &method, &headers, &extensions).await)
}

async fn respond<S, M>(
  state: &AppState<S, M>,
  schema: &ExportSchema,
  method: &Method,
  headers: &HeaderMap,
  extensions: &Extensions,
) -> Response
where
  S: DocumentStore,
  M: MediaStore,
{
  if method == Method::OPTIONS {
    return StatusCode::NO_CONTENT.into_response();
  }
  if ![Method::GET, Method::HEAD, Method::POST].contains(method) {
    return (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, ALLOWED)]).into_response();
  }

  if state.config.export_auth
    && let Err(e) = authorize(headers, client_ip(extensions), state)
  {
    return e.into_response();
  }

  let body = match render(state, schema).await {
    Ok(body) => body,
    Err(e) => {
      tracing::error!(collection = %schema.collection, error = %e, "CSV export failed");
      return (StatusCode::INTERNAL_SERVER_ERROR, "Error generating CSV").into_response();
    }
  };

  tracing::info!(collection = %schema.collection, bytes = body.len(), "CSV exported");
  (
    StatusCode::OK,
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", schema.file_name),
      ),
    ],
    body,
  )
    .into_response()
}

async fn render<S, M>(
  state: &AppState<S, M>,
  schema: &ExportSchema,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>>
where
  S: DocumentStore,
  M: MediaStore,
{
  let docs = state.store.list(schema.collection).await?;
  Ok(impala_csv::to_csv(schema, &docs)?)
}
