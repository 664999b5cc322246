//! Error types for `impala-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid document {id}: {reason}")]
  InvalidDocument { id: String, reason: String },

  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// A rejected form submission. The message is shown to the submitter as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
  pub fn new(message: impl Into<String>) -> Self { Self(message.into()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
