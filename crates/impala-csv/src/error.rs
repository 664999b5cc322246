use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("csv write error: {0}")]
  Csv(#[from] csv::Error),

  #[error("csv output is not valid UTF-8")]
  Utf8(#[from] std::string::FromUtf8Error),

  #[error("csv writer flush failed: {0}")]
  Flush(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
