//! [`MediaStore`] backed by a local directory.
//!
//! Files are content-addressed: the name is the SHA-256 of the bytes plus an
//! extension, so uploading the same image twice yields one file and one URL.

use std::path::{Path, PathBuf};

use impala_core::media::{MediaStore, Upload};
use sha2::{Digest, Sha256};

pub struct FsMediaStore {
  dir:        PathBuf,
  public_url: String,
}

impl FsMediaStore {
  /// `public_url` is the origin the server is reachable at; files are served
  /// under `{public_url}/media/`.
  pub fn new(dir: impl Into<PathBuf>, public_url: &str) -> Self {
    Self {
      dir:        dir.into(),
      public_url: public_url.trim_end_matches('/').to_owned(),
    }
  }

  pub fn dir(&self) -> &Path { &self.dir }
}

fn extension_for(upload: &Upload) -> String {
  let from_type = match upload.media_type.as_str() {
    "image/jpeg" | "image/jpg" => Some("jpg"),
    "image/png" => Some("png"),
    "image/gif" => Some("gif"),
    "image/webp" => Some("webp"),
    "image/svg+xml" => Some("svg"),
    "image/avif" => Some("avif"),
    _ => None,
  };
  if let Some(ext) = from_type {
    return ext.to_owned();
  }

  Path::new(&upload.file_name)
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| e.to_ascii_lowercase())
    .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
    .unwrap_or_else(|| "bin".to_owned())
}

/// `<sha256-hex>.<ext>`
pub fn stored_name(upload: &Upload) -> String {
  let digest = hex::encode(Sha256::digest(&upload.bytes));
  format!("{digest}.{}", extension_for(upload))
}

impl MediaStore for FsMediaStore {
  type Error = std::io::Error;

  async fn put(&self, upload: Upload) -> Result<String, Self::Error> {
    let name = stored_name(&upload);
    let path = self.dir.join(&name);

    if !tokio::fs::try_exists(&path).await? {
      tokio::fs::create_dir_all(&self.dir).await?;
      tokio::fs::write(&path, &upload.bytes).await?;
      tracing::info!(%name, bytes = upload.bytes.len(), "stored upload");
    }

    Ok(format!("{}/media/{name}", self.public_url))
  }
}
