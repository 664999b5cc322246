//! The `MediaStore` trait: blob storage for article images.

use std::future::Future;

/// A file submitted alongside an article.
#[derive(Debug, Clone)]
pub struct Upload {
  /// Name of the file on the uploader's machine; informational only.
  pub file_name:  String,
  pub media_type: String,
  pub bytes:      Vec<u8>,
}

/// Stores uploaded files and hands back a URL the public site can link to.
pub trait MediaStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn put(
    &self,
    upload: Upload,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;
}
