//! File storage for course images, logos and syllabi.
//!
//! Uploaded bytes are written under a store-chosen name and served back
//! read-only under [`PUBLIC_PREFIX`].

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::AppError;

/// URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/files";

/// Longest extension kept from the uploaded file name.
const MAX_EXTENSION_LEN: usize = 8;

/// A stored upload and where to download it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub name: String,
    pub url: String,
    pub size: usize,
}

/// Flat directory of uploaded files.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    max_bytes: usize,
}

impl FileStorage {
    /// Open the storage directory, creating it if needed.
    pub async fn open(root: &Path, max_bytes: usize) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(root).await?;
        Ok(Self {
            root: root.to_path_buf(),
            max_bytes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `bytes` and return the download URL. Only the extension of
    /// `original_name` is kept.
    pub async fn put(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, AppError> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Upload is empty".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::Validation(format!(
                "Upload of {} bytes exceeds the {} byte limit",
                bytes.len(),
                self.max_bytes
            )));
        }

        let id = uuid::Uuid::new_v4().simple().to_string();
        let name = match extension_of(original_name) {
            Some(ext) => format!("{}.{}", id, ext),
            None => id,
        };

        tokio::fs::write(self.root.join(&name), bytes).await?;
        tracing::info!(%name, size = bytes.len(), "Stored upload");

        Ok(StoredFile {
            url: format!("{}/{}", PUBLIC_PREFIX, name),
            name,
            size: bytes.len(),
        })
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}
