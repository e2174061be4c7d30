//! Image uploads proxied to object storage.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object storage is not configured")]
    NotConfigured,

    #[error("Upload request failed: {0}")]
    Request(String),

    #[error("Upload rejected with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected upload response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Only image files are allowed")]
    NotAnImage,

    #[error("File exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub url: String,
    pub public_id: String,
}

/// Stores a blob under a folder and returns its public URL.
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, folder: &str, file: UploadFile) -> Result<StoredObject, StorageError>;
}

pub const ITEM_IMAGE_FOLDER: &str = "items";
pub const AVATAR_FOLDER: &str = "avatars";

#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
    max_bytes: usize,
}

impl UploadService {
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>, max_bytes: usize) -> Self {
        Self { storage, max_bytes }
    }

    /// Validates that `file` is an image within the size limit, then stores it.
    pub async fn upload_image(
        &self,
        folder: &str,
        file: UploadFile,
    ) -> Result<StoredObject, UploadError> {
        if file.bytes.is_empty() {
            return Err(UploadError::MissingFile);
        }

        let content_type = if file.content_type.is_empty() {
            mime_guess::from_path(&file.file_name)
                .first_or_octet_stream()
                .to_string()
        } else {
            file.content_type.clone()
        };

        if !content_type.starts_with("image/") {
            return Err(UploadError::NotAnImage);
        }

        if file.bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let size = file.bytes.len();
        let stored = self
            .storage
            .upload(
                folder,
                UploadFile {
                    content_type,
                    ..file
                },
            )
            .await?;

        info!(folder, size, url = %stored.url, "Image uploaded");
        Ok(stored)
    }
}
