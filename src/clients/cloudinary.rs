//! Signed uploads to Cloudinary.

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::StorageConfig;
use crate::services::upload::{ObjectStorage, StorageError, StoredObject, UploadFile};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

pub struct CloudinaryStorage {
    client: Client,
    config: StorageConfig,
}

impl CloudinaryStorage {
    #[must_use]
    pub const fn with_shared_client(client: Client, config: StorageConfig) -> Self {
        Self { client, config }
    }

    fn is_configured(&self) -> bool {
        !self.config.cloud_name.is_empty()
            && !self.config.api_key.is_empty()
            && !self.config.api_secret.is_empty()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/auto/upload",
            self.config.upload_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }
}

/// Signature over the signed parameters, sorted by name, followed by the secret.
fn sign(folder: &str, timestamp: i64, secret: &str) -> String {
    let payload = format!("folder={folder}&timestamp={timestamp}{secret}");
    hex::encode(Sha256::digest(payload.as_bytes()))
}

#[async_trait::async_trait]
impl ObjectStorage for CloudinaryStorage {
    async fn upload(&self, folder: &str, file: UploadFile) -> Result<StoredObject, StorageError> {
        if !self.is_configured() {
            return Err(StorageError::NotConfigured);
        }

        let timestamp = chrono::Utc::now().timestamp();
        let signature = sign(folder, timestamp, &self.config.api_secret);

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", folder.to_string())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let url = self.endpoint();
        debug!(url = %url, folder, "Uploading to Cloudinary");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        Ok(StoredObject {
            url: parsed.secure_url,
            public_id: parsed.public_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_stable_hex() {
        let sig = sign("items", 1_700_000_000, "secret");
        assert_eq!(sig.len(), 64);
        assert_eq!(sig, sign("items", 1_700_000_000, "secret"));
        assert_ne!(sig, sign("avatars", 1_700_000_000, "secret"));
    }

    #[tokio::test]
    async fn test_unconfigured_storage_refuses() {
        let storage = CloudinaryStorage::with_shared_client(Client::new(), StorageConfig::default());
        let err = storage
            .upload(
                "items",
                UploadFile {
                    file_name: "a.png".to_string(),
                    content_type: "image/png".to_string(),
                    bytes: vec![1, 2, 3],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotConfigured));
    }

    #[test]
    fn test_endpoint() {
        let storage = CloudinaryStorage::with_shared_client(
            Client::new(),
            StorageConfig {
                cloud_name: "demo".to_string(),
                ..StorageConfig::default()
            },
        );
        assert_eq!(
            storage.endpoint(),
            "https://api.cloudinary.com/v1_1/demo/auto/upload"
        );
    }
}
