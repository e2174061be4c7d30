use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::extract::Caller;
use super::{ApiError, ApiResponse, AppState};
use crate::services::upload::{ITEM_IMAGE_FOLDER, UploadError, UploadFile};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub public_id: String,
}

/// Pulls the file in `field_name` out of a multipart body. Other fields are
/// skipped.
pub async fn read_image(mut multipart: Multipart, field_name: &str) -> Result<UploadFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart body: {}", e.body_text())))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read upload: {}", e.body_text())))?;

        return Ok(UploadFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(UploadError::MissingFile.into())
}

/// POST /upload (multipart field `image`)
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let file = read_image(multipart, "image").await?;
    let stored = state
        .shared
        .uploads
        .upload_image(ITEM_IMAGE_FOLDER, file)
        .await?;

    Ok(Json(ApiResponse::success(UploadResponse {
        url: stored.url,
        public_id: stored.public_id,
    })))
}
