use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::upload::UploadError;
use crate::services::{AuthError, ItemError};

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    Unauthorized(String),

    Forbidden(String),

    NotFound(String),

    Conflict(String),

    RenderFailure(String),

    DeliveryFailure(String),

    StorageFailure(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::RenderFailure(msg) => write!(f, "Render failure: {msg}"),
            Self::DeliveryFailure(msg) => write!(f, "Delivery failure: {msg}"),
            Self::StorageFailure(msg) => write!(f, "Storage failure: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Stable machine-readable code carried in the response envelope.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::RenderFailure(_) => "RENDER_FAILURE",
            Self::DeliveryFailure(_) => "DELIVERY_FAILURE",
            Self::StorageFailure(_) => "STORAGE_FAILURE",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{resource} not found"))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error_message) = match self {
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::RenderFailure(msg) => {
                tracing::warn!("Invoice render failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to generate invoice".to_string(),
                )
            }
            Self::DeliveryFailure(msg) => {
                tracing::warn!("Email delivery failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "Failed to send email".to_string())
            }
            Self::StorageFailure(msg) => {
                tracing::warn!("Object storage failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to upload image".to_string(),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(code, error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(format!("{err:#}"))
    }
}

impl From<ItemError> for ApiError {
    fn from(err: ItemError) -> Self {
        match err {
            ItemError::NotFound => Self::not_found("Item"),
            ItemError::Validation(msg) => Self::ValidationError(msg),
            ItemError::Render(e) => Self::RenderFailure(e.to_string()),
            ItemError::Delivery(e) => Self::DeliveryFailure(e.to_string()),
            ItemError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::Unauthorized => Self::unauthorized("Authentication required"),
            AuthError::Forbidden(msg) => Self::Forbidden(msg),
            AuthError::AlreadyRegistered => Self::Forbidden(err.to_string()),
            AuthError::Conflict(msg) => Self::Conflict(msg),
            AuthError::Validation(msg) => Self::ValidationError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Storage(e) => Self::StorageFailure(e.to_string()),
            other => Self::ValidationError(other.to_string()),
        }
    }
}
