use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::extract::Caller;
use super::validation::parse_notification_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::notification_service::{Inbox, NotificationView};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// GET /notifications
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<ApiResponse<Inbox>>, ApiError> {
    let inbox = state.shared.notifications.inbox(caller.user.id).await?;
    Ok(Json(ApiResponse::success(inbox)))
}

/// PUT /notifications/{id}/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<NotificationView>>, ApiError> {
    let id = parse_notification_id(&id)?;
    let notification = state
        .shared
        .notifications
        .mark_read(caller.user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification"))?;
    Ok(Json(ApiResponse::success(notification)))
}

/// PUT /notifications/read-all
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<ApiResponse<MarkAllReadResponse>>, ApiError> {
    let updated = state
        .shared
        .notifications
        .mark_all_read(caller.user.id)
        .await?;
    Ok(Json(ApiResponse::success(MarkAllReadResponse { updated })))
}

/// DELETE /notifications/{id}
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = parse_notification_id(&id)?;
    if !state.shared.notifications.delete(caller.user.id, id).await? {
        return Err(ApiError::not_found("Notification"));
    }
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Notification deleted",
    ))))
}
