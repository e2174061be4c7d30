//! Elevated views. Every route here sits behind both the bearer token and
//! the admin grant, and still only sees the caller's own records.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::extract::Caller;
use super::validation::parse_item_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::admin_service::{ActivityBucket, AdminStats, AuditLogView};
use crate::services::item_service::{DeleteOrigin, ItemView};

/// GET /admin/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<ApiResponse<AdminStats>>, ApiError> {
    let stats = state.shared.admin.stats(caller.user.id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// GET /admin/items
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<ApiResponse<Vec<ItemView>>>, ApiError> {
    let items = state.shared.items.list(&caller.ctx).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// DELETE /admin/items/{id}
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = parse_item_id(&id)?;
    state
        .shared
        .items
        .delete(&caller.ctx, id, DeleteOrigin::Admin)
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Item deleted successfully by admin",
    ))))
}

/// GET /admin/audit-logs
pub async fn get_audit_logs(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<ApiResponse<Vec<AuditLogView>>>, ApiError> {
    let logs = state.shared.admin.audit_logs(caller.user.id).await?;
    Ok(Json(ApiResponse::success(logs)))
}

/// GET /admin/user-activity
pub async fn get_user_activity(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<ApiResponse<Vec<ActivityBucket>>>, ApiError> {
    let activity = state.shared.admin.user_activity(caller.user.id).await?;
    Ok(Json(ApiResponse::success(activity)))
}
