use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::extract::{ApiJson, Caller};
use super::validation::parse_item_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::item_service::{
    DeleteOrigin, EmailReceipt, InvoicePayload, ItemInput, ItemView,
};

/// GET /items
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<ApiResponse<Vec<ItemView>>>, ApiError> {
    let items = state.shared.items.list(&caller.ctx).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// GET /items/{id}
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ItemView>>, ApiError> {
    let id = parse_item_id(&id)?;
    let item = state.shared.items.get(&caller.ctx, id).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// POST /items
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    ApiJson(input): ApiJson<ItemInput>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.shared.items.create(&caller.ctx, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

/// PUT /items/{id}
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ItemInput>,
) -> Result<Json<ApiResponse<ItemView>>, ApiError> {
    let id = parse_item_id(&id)?;
    let item = state.shared.items.update(&caller.ctx, id, input).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// DELETE /items/{id}
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = parse_item_id(&id)?;
    state
        .shared
        .items
        .delete(&caller.ctx, id, DeleteOrigin::Owner)
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Item deleted successfully",
    ))))
}

/// POST /items/{id}/invoice
pub async fn generate_invoice(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<InvoicePayload>>, ApiError> {
    let id = parse_item_id(&id)?;
    let invoice = state.shared.items.generate_invoice(&caller.ctx, id).await?;
    Ok(Json(ApiResponse::success(invoice)))
}

/// POST /items/{id}/send-email
pub async fn send_invoice_email(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EmailReceipt>>, ApiError> {
    let id = parse_item_id(&id)?;
    let receipt = state
        .shared
        .items
        .send_invoice_email(&caller.ctx, id)
        .await?;
    Ok(Json(ApiResponse::success(receipt)))
}
