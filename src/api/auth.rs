use axum::{
    Json,
    extract::{Multipart, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::extract::{ApiJson, AuthUser, Caller, Client, admin_token, bearer_token};
use super::upload::read_image;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::db::User;
use crate::domain::BillingAddress;
use crate::services::auth_service::{
    AdminGrant, AdminSecret, AuthSession, ProfileUpdate, RegisterRequest,
};
use crate::services::upload::AVATAR_FOLDER;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginRequest {
    pub admin_secret: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <token>` to an account and stores it in the
/// request extensions for the [`Caller`] extractor.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?
        .to_string();

    let user = state.shared.auth.authenticate(&token).await?;
    tracing::Span::current().record("user_id", user.id.value());

    request.extensions_mut().insert(AuthUser { user, token });
    Ok(next.run(request).await)
}

/// Requires an elevated grant in `X-Admin-Token` issued to the caller.
/// Must run inside [`auth_middleware`].
pub async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = request
        .extensions()
        .get::<AuthUser>()
        .map(|auth| auth.user.id)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let grant = admin_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Admin token required"))?;

    state.shared.auth.verify_admin_grant(user_id, grant).await?;
    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Client(client): Client,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.shared.auth.register(&client, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(session))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Client(client): Client,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthSession>>, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let session = state
        .shared
        .auth
        .login(&client, &payload.email, &payload.password)
        .await?;
    Ok(Json(ApiResponse::success(session)))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .auth
        .logout(caller.user.id, &caller.token)
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Logged out successfully",
    ))))
}

/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.shared.auth.me(caller.user.id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /auth/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    ApiJson(payload): ApiJson<ProfileUpdate>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state
        .shared
        .auth
        .update_profile(&caller.ctx, payload)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /auth/billing-address
pub async fn update_billing_address(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    ApiJson(payload): ApiJson<BillingAddress>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state
        .shared
        .auth
        .update_billing_address(&caller.ctx, payload)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .auth
        .change_password(
            &caller.ctx,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password changed successfully",
    ))))
}

/// POST /auth/avatar (multipart field `avatar`)
pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    multipart: Multipart,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let file = read_image(multipart, "avatar").await?;
    let stored = state.shared.uploads.upload_image(AVATAR_FOLDER, file).await?;
    let user = state.shared.auth.set_avatar(&caller.ctx, stored.url).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/admin/register
pub async fn admin_register(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let secret: AdminSecret = state.shared.auth.register_admin(&caller.ctx).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(secret))))
}

/// POST /auth/admin/login
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    ApiJson(payload): ApiJson<AdminLoginRequest>,
) -> Result<Json<ApiResponse<AdminGrant>>, ApiError> {
    if payload.admin_secret.trim().is_empty() {
        return Err(ApiError::validation("Admin secret is required"));
    }

    let grant = state
        .shared
        .auth
        .admin_login(&caller.ctx, payload.admin_secret.trim())
        .await?;
    Ok(Json(ApiResponse::success(grant)))
}

/// POST /auth/admin/logout
pub async fn admin_logout(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if let Some(grant) = admin_token(&headers) {
        state.shared.auth.admin_logout(caller.user.id, grant).await?;
    }
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Admin logged out successfully",
    ))))
}
