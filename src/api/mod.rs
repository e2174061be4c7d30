use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod admin;
pub mod auth;
mod error;
pub mod extract;
mod items;
mod notifications;
mod observability;
mod system;
mod types;
mod upload;
mod validation;

pub use error::ApiError;
pub use types::*;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, max_body, max_upload) = {
        let server = &state.config().server;
        (
            server.cors_allowed_origins.clone(),
            server.max_body_bytes,
            server.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        )
    };

    let api_router = Router::new()
        .merge(create_admin_router(state.clone()))
        .merge(create_protected_router(state.clone(), max_upload))
        .route("/health", get(system::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>, max_upload: usize) -> Router<Arc<AppState>> {
    let uploads = Router::new()
        .route("/auth/avatar", post(auth::upload_avatar))
        .route("/upload", post(upload::upload_image))
        .layer(DefaultBodyLimit::max(max_upload));

    Router::new()
        .merge(uploads)
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", put(auth::update_profile))
        .route("/auth/billing-address", put(auth::update_billing_address))
        .route("/auth/change-password", put(auth::change_password))
        .route("/auth/admin/register", post(auth::admin_register))
        .route("/auth/admin/login", post(auth::admin_login))
        .route("/items", get(items::list_items))
        .route("/items", post(items::create_item))
        .route("/items/{id}", get(items::get_item))
        .route("/items/{id}", put(items::update_item))
        .route("/items/{id}", delete(items::delete_item))
        .route("/items/{id}/invoice", post(items::generate_invoice))
        .route("/items/{id}/send-email", post(items::send_invoice_email))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .route(
            "/notifications/{id}",
            delete(notifications::delete_notification),
        )
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/admin/logout", post(auth::admin_logout))
        .route("/admin/stats", get(admin::get_stats))
        .route("/admin/items", get(admin::list_items))
        .route("/admin/items/{id}", delete(admin::delete_item))
        .route("/admin/audit-logs", get(admin::get_audit_logs))
        .route("/admin/user-activity", get(admin::get_user_activity))
        // Layers run bottom-up: the bearer check wraps the grant check
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::admin_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
