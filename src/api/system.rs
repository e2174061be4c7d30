use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// GET /health
///
/// Liveness only. The database is pinged and the result logged, but a
/// failing ping does not change the answer.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    if let Err(e) = state.shared.store.ping().await {
        tracing::warn!(error = %e, "Database ping failed during health check");
    }

    Json(HealthResponse {
        status: "OK",
        message: "Server is running",
    })
}
