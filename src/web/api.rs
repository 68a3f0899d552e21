//! REST API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use mtpulse_core::accounts::Login;
use mtpulse_core::api::{AccountOverview, ApiError};
use mtpulse_core::snapshot::{AccountSnapshot, ErrorKind};
use mtpulse_core::PulseCore;

/// Shared state for API handlers
pub struct ApiState {
    pub core: Arc<PulseCore>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<serde_json::Value>)>;

/// Build a JSON error response with consistent format
fn json_error(status: StatusCode, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({"error": message})))
}

/// Map a facade error onto an HTTP status
fn api_error(err: ApiError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err.kind() {
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, &err.to_string())
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"ok": true}))
}

/// GET /accounts - roster with whatever the cache holds
pub async fn get_accounts(State(state): State<Arc<ApiState>>) -> Json<Vec<AccountOverview>> {
    Json(state.core.list_accounts())
}

/// GET /accounts/{login}
pub async fn get_account(
    State(state): State<Arc<ApiState>>,
    Path(login): Path<Login>,
) -> ApiResult<AccountOverview> {
    state.core.get_account(login).map(Json).map_err(api_error)
}

/// GET /accounts/{login}/snapshot - fetch from the terminal now
pub async fn get_snapshot(
    State(state): State<Arc<ApiState>>,
    Path(login): Path<Login>,
) -> ApiResult<AccountSnapshot> {
    match state.core.fetch_now(login).await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(e) => {
            tracing::debug!("On-demand fetch for {} failed: {}", login, e);
            Err(api_error(e))
        }
    }
}
