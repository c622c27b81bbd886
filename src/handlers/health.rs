// handlers/health.rs - service root and liveness

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::{ApiError, ErrorBody};
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - service description
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let prefix = &state.config.api.prefix;

    Json(json!({
        "success": true,
        "message": format!("Welcome to {}", state.config.api.project_name),
        "data": {
            "name": state.config.api.project_name,
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": format!("{}/health (public)", prefix),
                "items": format!("{}/items[/:id] (bearer token)", prefix),
                "openapi": format!("{}/openapi.json (public)", prefix),
                "docs": format!("{}/docs (public)", prefix),
            }
        }
    }))
}

/// Liveness plus reachability of the external store
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and store reachable"),
        (status = 503, description = "Store unreachable", body = ErrorBody)
    )
)]
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    if let Err(e) = state.items.ping().await {
        tracing::warn!("Health check could not reach store: {}", e);
        return Err(ApiError::service_unavailable("store unavailable"));
    }

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "store": "ok"
    })))
}

/// JSON 404 for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
