use crate::AppState;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    let pool = &state.pool;
    let status = if pool.is_closed() { "closed" } else { "operational" };

    let health = json!({
        "status": if pool.is_closed() { "unhealthy" } else { "healthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "components": {
            "database": {
                "status": status,
                "capacity": pool.capacity(),
                "live": pool.live_count(),
                "idle": pool.idle_count(),
            },
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(health)).into_response()
}

/// GET /live - the process answers
pub async fn liveness() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// GET /ready - the store pool accepts sessions
pub async fn readiness(State(state): State<AppState>) -> Response {
    if state.pool.is_closed() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Not ready").into_response();
    }
    (StatusCode::OK, "Ready").into_response()
}
