use crate::{AppState, api::users, health, telemetry};

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness))
        .route("/metrics", get(telemetry::render))
        .route("/v1/whoami", get(users::whoami))
        .route("/v1/u/{username}", get(users::get_user).put(users::put_user))
        .route(
            "/v1/u/{username}/groups",
            get(users::get_groups).put(users::put_groups),
        )
        .route("/v1/u/{username}/public-keys", put(users::put_public_keys))
        .route(
            "/v1/u/{username}/groups/refresh",
            post(users::refresh_groups),
        )
        .with_state(state)
        .layer(middleware::from_fn(telemetry::track_requests))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
