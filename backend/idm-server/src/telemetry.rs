//! Prometheus exporter and HTTP request metrics.

use crate::AppState;
use crate::error::{Result as ServerErrorResult, ServerError};

use idm_store::CollectionMonitor;

use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::task::JoinHandle;

pub const HTTP_REQUESTS: &str = "idm.http.requests";
pub const HTTP_REQUEST_DURATION: &str = "idm.http.request_duration_seconds";

/// Install the global Prometheus recorder. Call once at startup.
#[track_caller]
pub fn install_recorder() -> ServerErrorResult<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::metrics(format!("Failed to install recorder: {e}")))?;

    describe_counter!(HTTP_REQUESTS, "HTTP requests by method and status");
    describe_histogram!(HTTP_REQUEST_DURATION, "HTTP request duration in seconds");
    describe_gauge!("idm.pool.idle", "Idle sessions held by a resource pool");
    describe_gauge!("idm.collection.size", "Number of records per collection");

    Ok(handle)
}

/// GET /metrics
pub async fn render(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

/// Middleware recording a counter and a latency histogram per request.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    counter!(HTTP_REQUESTS, "method" => method.clone(), "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION, "method" => method).record(start.elapsed().as_secs_f64());

    response
}

/// Report collection sizes every `interval` until the task is aborted.
pub fn spawn_collection_reporter(monitor: CollectionMonitor, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = monitor.report().await {
                log::warn!("Failed to report collection sizes: {}", e);
            }
        }
    })
}
