use idm_auth::Authorizer;
use idm_store::StorePool;

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: StorePool,
    pub authorizer: Arc<Authorizer>,
    /// Absent when no recorder was installed (tests)
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(pool: StorePool, authorizer: Arc<Authorizer>) -> Self {
        Self {
            pool,
            authorizer,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
