use crate::application::AnalyticsService;
use crate::infrastructure::ClientRateLimiter;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub analytics: Arc<AnalyticsService>,
    pub rate_limiter: Arc<ClientRateLimiter>,
    pub metrics: PrometheusHandle,
}
