//! Request-level middleware.

use crate::api::handlers::ErrorResponse;
use crate::api::state::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;

/// Reject requests from clients that exhausted their per-minute window.
///
/// Keyed by client IP; unaffected clients keep their own budget. Applied to
/// the analytics routes only, so health checks and metrics scrapes stay
/// reachable under load.
pub async fn client_rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if state.rate_limiter.check_and_record(addr.ip()).await {
        next.run(request).await
    } else {
        tracing::warn!("rate limit exceeded for client: {}", addr.ip());
        metrics::counter!("rate_limit_rejections_total").increment(1);
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Rate limit exceeded! Please try again later.".to_string(),
                details: None,
            }),
        )
            .into_response()
    }
}
