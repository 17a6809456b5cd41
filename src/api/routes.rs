use crate::api::doc::ApiDoc;
use crate::api::handlers::{
    daily_highest_range_handler, health_handler, highest_range_handler, metrics_handler,
    ranking_handler, rate_limit_handler, symbol_stats_handler,
};
use crate::api::middleware::client_rate_limit;
use crate::api::state::AppState;
use axum::{routing::get, Router};

use axum::http::HeaderValue;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn create_router(state: AppState, allowed_origins: String) -> Router {
    // Configure CORS based on configuration
    let cors = if allowed_origins == "*" {
        CorsLayer::permissive()
    } else {
        // Parse comma-separated origins, filter out invalid ones
        let origin_values: Vec<HeaderValue> = allowed_origins
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse::<HeaderValue>().ok()
                }
            })
            .collect();

        if origin_values.is_empty() {
            tracing::warn!("No valid CORS origins found, falling back to permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origin_values))
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    // Middleware stack with security headers and observability
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::span!(
                        Level::INFO,
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: Duration,
                     _span: &tracing::Span| {
                        let status = response.status().as_u16();

                        metrics::counter!(
                            "http_requests_total",
                            "status" => status.to_string(),
                            "status_class" => format!("{}xx", status / 100)
                        )
                        .increment(1);
                        metrics::histogram!(
                            "http_request_duration_seconds",
                            "status" => status.to_string()
                        )
                        .record(latency.as_secs_f64());

                        if latency.as_millis() > 1000 {
                            tracing::warn!("Slow HTTP request: {}ms", latency.as_millis());
                        }
                    },
                )
                .on_failure(
                    |_error: tower_http::classify::ServerErrorsFailureClass,
                     _latency: Duration,
                     _span: &tracing::Span| {
                        metrics::counter!("http_requests_total", "status" => "error", "status_class" => "5xx")
                            .increment(1);
                    },
                ),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(60),
        ))
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(cors);

    // Analytics routes sit behind the per-client rate limiter; system
    // endpoints stay outside it.
    let cryptos = Router::new()
        .route("/v1/api/cryptos/ranking", get(ranking_handler))
        .route("/v1/api/cryptos/highest-range", get(highest_range_handler))
        .route(
            "/v1/api/cryptos/highest-range/daily",
            get(daily_highest_range_handler),
        )
        .route("/v1/api/cryptos/{symbol}/stats", get(symbol_stats_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            client_rate_limit,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // System endpoints (no versioning)
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/rate-limit", get(rate_limit_handler))
        // OpenAPI spec (downloadable)
        .route("/v1/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .merge(cryptos)
        .layer(middleware)
        .with_state(state)
}
