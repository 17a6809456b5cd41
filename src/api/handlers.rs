//! HTTP handlers for the Crypto Analyzer API.
//!
//! Thin presentation adapters over the analytics service: they validate
//! input, map the core's tagged results onto status codes (not-found and
//! invalid input stay distinct) and round normalized values for display.

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::state::AppState;
use crate::application::{stats, AnalyticsError};
use crate::domain::{DayHighestRange, NormalizedStats, SymbolStats};

#[allow(unused_imports)]
use serde_json::json; // Used in utoipa::path examples

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
    /// Number of price observations currently in the store
    pub records: usize,
    pub dependencies: HealthDependencies,
}

#[derive(Serialize, ToSchema)]
pub struct HealthDependencies {
    pub store: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Full normalized-range ranking, descending
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RankingResponse {
    /// Ranking entries, highest normalized range first
    pub entries: Vec<NormalizedStats>,
    /// Number of distinct symbols ranked
    pub count: usize,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RateLimitResponse {
    pub limit: u32,
    pub remaining: u32,
    pub used: u32,
    pub reset: i64,
}

/// Query parameters for the per-day winner endpoint
#[derive(Debug, Clone, Deserialize, IntoParams, Validate)]
pub struct DailyHighestRangeQuery {
    /// UTC calendar day in strict ISO format (YYYY-MM-DD)
    #[param(example = "2022-01-01")]
    #[validate(length(min = 1, max = 10))]
    pub date: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Health check passed", body = HealthResponse),
        (status = 503, description = "Service degraded or unavailable", body = HealthResponse)
    )
)]
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (store_status, records) = match state.analytics.record_count().await {
        Ok(count) => ("healthy", count),
        Err(_) => ("error", 0),
    };

    let overall_status = if store_status == "healthy" { "ok" } else { "degraded" };

    let response = HealthResponse {
        status: overall_status.to_string(),
        version: VERSION.to_string(),
        backend: "rust-axum-onion".to_string(),
        records,
        dependencies: HealthDependencies {
            store: store_status.to_string(),
        },
    };

    if overall_status == "ok" {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "system",
    responses(
        (status = 200, description = "Prometheus metrics", content_type = "text/plain")
    )
)]
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.render()
}

/// Get the caller's rate limit status.
///
/// Returns the sliding-window budget for the requesting client address,
/// useful for debugging 429 responses.
#[utoipa::path(
    get,
    path = "/rate-limit",
    tag = "system",
    responses(
        (status = 200, description = "Rate limit status retrieved successfully", body = RateLimitResponse,
            example = json!({"limit": 60, "remaining": 57, "used": 3, "reset": 1735678800})
        )
    )
)]
pub async fn rate_limit_handler(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Json<RateLimitResponse> {
    let stats = state.rate_limiter.stats_for(addr.ip()).await;
    Json(RateLimitResponse {
        limit: stats.limit,
        remaining: stats.remaining,
        used: stats.used,
        reset: stats.reset,
    })
}

/// Get oldest/newest/min/max statistics for one symbol
#[utoipa::path(
    get,
    path = "/v1/api/cryptos/{symbol}/stats",
    params(
        ("symbol" = String, Path, description = "Ticker symbol, matched exactly (case-sensitive)", example = "BTC")
    ),
    tag = "cryptos",
    responses(
        (status = 200, description = "Statistics for the symbol's full price series", body = SymbolStats,
            example = json!({
                "symbol": "BTC",
                "oldest_price": "46813.21",
                "newest_price": "38415.91",
                "min_price": "34875.00",
                "max_price": "47222.66"
            })
        ),
        (status = 400, description = "Malformed symbol", body = ErrorResponse),
        (status = 404, description = "No records for this symbol", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn symbol_stats_handler(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SymbolStats>, (StatusCode, Json<ErrorResponse>)> {
    if !is_valid_symbol(&symbol) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid symbol: {}", symbol),
                details: Some("symbols are 1-16 ASCII alphanumeric characters".to_string()),
            }),
        ));
    }

    metrics::counter!("api_requests_total", "endpoint" => "symbol_stats").increment(1);

    match state.analytics.symbol_stats(&symbol).await {
        Ok(Some(stats)) => Ok(Json(stats)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No records found for symbol: {}", symbol),
                details: None,
            }),
        )),
        Err(e) => Err(map_analytics_error("Failed to compute symbol stats", e)),
    }
}

/// Get the full ranking of symbols by normalized range, descending
#[utoipa::path(
    get,
    path = "/v1/api/cryptos/ranking",
    tag = "cryptos",
    responses(
        (status = 200, description = "All symbols ranked by normalized range, highest first", body = RankingResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn ranking_handler(
    State(state): State<AppState>,
) -> Result<Json<RankingResponse>, (StatusCode, Json<ErrorResponse>)> {
    metrics::counter!("api_requests_total", "endpoint" => "ranking").increment(1);

    match state.analytics.ranked_by_normalized_range().await {
        Ok(ranking) => {
            let entries: Vec<NormalizedStats> = ranking.into_iter().map(display_rounded).collect();
            let count = entries.len();
            Ok(Json(RankingResponse { entries, count }))
        }
        Err(e) => Err(map_analytics_error("Failed to compute ranking", e)),
    }
}

/// Get the symbol with the highest normalized range across the whole dataset
#[utoipa::path(
    get,
    path = "/v1/api/cryptos/highest-range",
    tag = "cryptos",
    responses(
        (status = 200, description = "Top ranking entry", body = NormalizedStats),
        (status = 404, description = "Dataset is empty", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn highest_range_handler(
    State(state): State<AppState>,
) -> Result<Json<NormalizedStats>, (StatusCode, Json<ErrorResponse>)> {
    metrics::counter!("api_requests_total", "endpoint" => "highest_range").increment(1);

    match state.analytics.ranked_by_normalized_range().await {
        Ok(ranking) => match ranking.into_iter().next() {
            Some(top) => Ok(Json(display_rounded(top))),
            None => Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "No records found.".to_string(),
                    details: None,
                }),
            )),
        },
        Err(e) => Err(map_analytics_error("Failed to compute highest range", e)),
    }
}

/// Get the symbol with the highest normalized range for one UTC day
#[utoipa::path(
    get,
    path = "/v1/api/cryptos/highest-range/daily",
    params(DailyHighestRangeQuery),
    tag = "cryptos",
    responses(
        (status = 200, description = "Winner of the requested day", body = DayHighestRange,
            example = json!({"symbol": "ETH", "normalized_value": "0.029"})
        ),
        (status = 400, description = "Malformed date (must be YYYY-MM-DD)", body = ErrorResponse),
        (status = 404, description = "No records for that day", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(date = %query.date))]
pub async fn daily_highest_range_handler(
    Query(query): Query<DailyHighestRangeQuery>,
    State(state): State<AppState>,
) -> Result<Json<DayHighestRange>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(validation_errors) = query.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Validation failed".to_string(),
                details: Some(format!("{:?}", validation_errors)),
            }),
        ));
    }

    metrics::counter!("api_requests_total", "endpoint" => "daily_highest_range").increment(1);

    match state.analytics.highest_range_for_day(&query.date).await {
        Ok(Some(winner)) => Ok(Json(DayHighestRange {
            symbol: winner.symbol,
            normalized_value: stats::display_round(winner.normalized_value),
        })),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No records found for the specified date.".to_string(),
                details: None,
            }),
        )),
        Err(e) => Err(map_analytics_error("Failed to compute day winner", e)),
    }
}

/// Symbols are short ASCII alphanumeric tickers; anything else is a caller
/// error, distinct from a well-formed symbol that has no data.
fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty() && symbol.len() <= 16 && symbol.chars().all(|c| c.is_ascii_alphanumeric())
}

fn display_rounded(entry: NormalizedStats) -> NormalizedStats {
    NormalizedStats {
        normalized_value: stats::display_round(entry.normalized_value),
        ..entry
    }
}

fn map_analytics_error(
    context: &str,
    err: AnalyticsError,
) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        AnalyticsError::InvalidDate(_) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: err.to_string(),
                details: None,
            }),
        ),
        AnalyticsError::Store(e) => {
            tracing::error!("{}: {:#}", context, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: context.to_string(),
                    details: Some(e.to_string()),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_validation_accepts_tickers_and_rejects_junk() {
        assert!(is_valid_symbol("BTC"));
        assert!(is_valid_symbol("DOGE"));
        assert!(is_valid_symbol("X2"));
        assert!(!is_valid_symbol(""));
        assert!(!is_valid_symbol("BTC/USD"));
        assert!(!is_valid_symbol("..%2e"));
        assert!(!is_valid_symbol(&"A".repeat(17)));
    }
}
