use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // System handlers
        crate::api::handlers::health_handler,
        crate::api::handlers::metrics_handler,
        crate::api::handlers::rate_limit_handler,
        // Analytics handlers
        crate::api::handlers::symbol_stats_handler,
        crate::api::handlers::ranking_handler,
        crate::api::handlers::highest_range_handler,
        crate::api::handlers::daily_highest_range_handler
    ),
    components(
        schemas(
            crate::api::handlers::HealthResponse,
            crate::api::handlers::HealthDependencies,
            crate::api::handlers::RateLimitResponse,
            crate::api::handlers::RankingResponse,
            crate::api::handlers::ErrorResponse,
            crate::domain::PriceRecord,
            crate::domain::SymbolStats,
            crate::domain::NormalizedStats,
            crate::domain::DayHighestRange
        )
    ),
    tags(
        (name = "system", description = "System endpoints for health checks and metrics"),
        (name = "cryptos", description = "Cryptocurrency statistics and normalized-range rankings")
    ),
    info(
        title = "Crypto Analyzer API",
        version = "0.1.0",
        description = "REST API for descriptive statistics over historical cryptocurrency price series: per-symbol oldest/newest/min/max prices, a normalized-range ranking across all symbols, and a per-day winner query. Includes per-client rate limiting and Prometheus observability.",
    )
)]
pub struct ApiDoc;
