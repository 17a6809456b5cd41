//! Crypto Analyzer API
//!
//! A REST API for descriptive statistics over historical cryptocurrency
//! price series, with per-client rate limiting and Prometheus observability.
//!
//! # Architecture
//!
//! The API follows clean/onion architecture with clear separation of concerns:
//! - **Domain**: Price observations, derived statistics and the repository trait
//! - **Application**: The aggregation/ranking/day-window analytics engine
//! - **Infrastructure**: In-memory price store, CSV ingestion, rate limiter
//! - **API**: HTTP handlers, routing, and middleware
//!
//! # Configuration
//!
//! The API is configured via `config.yaml` and environment variables:
//! - `PRICES_PATH`: Directory of `timestamp,symbol,price` CSV files loaded at
//!   startup (default: `data/prices`)
//! - `PORT`: Overrides the configured listen port
//! - `RUST_LOG`: Logging level (default: info)
//! - `LOG_FORMAT`: `text` or `json`
//!
//! # Quick Start
//!
//! ```bash
//! # Run the server
//! cargo run --release
//!
//! # Test endpoints
//! curl http://localhost:3000/health
//! curl http://localhost:3000/v1/api/cryptos/BTC/stats
//! curl http://localhost:3000/v1/api/cryptos/ranking
//! curl "http://localhost:3000/v1/api/cryptos/highest-range/daily?date=2022-01-01"
//! ```

mod api;
mod application;
mod domain;
mod infrastructure;

use crate::api::routes::create_router;
use crate::api::state::AppState;
use crate::application::AnalyticsService;
use crate::infrastructure::{ClientRateLimiter, InMemoryPriceStore, PriceFileLoader};
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Top-level application configuration loaded from `config.yaml`.
#[derive(Deserialize, Debug, Clone)]
struct Config {
    /// Server configuration (host, port, CORS origins)
    server: ServerConfig,
    /// Per-client rate limiting configuration
    #[serde(default)]
    rate_limit: RateLimitConfig,
    /// Price file ingestion configuration
    #[serde(default)]
    prices: PricesConfig,
}

/// Rate limiting configuration
#[derive(Deserialize, Debug, Clone)]
struct RateLimitConfig {
    /// Maximum requests per minute for each client address
    #[serde(default = "default_requests_per_minute")]
    requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

fn default_requests_per_minute() -> u32 {
    60
}

/// Price file ingestion configuration
#[derive(Deserialize, Debug, Clone)]
struct PricesConfig {
    /// Directory of CSV price files loaded at startup
    #[serde(default = "default_prices_dir")]
    dir: String,
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            dir: default_prices_dir(),
        }
    }
}

fn default_prices_dir() -> String {
    "data/prices".to_string()
}

/// Server configuration settings.
#[derive(Deserialize, Debug, Clone)]
struct ServerConfig {
    /// Host address to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    host: String,
    /// Port number to listen on (default: 3000)
    #[serde(default = "default_port")]
    port: u16,
    /// Comma-separated list of allowed CORS origins (default: "*")
    #[serde(default = "default_allowed_origins")]
    allowed_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_allowed_origins() -> String {
    "*".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load Config
    let config_content = fs::read_to_string("config.yaml")
        .context("Failed to read config.yaml - ensure file exists in working directory")?;
    let config: Config = serde_yaml::from_str(&config_content)
        .context("Failed to parse config.yaml - check YAML syntax and structure")?;

    // Metrics recorder is installed once; its handle renders /metrics.
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    // Infrastructure
    let store = Arc::new(InMemoryPriceStore::new());

    let prices_path = env::var("PRICES_PATH").unwrap_or_else(|_| config.prices.dir.clone());
    let loader = PriceFileLoader::new(&prices_path);
    if loader.is_available() {
        let loaded = loader
            .load_into(store.as_ref())
            .await
            .with_context(|| format!("Failed to load price files from {}", prices_path))?;
        tracing::info!("Loaded {} price records from {}", loaded, prices_path);
    } else {
        tracing::warn!(
            "Prices directory not available at: {}, starting with an empty store",
            prices_path
        );
    }

    let rate_limiter = Arc::new(ClientRateLimiter::new(config.rate_limit.requests_per_minute));
    tracing::info!(
        "Rate limiter initialized: {} requests/minute per client",
        config.rate_limit.requests_per_minute
    );

    // Application
    let analytics = Arc::new(AnalyticsService::new(store));

    let state = AppState {
        analytics,
        rate_limiter,
        metrics: metrics_handle,
    };

    let app = create_router(state, config.server.allowed_origins.clone());

    // Allow PORT env var override
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server.port);
    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;
    tracing::info!("Crypto Analyzer API server running at http://{}", addr);

    // Graceful shutdown handling; connect-info feeds the per-client limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error during operation")?;

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C) to initiate graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
