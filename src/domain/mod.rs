//! Domain layer - core entities and repository traits.
//!
//! This module defines the price-series domain model for the Crypto Analyzer
//! API, following clean architecture principles. It contains:
//! - `PriceRecord`, the immutable price observation
//! - Derived statistics types produced by the analytics engine
//! - The `PriceRepository` trait implemented by the storage backend

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single price observation for one symbol at one instant.
///
/// Identity is the pair (symbol, timestamp); ingesting a record with an
/// existing identity replaces the stored price (upsert semantics). The
/// analytics core only ever reads records - mutation belongs to the
/// ingestion loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceRecord {
    /// Ticker symbol (e.g. "BTC"). Grouping matches exact, case-sensitive.
    pub symbol: String,
    /// Milliseconds since the Unix epoch, UTC.
    pub timestamp: i64,
    /// Observed price. Non-negative.
    pub price: Decimal,
}

impl PriceRecord {
    pub fn new(symbol: impl Into<String>, timestamp: i64, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            price,
        }
    }
}

/// Descriptive statistics over one symbol's full price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SymbolStats {
    /// Ticker symbol the statistics were computed for
    pub symbol: String,
    /// Price of the earliest observation
    pub oldest_price: Decimal,
    /// Price of the latest observation
    pub newest_price: Decimal,
    /// Lowest observed price
    pub min_price: Decimal,
    /// Highest observed price
    pub max_price: Decimal,
}

/// One ranking entry: a symbol with its price extremes and the normalized
/// range `(max - min) / min`.
///
/// Derived on every query and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NormalizedStats {
    /// Ticker symbol
    pub symbol: String,
    /// Lowest observed price
    pub min_price: Decimal,
    /// Highest observed price
    pub max_price: Decimal,
    /// `(max_price - min_price) / min_price`, zero when `min_price` is zero
    pub normalized_value: Decimal,
}

/// Winner of a day-window query: the symbol with the highest normalized
/// range among one UTC calendar day's observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DayHighestRange {
    /// Ticker symbol
    pub symbol: String,
    /// Normalized range over that day's observations
    pub normalized_value: Decimal,
}

/// Repository trait for price observations.
///
/// The store is key-ordered on (symbol, timestamp). Implementations must be
/// thread-safe (`Send + Sync`) for use in async contexts; read consistency
/// under concurrent ingestion is the implementation's responsibility, not
/// the caller's.
///
/// # Implementations
///
/// See `infrastructure::memory_store::InMemoryPriceStore` for the in-memory
/// implementation populated by the CSV loader at startup.
#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// All observations for one symbol, ordered by timestamp.
    ///
    /// An unknown symbol yields an empty vector, not an error.
    async fn find_by_symbol(&self, symbol: &str) -> anyhow::Result<Vec<PriceRecord>>;

    /// All observations with `start <= timestamp <= end`, both bounds
    /// inclusive.
    async fn find_by_timestamp_range(&self, start: i64, end: i64)
        -> anyhow::Result<Vec<PriceRecord>>;

    /// Every stored observation.
    async fn find_all(&self) -> anyhow::Result<Vec<PriceRecord>>;

    /// Insert a record, or replace the price of an existing
    /// (symbol, timestamp) identity.
    async fn upsert(&self, record: PriceRecord) -> anyhow::Result<()>;

    /// Number of stored observations.
    async fn count(&self) -> anyhow::Result<usize>;
}
