//! CSV price file ingestion.
//!
//! Reads every `*.csv` file in the configured prices directory and upserts
//! its rows into the price store. Files follow the exchange-export layout:
//! a `timestamp,symbol,price` header, then one observation per row. Falls
//! back gracefully when a single file is unreadable.

use crate::domain::{PriceRecord, PriceRepository};
use anyhow::Context;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One row of a price CSV file, mapped by header name.
#[derive(Debug, serde::Deserialize)]
struct PriceRow {
    timestamp: i64,
    symbol: String,
    price: Decimal,
}

/// Loader over a directory of price CSV files.
pub struct PriceFileLoader {
    base_path: PathBuf,
}

impl PriceFileLoader {
    /// Create a new loader.
    ///
    /// # Arguments
    ///
    /// * `base_path` - Directory holding the price files (e.g. "data/prices")
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Check if the prices directory exists and is accessible.
    pub fn is_available(&self) -> bool {
        self.base_path.exists() && self.base_path.is_dir()
    }

    /// Load every CSV file in the prices directory into the store.
    ///
    /// A file that cannot be read or parsed is logged and skipped so the
    /// remaining files still load. Returns the number of upserted rows,
    /// which can exceed the store's record count when files repeat a
    /// (symbol, timestamp) identity.
    pub async fn load_into(&self, repo: &dyn PriceRepository) -> anyhow::Result<usize> {
        let mut loaded = 0usize;
        let mut dir = tokio::fs::read_dir(&self.base_path).await.with_context(|| {
            format!("failed to read prices directory {}", self.base_path.display())
        })?;

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            match load_file(&path, repo).await {
                Ok(count) => {
                    info!("loaded {} price records from {}", count, path.display());
                    loaded += count;
                }
                Err(e) => warn!("skipping {}: {:#}", path.display(), e),
            }
        }
        Ok(loaded)
    }
}

async fn load_file(path: &Path, repo: &dyn PriceRepository) -> anyhow::Result<usize> {
    let records = parse_price_file(path)?;
    let count = records.len();
    for record in records {
        repo.upsert(record).await?;
    }
    Ok(count)
}

/// Parse one `timestamp,symbol,price` CSV file.
///
/// Blank lines are ignored; a malformed row fails the whole file rather
/// than silently dropping observations.
pub fn parse_price_file(path: &Path) -> anyhow::Result<Vec<PriceRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut records = Vec::new();
    for row in reader.deserialize::<PriceRow>() {
        let row = row.with_context(|| format!("malformed row in {}", path.display()))?;
        records.push(PriceRecord::new(row.symbol, row.timestamp, row.price));
    }
    Ok(records)
}
