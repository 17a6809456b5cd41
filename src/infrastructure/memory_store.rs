//! In-memory price store.
//!
//! A key-ordered store over (symbol, timestamp), the identity of a price
//! observation. The dataset is loaded once at startup and read many times,
//! so an async `RwLock` around a `BTreeMap` is all the coordination needed;
//! a persistent backend would simply be another `PriceRepository`
//! implementation.

use crate::domain::{PriceRecord, PriceRepository};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryPriceStore {
    records: RwLock<BTreeMap<(String, i64), Decimal>>,
}

impl InMemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PriceRepository for InMemoryPriceStore {
    async fn find_by_symbol(&self, symbol: &str) -> anyhow::Result<Vec<PriceRecord>> {
        let records = self.records.read().await;
        let lower = Bound::Included((symbol.to_string(), i64::MIN));
        let upper = Bound::Included((symbol.to_string(), i64::MAX));
        Ok(records
            .range((lower, upper))
            .map(|((symbol, timestamp), price)| {
                PriceRecord::new(symbol.clone(), *timestamp, *price)
            })
            .collect())
    }

    async fn find_by_timestamp_range(
        &self,
        start: i64,
        end: i64,
    ) -> anyhow::Result<Vec<PriceRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|((_, timestamp), _)| (start..=end).contains(timestamp))
            .map(|((symbol, timestamp), price)| {
                PriceRecord::new(symbol.clone(), *timestamp, *price)
            })
            .collect())
    }

    async fn find_all(&self) -> anyhow::Result<Vec<PriceRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .map(|((symbol, timestamp), price)| {
                PriceRecord::new(symbol.clone(), *timestamp, *price)
            })
            .collect())
    }

    async fn upsert(&self, record: PriceRecord) -> anyhow::Result<()> {
        let mut records = self.records.write().await;
        records.insert((record.symbol, record.timestamp), record.price);
        Ok(())
    }

    async fn count(&self) -> anyhow::Result<usize> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn upsert_replaces_the_price_of_an_existing_identity() {
        let store = InMemoryPriceStore::new();
        store
            .upsert(PriceRecord::new("BTC", 1000, dec!(46813.21)))
            .await
            .expect("upsert");
        store
            .upsert(PriceRecord::new("BTC", 1000, dec!(46999.99)))
            .await
            .expect("upsert");

        let records = store.find_by_symbol("BTC").await.expect("lookup");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, dec!(46999.99));
        assert_eq!(store.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn symbol_lookup_is_exact_and_timestamp_ordered() {
        let store = InMemoryPriceStore::new();
        store
            .upsert(PriceRecord::new("BTC", 2000, dec!(47000)))
            .await
            .expect("upsert");
        store
            .upsert(PriceRecord::new("BTC", 1000, dec!(46000)))
            .await
            .expect("upsert");
        store
            .upsert(PriceRecord::new("ETH", 1500, dec!(3700)))
            .await
            .expect("upsert");

        let records = store.find_by_symbol("BTC").await.expect("lookup");
        let timestamps: Vec<i64> = records.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![1000, 2000]);

        assert!(store.find_by_symbol("btc").await.expect("lookup").is_empty());
        assert!(store.find_by_symbol("BT").await.expect("lookup").is_empty());
    }

    #[tokio::test]
    async fn timestamp_range_includes_both_bounds() {
        let store = InMemoryPriceStore::new();
        for (timestamp, price) in [(100, dec!(1)), (200, dec!(2)), (300, dec!(3))] {
            store
                .upsert(PriceRecord::new("XRP", timestamp, price))
                .await
                .expect("upsert");
        }

        let records = store.find_by_timestamp_range(100, 200).await.expect("lookup");
        let timestamps: Vec<i64> = records.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![100, 200]);

        assert!(store
            .find_by_timestamp_range(301, 400)
            .await
            .expect("lookup")
            .is_empty());
    }

    #[tokio::test]
    async fn find_all_returns_every_record() {
        let store = InMemoryPriceStore::new();
        store
            .upsert(PriceRecord::new("BTC", 1, dec!(46000)))
            .await
            .expect("upsert");
        store
            .upsert(PriceRecord::new("ETH", 1, dec!(3700)))
            .await
            .expect("upsert");

        assert_eq!(store.find_all().await.expect("lookup").len(), 2);
    }
}
