//! Analytics over the stored price series: per-symbol statistics, the global
//! normalized-range ranking and the day-window winner query.

use crate::application::stats;
use crate::domain::{DayHighestRange, NormalizedStats, PriceRecord, PriceRepository, SymbolStats};
use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Length of the inclusive day window [00:00:00, 23:59:59] in milliseconds.
const DAY_WINDOW_MILLIS: i64 = 86_399_000;

/// Errors surfaced by the analytics engine.
///
/// Not-found is deliberately *not* represented here: a symbol or day without
/// data is a normal outcome and comes back as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// The caller supplied a date that is not strict ISO `YYYY-MM-DD`.
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
    /// The storage backend failed.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Read-side service over the price store.
///
/// All computations are pure reductions over sequences the store hands back;
/// the service holds no mutable state, so concurrent callers need no
/// synchronization here.
#[derive(Clone)]
pub struct AnalyticsService {
    price_repo: Arc<dyn PriceRepository>,
}

impl AnalyticsService {
    pub fn new(price_repo: Arc<dyn PriceRepository>) -> Self {
        Self { price_repo }
    }

    /// Number of stored observations, used by the health check.
    pub async fn record_count(&self) -> anyhow::Result<usize> {
        self.price_repo.count().await
    }

    /// Oldest/newest/min/max statistics for one symbol, `None` when the
    /// symbol has no observations. Matching is exact and case-sensitive.
    pub async fn symbol_stats(&self, symbol: &str) -> Result<Option<SymbolStats>, AnalyticsError> {
        debug!("computing stats for symbol: {}", symbol);
        let records = self.price_repo.find_by_symbol(symbol).await?;
        let (Some(oldest), Some(newest)) = (stats::oldest(&records), stats::newest(&records))
        else {
            return Ok(None);
        };
        Ok(Some(SymbolStats {
            symbol: symbol.to_string(),
            oldest_price: oldest.price,
            newest_price: newest.price,
            min_price: stats::min_price(&records),
            max_price: stats::max_price(&records),
        }))
    }

    /// Full ranking of all symbols by normalized range, descending.
    ///
    /// Grouping is key-ordered and the sort is stable, so exact ties come
    /// out in ascending symbol order (implementation-defined) and repeated
    /// calls on an unchanged dataset return identical output. An empty
    /// dataset yields an empty ranking.
    pub async fn ranked_by_normalized_range(
        &self,
    ) -> Result<Vec<NormalizedStats>, AnalyticsError> {
        let records = self.price_repo.find_all().await?;
        info!("ranking {} observations by normalized range", records.len());

        let mut ranking: Vec<NormalizedStats> = group_by_symbol(records)
            .into_iter()
            .map(|(symbol, group)| {
                let min = stats::min_price(&group);
                let max = stats::max_price(&group);
                NormalizedStats {
                    symbol,
                    min_price: min,
                    max_price: max,
                    normalized_value: stats::normalized_range(min, max, stats::RANKING_SCALE),
                }
            })
            .collect();
        ranking.sort_by(|a, b| b.normalized_value.cmp(&a.normalized_value));
        Ok(ranking)
    }

    /// The symbol with the highest normalized range among one UTC calendar
    /// day's observations.
    ///
    /// `date` must be strict ISO `YYYY-MM-DD`; anything else (including the
    /// `DD-MM-YYYY` shape) is invalid input, which callers can distinguish
    /// from a well-formed day that simply has no data (`Ok(None)`).
    pub async fn highest_range_for_day(
        &self,
        date: &str,
    ) -> Result<Option<DayHighestRange>, AnalyticsError> {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AnalyticsError::InvalidDate(date.to_string()))?;
        let start = day.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
        let end = start + DAY_WINDOW_MILLIS;

        let records = self.price_repo.find_by_timestamp_range(start, end).await?;
        if records.is_empty() {
            info!("no records found for day: {}", date);
            return Ok(None);
        }

        // First group wins exact ties, as the strict comparison keeps it.
        let winner = group_by_symbol(records)
            .into_iter()
            .map(|(symbol, group)| {
                let min = stats::min_price(&group);
                let max = stats::max_price(&group);
                DayHighestRange {
                    symbol,
                    normalized_value: stats::normalized_range(min, max, stats::RANKING_SCALE),
                }
            })
            .reduce(|best, candidate| {
                if candidate.normalized_value > best.normalized_value {
                    candidate
                } else {
                    best
                }
            });
        Ok(winner)
    }
}

/// Partition observations into per-symbol groups. `BTreeMap` keeps the
/// grouping key-ordered, which makes downstream iteration deterministic.
fn group_by_symbol(records: Vec<PriceRecord>) -> BTreeMap<String, Vec<PriceRecord>> {
    let mut groups: BTreeMap<String, Vec<PriceRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.symbol.clone()).or_default().push(record);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryPriceStore;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// 2022-01-01T00:00:00Z
    const JAN_1: i64 = 1_640_995_200_000;
    const HOUR: i64 = 3_600_000;
    const DAY: i64 = 86_400_000;

    async fn seed(store: &InMemoryPriceStore, symbol: &str, rows: &[(i64, Decimal)]) {
        for (timestamp, price) in rows {
            store
                .upsert(PriceRecord::new(symbol, *timestamp, *price))
                .await
                .expect("seed upsert");
        }
    }

    /// January 2022 dataset with five symbols. Full-month normalized ranges
    /// order as ETH > XRP > DOGE > LTC > BTC; on Jan 1 alone ETH wins.
    async fn january_store() -> Arc<InMemoryPriceStore> {
        let store = Arc::new(InMemoryPriceStore::new());
        seed(&store, "BTC", &[
            (JAN_1 + 4 * HOUR, dec!(46813.21)),
            (JAN_1 + 19 * HOUR, dec!(47222.66)),
            (JAN_1 + 23 * DAY, dec!(34875.00)),
            (JAN_1 + 30 * DAY, dec!(38415.91)),
        ])
        .await;
        seed(&store, "ETH", &[
            (JAN_1 + 4 * HOUR, dec!(3715.32)),
            (JAN_1 + 19 * HOUR, dec!(3823.82)),
            (JAN_1 + 23 * DAY, dec!(2336.52)),
            (JAN_1 + 30 * DAY, dec!(2598.70)),
        ])
        .await;
        seed(&store, "DOGE", &[
            (JAN_1, dec!(0.1702)),
            (JAN_1 + 19 * HOUR, dec!(0.1722)),
            (JAN_1 + 23 * DAY, dec!(0.1290)),
            (JAN_1 + 28 * DAY, dec!(0.1941)),
        ])
        .await;
        seed(&store, "LTC", &[
            (JAN_1, dec!(148.10)),
            (JAN_1 + 19 * HOUR, dec!(151.50)),
            (JAN_1 + 23 * DAY, dec!(103.40)),
            (JAN_1 + 30 * DAY, dec!(109.55)),
        ])
        .await;
        seed(&store, "XRP", &[
            (JAN_1, dec!(0.8298)),
            (JAN_1 + 19 * HOUR, dec!(0.8458)),
            (JAN_1 + 23 * DAY, dec!(0.5616)),
            (JAN_1 + 30 * DAY, dec!(0.6044)),
        ])
        .await;
        store
    }

    async fn january_service() -> AnalyticsService {
        AnalyticsService::new(january_store().await)
    }

    #[tokio::test]
    async fn symbol_stats_reduce_the_full_series() {
        let service = january_service().await;
        let stats = service
            .symbol_stats("BTC")
            .await
            .expect("store read")
            .expect("BTC is present");
        assert_eq!(stats.oldest_price, dec!(46813.21));
        assert_eq!(stats.newest_price, dec!(38415.91));
        assert_eq!(stats.min_price, dec!(34875.00));
        assert_eq!(stats.max_price, dec!(47222.66));
    }

    #[tokio::test]
    async fn unknown_symbol_is_not_found_not_an_error() {
        let service = january_service().await;
        assert_eq!(service.symbol_stats("ADA").await.expect("store read"), None);
        // Matching is case-sensitive, so a lowercase ticker is unknown too.
        assert_eq!(service.symbol_stats("btc").await.expect("store read"), None);
    }

    #[tokio::test]
    async fn ranking_is_descending_and_covers_every_symbol() {
        let service = january_service().await;
        let ranking = service.ranked_by_normalized_range().await.expect("store read");

        let symbols: Vec<&str> = ranking.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETH", "XRP", "DOGE", "LTC", "BTC"]);
        for pair in ranking.windows(2) {
            assert!(pair[0].normalized_value >= pair[1].normalized_value);
        }
    }

    #[tokio::test]
    async fn ranking_values_round_to_known_ratios() {
        let service = january_service().await;
        let ranking = service.ranked_by_normalized_range().await.expect("store read");

        let btc = ranking.iter().find(|e| e.symbol == "BTC").expect("BTC ranked");
        let eth = ranking.iter().find(|e| e.symbol == "ETH").expect("ETH ranked");
        assert_eq!(stats::display_round(btc.normalized_value), dec!(0.354));
        assert_eq!(stats::display_round(eth.normalized_value), dec!(0.637));
        assert!(eth.normalized_value > btc.normalized_value);
    }

    #[tokio::test]
    async fn ranking_is_idempotent_on_an_unchanged_dataset() {
        let service = january_service().await;
        let first = service.ranked_by_normalized_range().await.expect("store read");
        let second = service.ranked_by_normalized_range().await.expect("store read");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_dataset_yields_empty_ranking() {
        let service = AnalyticsService::new(Arc::new(InMemoryPriceStore::new()));
        assert!(service
            .ranked_by_normalized_range()
            .await
            .expect("store read")
            .is_empty());
    }

    #[tokio::test]
    async fn single_observation_normalizes_to_zero() {
        let store = Arc::new(InMemoryPriceStore::new());
        seed(&store, "SOL", &[(JAN_1, dec!(170.30))]).await;
        let service = AnalyticsService::new(store);

        let ranking = service.ranked_by_normalized_range().await.expect("store read");
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].normalized_value, Decimal::ZERO);
        assert_eq!(ranking[0].min_price, ranking[0].max_price);
    }

    #[tokio::test]
    async fn day_winner_for_a_populated_day() {
        let service = january_service().await;
        let winner = service
            .highest_range_for_day("2022-01-01")
            .await
            .expect("well-formed date")
            .expect("five symbols traded that day");
        // ETH moved 3715.32 -> 3823.82 on Jan 1, the widest relative swing.
        assert_eq!(winner.symbol, "ETH");
        assert!(winner.normalized_value > Decimal::ZERO);
    }

    #[tokio::test]
    async fn day_winner_equals_top_of_the_day_restricted_ranking() {
        let full = january_service().await;
        let winner = full
            .highest_range_for_day("2022-01-01")
            .await
            .expect("well-formed date")
            .expect("data present");

        // Rebuild a store holding only that day's observations and rank it.
        let day_store = Arc::new(InMemoryPriceStore::new());
        let day_records = january_store()
            .await
            .find_by_timestamp_range(JAN_1, JAN_1 + DAY - 1)
            .await
            .expect("store read");
        for record in day_records {
            day_store.upsert(record).await.expect("seed upsert");
        }
        let day_ranking = AnalyticsService::new(day_store)
            .ranked_by_normalized_range()
            .await
            .expect("store read");

        assert_eq!(day_ranking[0].symbol, winner.symbol);
        assert_eq!(day_ranking[0].normalized_value, winner.normalized_value);
    }

    #[tokio::test]
    async fn day_without_records_is_not_found() {
        let service = january_service().await;
        let result = service
            .highest_range_for_day("1999-01-01")
            .await
            .expect("well-formed date");
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn malformed_dates_are_invalid_input_not_not_found() {
        let service = january_service().await;
        for date in ["01-02-2022", "2022-13-01", "2022/01/01", "yesterday", ""] {
            let result = service.highest_range_for_day(date).await;
            assert!(
                matches!(result, Err(AnalyticsError::InvalidDate(_))),
                "expected InvalidDate for {:?}",
                date
            );
        }
    }

    #[tokio::test]
    async fn day_window_bounds_are_inclusive() {
        let store = Arc::new(InMemoryPriceStore::new());
        // Exactly 00:00:00 and exactly 23:59:59 on the queried day.
        seed(&store, "BTC", &[
            (JAN_1, dec!(46000.00)),
            (JAN_1 + DAY - 1000, dec!(47000.00)),
        ])
        .await;
        let service = AnalyticsService::new(store);

        let winner = service
            .highest_range_for_day("2022-01-01")
            .await
            .expect("well-formed date")
            .expect("both boundary records fall inside the window");
        // A single in-window observation would normalize to zero.
        assert!(winner.normalized_value > Decimal::ZERO);
    }
}
