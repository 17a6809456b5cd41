//! Pure reductions over price series and the normalized-range calculator.
//!
//! Everything here is synchronous and total: callers hand in an
//! already-materialized slice of observations (assumed to share one symbol)
//! and get a deterministic answer back. Nothing is validated or mutated.

use crate::domain::PriceRecord;
use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits used when a normalized range is reported to clients.
pub const DISPLAY_SCALE: u32 = 3;

/// Fractional digits used when normalized ranges are compared or sorted.
///
/// Rounding to display scale first can collapse ratios that differ further
/// out and corrupt the ordering, so ranking always runs at this precision.
pub const RANKING_SCALE: u32 = 10;

/// Lowest price in the slice, `Decimal::ZERO` when it is empty.
pub fn min_price(records: &[PriceRecord]) -> Decimal {
    records
        .iter()
        .map(|r| r.price)
        .min()
        .unwrap_or(Decimal::ZERO)
}

/// Highest price in the slice, `Decimal::ZERO` when it is empty.
pub fn max_price(records: &[PriceRecord]) -> Decimal {
    records
        .iter()
        .map(|r| r.price)
        .max()
        .unwrap_or(Decimal::ZERO)
}

/// Observation with the smallest timestamp; ties go to the first encountered.
pub fn oldest(records: &[PriceRecord]) -> Option<&PriceRecord> {
    records.iter().min_by_key(|r| r.timestamp)
}

/// Observation with the largest timestamp; ties go to the last encountered.
pub fn newest(records: &[PriceRecord]) -> Option<&PriceRecord> {
    records.iter().max_by_key(|r| r.timestamp)
}

/// Normalized range `(max - min) / min`, rounded half-up to `scale`
/// fractional digits.
///
/// A zero minimum (which also covers the empty group, where both reductions
/// return zero) is a degenerate case, not an error: the ratio is defined as
/// zero by convention.
pub fn normalized_range(min: Decimal, max: Decimal, scale: u32) -> Decimal {
    if min <= Decimal::ZERO {
        tracing::debug!(%min, %max, "minimum price is not positive, normalized range defaults to 0");
        return Decimal::ZERO;
    }
    ((max - min) / min).round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a normalized value for presentation. Ordering decisions must be
/// made before calling this.
pub fn display_round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(symbol: &str, timestamp: i64, price: Decimal) -> PriceRecord {
        PriceRecord::new(symbol, timestamp, price)
    }

    #[test]
    fn reductions_over_btc_series() {
        let series = vec![
            record("BTC", 1, dec!(46813.21)),
            record("BTC", 2, dec!(46797.61)),
            record("BTC", 3, dec!(41743.58)),
        ];
        assert_eq!(oldest(&series).map(|r| r.price), Some(dec!(46813.21)));
        assert_eq!(newest(&series).map(|r| r.price), Some(dec!(41743.58)));
        assert_eq!(min_price(&series), dec!(41743.58));
        assert_eq!(max_price(&series), dec!(46813.21));
    }

    #[test]
    fn reductions_bound_every_observation() {
        let series = vec![
            record("ETH", 40, dec!(3715.32)),
            record("ETH", 10, dec!(2336.52)),
            record("ETH", 30, dec!(3823.82)),
            record("ETH", 20, dec!(2988.01)),
        ];
        let min = min_price(&series);
        let max = max_price(&series);
        let first = oldest(&series).expect("non-empty");
        let last = newest(&series).expect("non-empty");
        for r in &series {
            assert!(min <= r.price && r.price <= max);
            assert!(first.timestamp <= r.timestamp && r.timestamp <= last.timestamp);
        }
    }

    #[test]
    fn empty_sequence_yields_zero_and_none() {
        assert_eq!(min_price(&[]), Decimal::ZERO);
        assert_eq!(max_price(&[]), Decimal::ZERO);
        assert!(oldest(&[]).is_none());
        assert!(newest(&[]).is_none());
    }

    #[test]
    fn normalized_range_at_display_scale() {
        let range = normalized_range(dec!(34875.00), dec!(47222.66), DISPLAY_SCALE);
        assert_eq!(range, dec!(0.354));
    }

    #[test]
    fn normalized_range_rounds_midpoints_up() {
        // (1000.5 - 1000) / 1000 = 0.0005, exactly between 0.000 and 0.001
        let range = normalized_range(dec!(1000), dec!(1000.5), DISPLAY_SCALE);
        assert_eq!(range, dec!(0.001));
    }

    #[test]
    fn zero_minimum_is_degenerate_not_an_error() {
        assert_eq!(normalized_range(Decimal::ZERO, dec!(5), DISPLAY_SCALE), Decimal::ZERO);
    }

    #[test]
    fn equal_min_and_max_yield_zero() {
        assert_eq!(normalized_range(dec!(7.25), dec!(7.25), RANKING_SCALE), Decimal::ZERO);
    }

    #[test]
    fn normalized_range_is_never_negative() {
        for (min, max) in [
            (dec!(0), dec!(0)),
            (dec!(1), dec!(1)),
            (dec!(0.0001), dec!(123456.789)),
        ] {
            assert!(normalized_range(min, max, RANKING_SCALE) >= Decimal::ZERO);
        }
    }

    #[test]
    fn ranking_scale_preserves_ratios_the_display_scale_collapses() {
        let a = normalized_range(dec!(3), dec!(3.0000000003), RANKING_SCALE);
        let b = normalized_range(dec!(3), dec!(3.0000000006), RANKING_SCALE);
        assert_ne!(a, b);
        assert_eq!(display_round(a), display_round(b));
    }
}
