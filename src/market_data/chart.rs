//! Synthetic price history.
//!
//! There is no real historical series behind the chart endpoint: a plausible
//! path is derived from the current price and the 24h change alone. The walk
//! starts at the price implied by backing out the 24h change, drifts along the
//! trend with bounded random noise, and always ends exactly at the live price.
//!
//! The start price backs out only the 24h change, whatever the window length.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::market_data::types::ChartPoint;

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Hourly resolution for the one-day window.
pub const ONE_DAY_POINTS: usize = 24;

/// Daily resolution for longer windows is capped at one year of points.
pub const MAX_POINTS: usize = 365;

/// Volatility ceiling as a fraction of price.
pub const MAX_VOLATILITY: f64 = 0.1;

pub fn point_count(window_days: u32) -> usize {
    if window_days == 1 {
        ONE_DAY_POINTS
    } else {
        (window_days as usize).min(MAX_POINTS)
    }
}

/// Round to 8 decimal places.
pub fn round_price(price: f64) -> f64 {
    (price * 1e8).round() / 1e8
}

/// Generate the synthetic series for `window_days` ending at `now`.
///
/// `window_days` must be at least 1; callers validate it. A zero window
/// yields an empty series.
pub fn synthesize<R: Rng + ?Sized>(
    rng: &mut R,
    current_price: f64,
    price_change_24h_pct: f64,
    window_days: u32,
    now: DateTime<Utc>,
) -> Vec<ChartPoint> {
    if window_days == 0 {
        return Vec::new();
    }

    let n = point_count(window_days);
    let end_ms = now.timestamp_millis();
    let start_ms = end_ms - i64::from(window_days) * MS_PER_DAY;
    let interval = (end_ms - start_ms) as f64 / n as f64;

    let change = price_change_24h_pct / 100.0;
    let volatility = change.abs().min(MAX_VOLATILITY);
    let mut price = current_price / (1.0 + change);

    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let random_movement = (rng.gen::<f64>() - 0.5) * volatility * 0.5;
        let trend_movement = change * (i as f64 / n as f64);
        price *= 1.0 + random_movement + trend_movement / n as f64;

        points.push(ChartPoint {
            timestamp: (start_ms as f64 + i as f64 * interval).floor() as i64,
            price: round_price(price),
        });
    }

    if let Some(last) = points.last_mut() {
        last.price = current_price;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    #[test]
    fn point_counts_follow_window() {
        assert_eq!(point_count(1), 24);
        assert_eq!(point_count(7), 7);
        assert_eq!(point_count(30), 30);
        assert_eq!(point_count(365), 365);
        assert_eq!(point_count(400), 365);
    }

    #[test]
    fn one_day_bitcoin_scenario() {
        let mut rng = StdRng::seed_from_u64(7);
        let points = synthesize(&mut rng, 50_000.0, 10.0, 1, now());

        assert_eq!(points.len(), 24);
        assert_eq!(points[23].price, 50_000.0);

        // first step: start * (1 + noise), noise bounded by cap * 0.5 * 0.5
        let start = 50_000.0 / 1.10;
        let deviation = (points[0].price - start).abs() / start;
        assert!(deviation <= MAX_VOLATILITY * 0.25 + 1e-9, "deviation {deviation}");

        assert_eq!(points[0].timestamp, now().timestamp_millis() - MS_PER_DAY);
    }

    #[test]
    fn same_seed_same_series() {
        let a = synthesize(&mut StdRng::seed_from_u64(42), 3_000.0, -4.2, 7, now());
        let b = synthesize(&mut StdRng::seed_from_u64(42), 3_000.0, -4.2, 7, now());
        assert_eq!(a, b);
    }

    #[test]
    fn zero_change_is_flat() {
        // no volatility and no trend: every point sits at the current price
        let points = synthesize(&mut StdRng::seed_from_u64(1), 1.0, 0.0, 30, now());
        assert_eq!(points.len(), 30);
        assert!(points.iter().all(|p| p.price == 1.0));
    }

    #[test]
    fn zero_window_is_empty() {
        assert!(synthesize(&mut StdRng::seed_from_u64(1), 1.0, 5.0, 0, now()).is_empty());
    }

    #[test]
    fn prices_rounded_to_eight_decimals() {
        let points = synthesize(&mut StdRng::seed_from_u64(3), 0.123456789123, 3.3, 7, now());
        for p in &points[..points.len() - 1] {
            assert_eq!(round_price(p.price), p.price);
        }
    }

    proptest! {
        #[test]
        fn structural_contract(
            seed in any::<u64>(),
            price in 1e-6f64..1e6,
            change in -90.0f64..500.0,
            days in 1u32..1000,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let points = synthesize(&mut rng, price, change, days, now());

            prop_assert_eq!(points.len(), point_count(days));
            prop_assert_eq!(points.last().unwrap().price, price);
            prop_assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
            prop_assert!(points.iter().all(|p| p.timestamp <= now().timestamp_millis()));
        }
    }
}
