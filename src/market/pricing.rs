use crate::models::SoldListing;
use serde::{Deserialize, Serialize};

/// Round a price to a natural-looking denomination for its magnitude.
///
/// Nearest 10 below 100, 50 below 1 000, 100 below 10 000, 500 below
/// 100 000, otherwise nearest 1 000. Negative and non-finite input gives 0.
/// Monotone and idempotent: every bracket boundary is a multiple of the
/// next bracket's step.
pub fn humanize_price(value: f64) -> i64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let step = match value {
        v if v < 100.0 => 10.0,
        v if v < 1_000.0 => 50.0,
        v if v < 10_000.0 => 100.0,
        v if v < 100_000.0 => 500.0,
        _ => 1_000.0,
    };
    ((value / step).round() * step) as i64
}

/// Summary statistics over a set of sold prices
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceStats {
    pub min: i64,
    pub max: i64,
    pub avg: i64,
    pub median: i64,
    pub count: usize,
}

/// Price statistics over listings with a known (non-zero) price.
/// `None` when no listing has one.
pub fn calculate_price_range(listings: &[SoldListing]) -> Option<PriceStats> {
    let mut prices: Vec<i64> = listings
        .iter()
        .map(|l| l.sold_price)
        .filter(|p| *p > 0)
        .collect();
    if prices.is_empty() {
        return None;
    }
    prices.sort_unstable();

    let count = prices.len();
    let sum: i128 = prices.iter().map(|&p| i128::from(p)).sum();
    let mid = count / 2;
    let median = if count % 2 == 0 {
        let pair = i128::from(prices[mid - 1]) + i128::from(prices[mid]);
        (pair as f64 / 2.0).round() as i64
    } else {
        prices[mid]
    };

    Some(PriceStats {
        min: prices[0],
        max: prices[count - 1],
        avg: (sum as f64 / count as f64).round() as i64,
        median,
        count,
    })
}

/// Arithmetic mean of sold prices, `None` for an empty slice
pub fn mean_price(listings: &[SoldListing]) -> Option<f64> {
    if listings.is_empty() {
        return None;
    }
    let sum: i128 = listings.iter().map(|l| i128::from(l.sold_price)).sum();
    Some(sum as f64 / listings.len() as f64)
}
