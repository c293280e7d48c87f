use crate::market::pricing::humanize_price;
use crate::models::{EstimateRange, Marketplace, SoldListing};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::Rng;

const SIMILARITIES: [f64; 5] = [0.7, 0.6, 0.5, 0.4, 0.3];
const SPACING_DAYS: i64 = 15;
/// Upper bound (exclusive) on the random day offset added to each sale
const DATE_JITTER_DAYS: i64 = 5;

const CONDITIONS: [&str; 5] = [
    "Excellent",
    "Very Good",
    "Good",
    "Fair - visible wear",
    "Excellent - professionally restored",
];

const MARKETPLACES: [Marketplace; 3] = [
    Marketplace::Ebay,
    Marketplace::LiveAuctioneers,
    Marketplace::HeritageAuctions,
];

/// Synthesize five comparable sales from a valuation range.
///
/// Prices are `mid - v`, `mid - v/2`, `mid`, `mid + v/2`, `mid + v` with
/// `mid = (min + max) / 2` and `v = (max - min) / 4`, each humanized.
/// Dates step back roughly 15 days at a time from `now`. The random source
/// only seasons the dates and the starting condition label.
pub fn generate_fallback_sales<R: Rng + ?Sized>(
    item_name: &str,
    query: &str,
    estimate: EstimateRange,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<SoldListing> {
    let estimate = estimate.normalized();
    let mid = estimate.midpoint();
    let variance = (estimate.max - estimate.min) as f64 / 4.0;
    let prices = [
        mid - variance,
        mid - variance / 2.0,
        mid,
        mid + variance / 2.0,
        mid + variance,
    ];
    let condition_offset = rng.gen_range(0..CONDITIONS.len());

    prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            let days_ago = i as i64 * SPACING_DAYS + rng.gen_range(0..DATE_JITTER_DAYS);
            let sold_at = now - Duration::days(days_ago);
            let marketplace = MARKETPLACES[i % MARKETPLACES.len()];

            SoldListing {
                id: format!("est-{}", i + 1),
                title: format!("{} (estimated comparable)", item_name),
                sold_price: humanize_price(*price),
                sold_date: sold_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                source: marketplace,
                condition: CONDITIONS[(condition_offset + i) % CONDITIONS.len()].to_string(),
                image_url: None,
                url: marketplace.search_url(query),
                similarity: SIMILARITIES[i],
                notes: Some(
                    "Estimated from the supplied valuation range; not a recorded sale".to_string(),
                ),
            }
        })
        .collect()
}
