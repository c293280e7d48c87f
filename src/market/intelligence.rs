use crate::config::MarketConfig;
use crate::market::aggregator::{sort_by_recency, AggregateOptions, AggregatedSearch, MarketAggregator};
use crate::market::fallback::generate_fallback_sales;
use crate::market::pricing::{humanize_price, mean_price};
use crate::market::venues::classify;
use crate::models::{
    ActiveListing, DemandLevel, EstimateRange, MarketIntelligence, Marketplace, PriceRange,
    PriceTrend, SoldListing,
};
use crate::sources::{self, MarketSource, SearchFilters};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{info, warn};

/// Search shortcuts offered alongside every report, with display similarity
const ACTIVE_LISTING_SHORTCUTS: [(Marketplace, f64); 3] = [
    (Marketplace::Ebay, 0.8),
    (Marketplace::Etsy, 0.7),
    (Marketplace::FirstDibs, 0.7),
];

/// Entry point for market lookups: aggregated search, intelligence reports
/// and price validation.
pub struct MarketIntelligenceService {
    aggregator: MarketAggregator,
    /// Best-coverage source used for intelligence reports
    primary: Option<Arc<dyn MarketSource>>,
    fallback_seed: Option<u64>,
}

impl MarketIntelligenceService {
    pub fn new(
        aggregator: MarketAggregator,
        primary: Option<Arc<dyn MarketSource>>,
        fallback_seed: Option<u64>,
    ) -> Self {
        let primary = primary.filter(|source| {
            let configured = source.is_configured();
            if !configured {
                warn!(source = source.source_name(), "Primary source not configured, reports will use estimates only");
            }
            configured
        });
        Self {
            aggregator,
            primary,
            fallback_seed,
        }
    }

    /// Build all sources from config and register the configured ones.
    /// eBay is the primary source.
    pub fn from_config(config: &MarketConfig) -> Result<Self> {
        let all = sources::all_sources(config)?;
        let primary = all.first().cloned();
        let mut aggregator = MarketAggregator::new(config.source_timeout());
        for source in all {
            aggregator.register(source);
        }
        Ok(Self::new(aggregator, primary, config.fallback_seed))
    }

    pub fn aggregator(&self) -> &MarketAggregator {
        &self.aggregator
    }

    pub async fn search_all_auction_databases(
        &self,
        terms: &str,
        options: &AggregateOptions,
    ) -> AggregatedSearch {
        self.aggregator.search_all(terms, options).await
    }

    /// Market report for an item, backed by real sales when the primary
    /// source has any, otherwise by sales synthesized from `estimate`.
    pub async fn get_market_intelligence(
        &self,
        item_name: &str,
        maker: Option<&str>,
        era: Option<&str>,
        estimate: Option<EstimateRange>,
    ) -> MarketIntelligence {
        let query = build_search_query(item_name, maker, era);
        info!(query = %query, "Building market intelligence");

        let real_sales = match &self.primary {
            Some(source) => source.search_or_empty(&query, &SearchFilters::default()).await,
            None => Vec::new(),
        };
        let real_count = real_sales.len();
        let now = Utc::now();

        let sales = match estimate {
            Some(estimate) if real_sales.is_empty() => {
                info!(min = estimate.min, max = estimate.max, "No sales found, synthesizing from estimate");
                let mut rng = match self.fallback_seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                generate_fallback_sales(item_name, &query, estimate, now, &mut rng)
            }
            _ => real_sales,
        };

        build_intelligence(item_name, maker, &query, sales, real_count, now)
    }
}

/// `maker item era`, skipping absent or blank parts
pub fn build_search_query(item_name: &str, maker: Option<&str>, era: Option<&str>) -> String {
    [maker, Some(item_name), era]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Confidence from the number of real (non-synthesized) sales
pub fn data_confidence(real_sales: usize) -> f64 {
    match real_sales {
        0 => 0.3,
        1..=5 => 0.5,
        _ => 0.8,
    }
}

pub fn active_listing_shortcuts(query: &str) -> Vec<ActiveListing> {
    ACTIVE_LISTING_SHORTCUTS
        .iter()
        .map(|(marketplace, similarity)| ActiveListing {
            marketplace: marketplace.display_name().to_string(),
            url: marketplace.search_url(query),
            asking_price: 0,
            similarity: *similarity,
        })
        .collect()
}

/// Reduce a set of sales into a report. `real_sales` is how many of them
/// are recorded (not synthesized) sales.
pub fn build_intelligence(
    item_name: &str,
    maker: Option<&str>,
    query: &str,
    sales: Vec<SoldListing>,
    real_sales: usize,
    now: DateTime<Utc>,
) -> MarketIntelligence {
    let (recent_sales, _) = sort_by_recency(sales);

    let average_sold_price = mean_price(&recent_sales)
        .map(|mean| humanize_price(mean.round()))
        .unwrap_or(0);
    let price_range = match (
        recent_sales.iter().map(|s| s.sold_price).min(),
        recent_sales.iter().map(|s| s.sold_price).max(),
    ) {
        (Some(low), Some(high)) => PriceRange {
            low: humanize_price(low as f64),
            high: humanize_price(high as f64),
        },
        _ => PriceRange::default(),
    };

    let demand_level = DemandLevel::from_sales_count(recent_sales.len());
    let active_listings = active_listing_shortcuts(query);
    let known_asking: Vec<i64> = active_listings
        .iter()
        .map(|l| l.asking_price)
        .filter(|p| *p > 0)
        .collect();
    let average_asking_price = if known_asking.is_empty() {
        average_sold_price
    } else {
        let sum: i128 = known_asking.iter().map(|&p| i128::from(p)).sum();
        humanize_price((sum as f64 / known_asking.len() as f64).round())
    };

    let category = classify(item_name, maker);

    MarketIntelligence {
        recent_sales,
        average_sold_price,
        price_range,
        sales_velocity: demand_level.sales_velocity().to_string(),
        active_listings,
        average_asking_price,
        demand_level,
        // No historical series yet to derive a direction from
        price_trend: PriceTrend::Stable,
        best_venues: category.venues(),
        seasonality: category.seasonality_note(),
        data_confidence: data_confidence(real_sales),
        generated_at: now,
    }
}
