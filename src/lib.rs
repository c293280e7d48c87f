//! Market intelligence for vintage and antique items.
//!
//! Queries sold-listing sources (eBay, LiveAuctioneers, Heritage Auctions)
//! concurrently, merges their results, and reduces them into a price and
//! demand report. When no sales are found, a report is synthesized from a
//! caller-supplied valuation range.

pub mod config;
pub mod error;
pub mod market;
pub mod models;
pub mod sources;

pub use config::MarketConfig;
pub use error::SourceError;
pub use market::{
    calculate_price_range, AggregateOptions, AggregatedSearch, MarketAggregator,
    MarketIntelligenceService, PriceValidation,
};
pub use models::{EstimateRange, MarketIntelligence, SoldListing};
