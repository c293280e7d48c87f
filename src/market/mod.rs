pub mod aggregator;
pub mod fallback;
pub mod intelligence;
pub mod pricing;
pub mod validation;
pub mod venues;

pub use aggregator::{AggregateOptions, AggregatedSearch, MarketAggregator, SourceResult};
pub use fallback::generate_fallback_sales;
pub use intelligence::{build_search_query, MarketIntelligenceService};
pub use pricing::{calculate_price_range, humanize_price, PriceStats};
pub use validation::{PriceValidation, ValidationStatus};
pub use venues::{classify, VenueCategory};
