pub mod ebay;
pub mod heritage;
pub mod liveauctioneers;
pub mod traits;
pub mod types;

pub use ebay::EbaySource;
pub use heritage::HeritageSource;
pub use liveauctioneers::LiveAuctioneersSource;
pub use traits::MarketSource;
pub use types::SearchFilters;

use crate::config::MarketConfig;
use anyhow::Result;
use std::sync::Arc;

/// Every known source built from config, primary (eBay) first.
/// Unconfigured sources are included; registration decides what to keep.
pub fn all_sources(config: &MarketConfig) -> Result<Vec<Arc<dyn MarketSource>>> {
    let limit = config.result_limit;
    let timeout = config.source_timeout();
    let ebay: Arc<dyn MarketSource> = Arc::new(EbaySource::new(config.ebay.clone(), limit, timeout)?);
    let liveauctioneers: Arc<dyn MarketSource> = Arc::new(LiveAuctioneersSource::new(
        config.liveauctioneers.clone(),
        limit,
        timeout,
    )?);
    let heritage: Arc<dyn MarketSource> =
        Arc::new(HeritageSource::new(config.heritage.clone(), limit, timeout)?);
    Ok(vec![ebay, liveauctioneers, heritage])
}
