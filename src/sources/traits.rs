use crate::error::SourceError;
use crate::models::SoldListing;
use crate::sources::types::SearchFilters;
use async_trait::async_trait;
use tracing::warn;

/// Common trait for all sold-listing sources.
/// New auction houses plug in by implementing this and registering with the aggregator.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Search sold listings, most recent first
    async fn search(
        &self,
        terms: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<SoldListing>, SourceError>;

    /// Get the name of the source
    fn source_name(&self) -> &'static str;

    /// Whether the credentials needed to query this source are present
    fn is_configured(&self) -> bool;

    /// Fail-open search: unconfigured sources and failures both yield no listings
    async fn search_or_empty(&self, terms: &str, filters: &SearchFilters) -> Vec<SoldListing> {
        if !self.is_configured() {
            warn!(source = self.source_name(), "Source not configured, skipping");
            return Vec::new();
        }
        match self.search(terms, filters).await {
            Ok(listings) => listings,
            Err(e) => {
                warn!(source = self.source_name(), error = %e, "Source search failed, using no results");
                Vec::new()
            }
        }
    }
}
