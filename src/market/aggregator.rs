use crate::error::SourceError;
use crate::models::SoldListing;
use crate::sources::{MarketSource, SearchFilters};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateOptions {
    pub filters: SearchFilters,
    /// Truncate the merged, sorted results to this many listings
    pub limit: Option<usize>,
}

/// Outcome of one source within an aggregated search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceResult {
    pub source: String,
    pub listings: Vec<SoldListing>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedSearch {
    /// Every source's listings, most recent first, truncated to the limit
    pub all_results: Vec<SoldListing>,
    pub by_source: Vec<SourceResult>,
    /// Number of listings before truncation
    pub total_count: usize,
    /// Sources that returned at least one listing
    pub sources_queried: Vec<String>,
    /// Listings whose sold date could not be parsed (sorted last)
    pub undated_count: usize,
}

/// Fans a search out to every configured source and merges the results.
///
/// Each source runs in its own task under a timeout, so a failing, hanging
/// or panicking source only costs its own results.
pub struct MarketAggregator {
    sources: Vec<Arc<dyn MarketSource>>,
    source_timeout: Duration,
}

impl MarketAggregator {
    pub fn new(source_timeout: Duration) -> Self {
        Self {
            sources: Vec::new(),
            source_timeout,
        }
    }

    /// Add a source if it is configured. Returns whether it was added.
    pub fn register(&mut self, source: Arc<dyn MarketSource>) -> bool {
        if !source.is_configured() {
            warn!(source = source.source_name(), "Source not configured, disabled");
            return false;
        }
        info!(source = source.source_name(), "Registered market source");
        self.sources.push(source);
        true
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.source_name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Query all sources concurrently and merge their sold listings
    pub async fn search_all(&self, terms: &str, options: &AggregateOptions) -> AggregatedSearch {
        info!(terms, sources = self.sources.len(), "Searching all market sources");

        let handles: Vec<_> = self
            .sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let terms = terms.to_string();
                let filters = options.filters.clone();
                let timeout = self.source_timeout;
                tokio::spawn(async move {
                    match tokio::time::timeout(timeout, source.search(&terms, &filters)).await {
                        Ok(result) => result,
                        Err(_) => Err(SourceError::Timeout(timeout)),
                    }
                })
            })
            .collect();

        let outcomes = join_all(handles).await;

        let mut by_source = Vec::with_capacity(outcomes.len());
        for (source, outcome) in self.sources.iter().zip(outcomes) {
            let name = source.source_name();
            let result = outcome.unwrap_or_else(|e| Err(SourceError::Panicked(e.to_string())));
            by_source.push(match result {
                Ok(listings) => {
                    debug!(source = name, count = listings.len(), "Source search complete");
                    SourceResult {
                        source: name.to_string(),
                        listings,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(source = name, error = %e, "Source search failed, continuing without it");
                    SourceResult {
                        source: name.to_string(),
                        listings: Vec::new(),
                        error: Some(e.to_string()),
                    }
                }
            });
        }

        let sources_queried = by_source
            .iter()
            .filter(|r| !r.listings.is_empty())
            .map(|r| r.source.clone())
            .collect();

        let merged: Vec<SoldListing> = by_source
            .iter()
            .flat_map(|r| r.listings.iter().cloned())
            .collect();
        let total_count = merged.len();
        let (mut all_results, undated_count) = sort_by_recency(merged);
        if undated_count > 0 {
            warn!(undated_count, "Listings with unparseable sold dates sorted last");
        }
        if let Some(limit) = options.limit {
            all_results.truncate(limit);
        }

        info!(
            total_count,
            returned = all_results.len(),
            "Aggregated market search complete"
        );

        AggregatedSearch {
            all_results,
            by_source,
            total_count,
            sources_queried,
            undated_count,
        }
    }
}

/// Stable sort, most recent first. Undated listings go last.
/// Returns the sorted listings and how many were undated.
pub fn sort_by_recency(listings: Vec<SoldListing>) -> (Vec<SoldListing>, usize) {
    let mut keyed: Vec<(Option<i64>, SoldListing)> = listings
        .into_iter()
        .map(|l| (l.sold_at().map(|t| t.timestamp_millis()), l))
        .collect();
    // Option orders None below Some, so descending puts undated last
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    let undated = keyed.iter().filter(|(k, _)| k.is_none()).count();
    (keyed.into_iter().map(|(_, l)| l).collect(), undated)
}
