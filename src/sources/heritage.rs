use crate::config::{credential, HeritageConfig};
use crate::error::SourceError;
use crate::models::{Marketplace, SoldListing};
use crate::sources::traits::MarketSource;
use crate::sources::types::{
    build_client, is_plausible_price, rank_similarity, read_json, SearchFilters,
};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const SEARCH_PATH: &str = "/v1/archive/search";
const SIMILARITY_DECAY: f64 = 0.045;

/// Heritage Auctions price-realized archive search.
/// Supports category filtering only; price filters are ignored.
pub struct HeritageSource {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    limit: u32,
}

impl HeritageSource {
    pub fn new(config: HeritageConfig, limit: u32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_token: credential(config.api_token),
            base_url: config.base_url,
            limit,
        })
    }

    fn build_query(&self, terms: &str, filters: &SearchFilters) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("q", terms.to_string()),
            ("sold", "true".to_string()),
            ("sortBy", "date-desc".to_string()),
            ("rows", self.limit.to_string()),
        ];
        if let Some(category) = &filters.category {
            query.push(("category", category.clone()));
        }
        query
    }
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    results: Vec<ArchiveLot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveLot {
    auction_no: u32,
    lot_no: u32,
    title: String,
    /// Price realized including buyer's premium, in cents
    price_realized_cents: i64,
    sale_date: String,
    #[serde(default)]
    condition_text: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    url: String,
}

fn normalize(response: ArchiveResponse) -> Vec<SoldListing> {
    response
        .results
        .into_iter()
        .filter(|lot| {
            if !is_plausible_price(lot.price_realized_cents) {
                warn!(
                    auction = lot.auction_no,
                    lot = lot.lot_no,
                    price = lot.price_realized_cents,
                    "Skipping Heritage lot with implausible price"
                );
                return false;
            }
            true
        })
        .enumerate()
        .map(|(rank, lot)| SoldListing {
            id: format!("ha-{}-{}", lot.auction_no, lot.lot_no),
            title: lot.title,
            sold_price: lot.price_realized_cents,
            sold_date: lot.sale_date,
            source: Marketplace::HeritageAuctions,
            condition: lot.condition_text.unwrap_or_else(|| "Not stated".to_string()),
            image_url: lot.thumbnail,
            url: lot.url,
            similarity: rank_similarity(rank, SIMILARITY_DECAY),
            notes: Some("Price realized includes buyer's premium".to_string()),
        })
        .collect()
}

#[async_trait]
impl MarketSource for HeritageSource {
    async fn search(
        &self,
        terms: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<SoldListing>, SourceError> {
        let Some(token) = &self.api_token else {
            warn!("Heritage Auctions API token not configured");
            return Ok(Vec::new());
        };

        let url = format!("{}{}", self.base_url.trim_end_matches('/'), SEARCH_PATH);
        debug!(url = %url, terms, "Querying Heritage Auctions archive");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&self.build_query(terms, filters))
            .send()
            .await?;

        let body: ArchiveResponse = read_json(self.source_name(), response).await?;
        let listings = normalize(body);
        info!(count = listings.len(), "Heritage Auctions search complete");
        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "Heritage Auctions"
    }

    fn is_configured(&self) -> bool {
        self.api_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::types::canned_server::respond_once;

    #[test]
    fn parses_archive_results() {
        let body: ArchiveResponse = serde_json::from_str(
            r#"{
                "results": [
                    {"auctionNo": 8123, "lotNo": 45, "title": "Rolex Datejust",
                     "priceRealizedCents": 512500, "saleDate": "2024-02-10T00:00:00Z",
                     "url": "https://jewelry.ha.com/itm/8123-45"},
                    {"auctionNo": 8123, "lotNo": 46, "title": "Bad data",
                     "priceRealizedCents": -1, "saleDate": "2024-02-10T00:00:00Z",
                     "url": "https://jewelry.ha.com/itm/8123-46"},
                    {"auctionNo": 8123, "lotNo": 47, "title": "Overflowing",
                     "priceRealizedCents": 9223372036854775807, "saleDate": "2024-02-10T00:00:00Z",
                     "url": "https://jewelry.ha.com/itm/8123-47"}
                ],
                "totalHits": 2
            }"#,
        )
        .unwrap();

        let listings = normalize(body);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id, "ha-8123-45");
        assert_eq!(listings[0].sold_price, 512_500);
        assert_eq!(listings[0].source, Marketplace::HeritageAuctions);
        assert_eq!(listings[0].similarity, 1.0);
    }

    #[test]
    fn ignores_price_filters() {
        let source = HeritageSource::new(HeritageConfig::default(), 20, Duration::from_secs(2)).unwrap();
        let filters = SearchFilters {
            category: Some("watches".to_string()),
            min_price: Some(100),
            max_price: Some(1000),
        };
        let query = source.build_query("rolex", &filters);
        assert!(query.contains(&("category", "watches".to_string())));
        assert!(query.iter().all(|(k, _)| !k.contains("price")));
    }

    #[tokio::test]
    async fn unreachable_host_fails_open() {
        let config = HeritageConfig {
            api_token: Some("token".to_string()),
            base_url: "http://127.0.0.1:1".to_string(),
        };
        let source = HeritageSource::new(config, 20, Duration::from_secs(2)).unwrap();
        assert!(source.is_configured());
        assert!(source.search("rolex", &SearchFilters::default()).await.is_err());
        assert!(source.search_or_empty("rolex", &SearchFilters::default()).await.is_empty());
    }

    #[tokio::test]
    async fn error_status_and_malformed_body_are_reported() {
        let pointed_at = |base_url: String| {
            let config = HeritageConfig {
                api_token: Some("token".to_string()),
                base_url,
            };
            HeritageSource::new(config, 20, Duration::from_secs(2)).unwrap()
        };

        let source = pointed_at(respond_once("401 Unauthorized", "bad token").await);
        let result = source.search("rolex", &SearchFilters::default()).await;
        assert!(matches!(result, Err(SourceError::Status { status: 401, .. })));

        let source = pointed_at(respond_once("200 OK", "{\"results\": [{\"lotNo\": 1}]}").await);
        let result = source.search("rolex", &SearchFilters::default()).await;
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }
}
