use crate::config::{credential, LiveAuctioneersConfig};
use crate::error::SourceError;
use crate::models::{Marketplace, SoldListing};
use crate::sources::traits::MarketSource;
use crate::sources::types::{build_client, rank_similarity, read_json, to_minor_units, SearchFilters};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const SEARCH_PATH: &str = "/v1/search/lots";
const SIMILARITY_DECAY: f64 = 0.04;

/// LiveAuctioneers sold-lot search
pub struct LiveAuctioneersSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    limit: u32,
}

impl LiveAuctioneersSource {
    pub fn new(config: LiveAuctioneersConfig, limit: u32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: credential(config.api_key),
            base_url: config.base_url,
            limit,
        })
    }

    fn build_query(&self, terms: &str, filters: &SearchFilters) -> Vec<(&'static str, String)> {
        let filters = filters.sanitized();
        let mut query = vec![
            ("keyword", terms.to_string()),
            ("status", "sold".to_string()),
            ("sort", "-saleDate".to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(category) = &filters.category {
            query.push(("category", category.clone()));
        }
        // LiveAuctioneers filters on whole dollars
        if let Some(min) = filters.min_price {
            query.push(("priceMin", (min / 100).to_string()));
        }
        if let Some(max) = filters.max_price {
            query.push(("priceMax", ((max + 99) / 100).to_string()));
        }
        query
    }
}

#[derive(Debug, Deserialize)]
struct LotSearchResponse {
    #[serde(default)]
    lots: Vec<Lot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Lot {
    lot_id: u64,
    title: String,
    /// Hammer price in dollars
    sale_price: f64,
    sale_date: String,
    #[serde(default)]
    condition_report: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    lot_url: Option<String>,
    #[serde(default)]
    house_name: Option<String>,
}

fn normalize(response: LotSearchResponse) -> Vec<SoldListing> {
    response
        .lots
        .into_iter()
        .filter_map(|lot| match to_minor_units(lot.sale_price) {
            Some(price) => Some((lot, price)),
            None => {
                warn!(lot_id = lot.lot_id, "Skipping LiveAuctioneers lot with invalid price");
                None
            }
        })
        .enumerate()
        .map(|(rank, (lot, price))| SoldListing {
            id: format!("la-{}", lot.lot_id),
            url: lot
                .lot_url
                .unwrap_or_else(|| format!("https://www.liveauctioneers.com/item/{}", lot.lot_id)),
            title: lot.title,
            sold_price: price,
            sold_date: lot.sale_date,
            source: Marketplace::LiveAuctioneers,
            condition: lot
                .condition_report
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "See condition report".to_string()),
            image_url: lot.image_url,
            similarity: rank_similarity(rank, SIMILARITY_DECAY),
            notes: lot.house_name.map(|house| format!("Sold by {}", house)),
        })
        .collect()
}

#[async_trait]
impl MarketSource for LiveAuctioneersSource {
    async fn search(
        &self,
        terms: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<SoldListing>, SourceError> {
        let Some(api_key) = &self.api_key else {
            warn!("LiveAuctioneers API key not configured");
            return Ok(Vec::new());
        };

        let url = format!("{}{}", self.base_url.trim_end_matches('/'), SEARCH_PATH);
        debug!(url = %url, terms, "Querying LiveAuctioneers sold lots");

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", api_key)
            .query(&self.build_query(terms, filters))
            .send()
            .await?;

        let body: LotSearchResponse = read_json(self.source_name(), response).await?;
        let listings = normalize(body);
        info!(count = listings.len(), "LiveAuctioneers search complete");
        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "LiveAuctioneers"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
