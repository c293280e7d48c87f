use crate::config::{credential, EbayConfig};
use crate::error::SourceError;
use crate::models::{Marketplace, SoldListing};
use crate::sources::traits::MarketSource;
use crate::sources::types::{
    build_client, format_major_units, rank_similarity, read_json, to_minor_units, SearchFilters,
};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const SEARCH_PATH: &str = "/buy/marketplace_insights/v1_beta/item_sales/search";
const SIMILARITY_DECAY: f64 = 0.05;

/// eBay sold-listings search (Marketplace Insights API).
/// The general marketplace, so it is the primary source for market intelligence.
pub struct EbaySource {
    client: Client,
    config: EbayConfig,
    token: Option<String>,
    limit: u32,
}

impl EbaySource {
    pub fn new(config: EbayConfig, limit: u32, timeout: Duration) -> Result<Self> {
        let token = credential(config.access_token.clone());
        Ok(Self {
            client: build_client(timeout)?,
            config,
            token,
            limit,
        })
    }

    fn build_query(&self, terms: &str, filters: &SearchFilters) -> Vec<(&'static str, String)> {
        let filters = filters.sanitized();
        let mut query = vec![
            ("q", terms.to_string()),
            ("limit", self.limit.to_string()),
            ("sort", "-lastSoldDate".to_string()),
        ];
        if let Some(category) = &filters.category {
            query.push(("category_ids", category.clone()));
        }
        if filters.min_price.is_some() || filters.max_price.is_some() {
            let low = filters.min_price.map(format_major_units).unwrap_or_default();
            let high = filters.max_price.map(format_major_units).unwrap_or_default();
            query.push((
                "filter",
                format!("price:[{}..{}],priceCurrency:USD", low, high),
            ));
        }
        query
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSalesResponse {
    #[serde(default)]
    item_sales: Vec<ItemSale>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSale {
    item_id: String,
    title: String,
    last_sold_price: Amount,
    last_sold_date: String,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    image: Option<Image>,
    item_web_url: String,
}

#[derive(Debug, Deserialize)]
struct Amount {
    /// Decimal string in major units, e.g. "125.00"
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Image {
    image_url: String,
}

fn normalize(response: ItemSalesResponse) -> Vec<SoldListing> {
    response
        .item_sales
        .into_iter()
        .filter_map(|sale| {
            let price = sale
                .last_sold_price
                .value
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(to_minor_units);
            match price {
                Some(price) => Some((sale, price)),
                None => {
                    warn!(item_id = %sale.item_id, value = %sale.last_sold_price.value, "Skipping eBay sale with invalid price");
                    None
                }
            }
        })
        .enumerate()
        .map(|(rank, (sale, price))| SoldListing {
            id: format!("ebay-{}", sale.item_id),
            title: sale.title,
            sold_price: price,
            sold_date: sale.last_sold_date,
            source: Marketplace::Ebay,
            condition: sale.condition.unwrap_or_else(|| "Unknown".to_string()),
            image_url: sale.image.map(|i| i.image_url),
            url: sale.item_web_url,
            similarity: rank_similarity(rank, SIMILARITY_DECAY),
            notes: None,
        })
        .collect()
}

#[async_trait]
impl MarketSource for EbaySource {
    async fn search(
        &self,
        terms: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<SoldListing>, SourceError> {
        let Some(token) = &self.token else {
            warn!("eBay access token not configured");
            return Ok(Vec::new());
        };

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), SEARCH_PATH);
        debug!(url = %url, terms, "Querying eBay sold listings");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("X-EBAY-C-MARKETPLACE-ID", &self.config.marketplace_id)
            .query(&self.build_query(terms, filters))
            .send()
            .await?;

        let body: ItemSalesResponse = read_json(self.source_name(), response).await?;
        let listings = normalize(body);
        info!(count = listings.len(), "eBay search complete");
        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "eBay"
    }

    fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::types::canned_server::respond_once;

    fn source(token: Option<&str>, base_url: &str) -> EbaySource {
        let config = EbayConfig {
            access_token: token.map(str::to_string),
            base_url: base_url.to_string(),
            ..EbayConfig::default()
        };
        EbaySource::new(config, 20, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn parses_item_sales_response() {
        let body: ItemSalesResponse = serde_json::from_str(
            r#"{
                "itemSales": [
                    {
                        "itemId": "v1|1234|0",
                        "title": "Vintage Pyrex Bowl",
                        "lastSoldPrice": {"value": "45.50", "currency": "USD"},
                        "lastSoldDate": "2024-05-02T12:00:00.000Z",
                        "condition": "Pre-owned",
                        "image": {"imageUrl": "https://i.ebayimg.com/1.jpg"},
                        "itemWebUrl": "https://www.ebay.com/itm/1234"
                    },
                    {
                        "itemId": "v1|99|0",
                        "title": "Broken price",
                        "lastSoldPrice": {"value": "n/a"},
                        "lastSoldDate": "2024-05-01T12:00:00.000Z",
                        "itemWebUrl": "https://www.ebay.com/itm/99"
                    },
                    {
                        "itemId": "v1|5678|0",
                        "title": "Pyrex Bowl Set",
                        "lastSoldPrice": {"value": "80"},
                        "lastSoldDate": "2024-04-20T12:00:00.000Z",
                        "itemWebUrl": "https://www.ebay.com/itm/5678"
                    }
                ],
                "total": 3
            }"#,
        )
        .unwrap();

        let listings = normalize(body);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].id, "ebay-v1|1234|0");
        assert_eq!(listings[0].sold_price, 4550);
        assert_eq!(listings[0].condition, "Pre-owned");
        assert_eq!(listings[0].similarity, 1.0);
        assert_eq!(listings[1].sold_price, 8000);
        assert_eq!(listings[1].condition, "Unknown");
        assert!(listings[1].image_url.is_none());
        assert!((listings[1].similarity - 0.95).abs() < 1e-9);
    }

    #[test]
    fn missing_required_fields_are_a_schema_error() {
        let result = serde_json::from_str::<ItemSalesResponse>(
            r#"{"itemSales": [{"itemId": "1", "title": "No price"}]}"#,
        );
        assert!(result.is_err());
        let empty: ItemSalesResponse = serde_json::from_str("{}").unwrap();
        assert!(normalize(empty).is_empty());
    }

    #[test]
    fn query_encodes_filters() {
        let source = source(Some("token"), "https://api.ebay.com");
        let filters = SearchFilters {
            category: Some("20081".to_string()),
            min_price: Some(5000),
            max_price: None,
        };
        let query = source.build_query("eames chair", &filters);
        assert!(query.contains(&("q", "eames chair".to_string())));
        assert!(query.contains(&("limit", "20".to_string())));
        assert!(query.contains(&("category_ids", "20081".to_string())));
        assert!(query.contains(&("filter", "price:[50.00..],priceCurrency:USD".to_string())));

        let plain = source.build_query("eames chair", &SearchFilters::default());
        assert!(plain.iter().all(|(k, _)| *k != "filter" && *k != "category_ids"));
    }

    #[test]
    fn negative_price_filters_clamp_to_zero() {
        let source = source(Some("token"), "https://api.ebay.com");
        let filters = SearchFilters {
            category: None,
            min_price: Some(-150),
            max_price: Some(2_500),
        };
        let query = source.build_query("lamp", &filters);
        assert!(query.contains(&("filter", "price:[0.00..25.00],priceCurrency:USD".to_string())));
    }

    #[test]
    fn absurd_prices_are_skipped() {
        let body: ItemSalesResponse = serde_json::from_str(
            r#"{"itemSales": [
                {"itemId": "1", "title": "Huge", "lastSoldPrice": {"value": "1e20"},
                 "lastSoldDate": "2024-05-01", "itemWebUrl": "https://www.ebay.com/itm/1"},
                {"itemId": "2", "title": "Fine", "lastSoldPrice": {"value": "12.00"},
                 "lastSoldDate": "2024-05-01", "itemWebUrl": "https://www.ebay.com/itm/2"}
            ]}"#,
        )
        .unwrap();
        let listings = normalize(body);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id, "ebay-2");
        assert_eq!(listings[0].similarity, 1.0);
    }

    #[tokio::test]
    async fn error_status_is_reported_and_fails_open() {
        let base = respond_once("503 Service Unavailable", r#"{"errors":["maintenance"]}"#).await;
        let ebay = source(Some("token"), &base);
        let result = ebay.search("chair", &SearchFilters::default()).await;
        assert!(matches!(result, Err(SourceError::Status { status: 503, .. })));

        let base = respond_once("503 Service Unavailable", "").await;
        let ebay = source(Some("token"), &base);
        assert!(ebay.search_or_empty("chair", &SearchFilters::default()).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error_and_fails_open() {
        let base = respond_once("200 OK", "<html>not json</html>").await;
        let ebay = source(Some("token"), &base);
        let result = ebay.search("chair", &SearchFilters::default()).await;
        assert!(matches!(result, Err(SourceError::Parse(_))));

        let base = respond_once("200 OK", r#"{"itemSales": [{"itemId": 5}]}"#).await;
        let ebay = source(Some("token"), &base);
        assert!(ebay.search_or_empty("chair", &SearchFilters::default()).await.is_empty());
    }

    #[tokio::test]
    async fn successful_response_is_normalized() {
        let base = respond_once(
            "200 OK",
            r#"{"itemSales": [{"itemId": "7", "title": "Lamp", "lastSoldPrice": {"value": "30.00"},
                "lastSoldDate": "2024-05-01T00:00:00Z", "itemWebUrl": "https://www.ebay.com/itm/7"}]}"#,
        )
        .await;
        let source = source(Some("token"), &base);
        let listings = source.search("lamp", &SearchFilters::default()).await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id, "ebay-7");
        assert_eq!(listings[0].sold_price, 3_000);
    }

    #[tokio::test]
    async fn unconfigured_source_returns_nothing() {
        let source = source(Some("   "), "https://api.ebay.com");
        assert!(!source.is_configured());
        let listings = source.search("chair", &SearchFilters::default()).await.unwrap();
        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn connection_failure_is_an_error_but_fails_open() {
        let source = source(Some("token"), "http://127.0.0.1:1");
        let result = source.search("chair", &SearchFilters::default()).await;
        assert!(matches!(result, Err(SourceError::Network(_))));
        assert!(source.search_or_empty("chair", &SearchFilters::default()).await.is_empty());
    }
}
