use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marketplace a listing (or search shortcut) belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Marketplace {
    Ebay,
    LiveAuctioneers,
    HeritageAuctions,
    Etsy,
    FirstDibs,
}

impl Marketplace {
    pub fn display_name(&self) -> &'static str {
        match self {
            Marketplace::Ebay => "eBay",
            Marketplace::LiveAuctioneers => "LiveAuctioneers",
            Marketplace::HeritageAuctions => "Heritage Auctions",
            Marketplace::Etsy => "Etsy",
            Marketplace::FirstDibs => "1stDibs",
        }
    }

    /// Base URL and query parameter name of the public search page
    fn search_page(&self) -> (&'static str, &'static str) {
        match self {
            Marketplace::Ebay => ("https://www.ebay.com/sch/i.html", "_nkw"),
            Marketplace::LiveAuctioneers => ("https://www.liveauctioneers.com/search/", "keyword"),
            Marketplace::HeritageAuctions => ("https://www.ha.com/c/search-results.zx", "N"),
            Marketplace::Etsy => ("https://www.etsy.com/search", "q"),
            Marketplace::FirstDibs => ("https://www.1stdibs.com/search/", "q"),
        }
    }

    /// Public search page URL for the given free-text query
    pub fn search_url(&self, query: &str) -> String {
        let (base, param) = self.search_page();
        match reqwest::Url::parse_with_params(base, &[(param, query)]) {
            Ok(url) => url.to_string(),
            Err(_) => base.to_string(),
        }
    }
}

/// A completed historical sale used as a market comparable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoldListing {
    /// Source-prefixed identifier, e.g. `ebay-1234` or `la-998`
    pub id: String,
    pub title: String,
    /// Sold price in the smallest currency unit
    pub sold_price: i64,
    /// ISO-8601 date or timestamp as reported by the source
    pub sold_date: String,
    pub source: Marketplace,
    pub condition: String,
    pub image_url: Option<String>,
    pub url: String,
    /// Relevance in [0, 1]
    pub similarity: f64,
    pub notes: Option<String>,
}

impl SoldListing {
    /// Sold date as a UTC timestamp, if the source gave a parseable one.
    ///
    /// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates.
    pub fn sold_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.sold_date.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

/// A marketplace search shortcut, not a concrete live offer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveListing {
    pub marketplace: String,
    pub url: String,
    /// 0 means unknown (search required)
    pub asking_price: i64,
    pub similarity: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PriceRange {
    pub low: i64,
    pub high: i64,
}

/// Caller-supplied valuation range (e.g. from the AI identification)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EstimateRange {
    pub min: i64,
    pub max: i64,
}

impl EstimateRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Range with negatives clamped to zero and bounds in ascending order
    pub fn normalized(&self) -> Self {
        let a = self.min.max(0);
        let b = self.max.max(0);
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min as f64 + self.max as f64) / 2.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    Hot,
    Steady,
    Slow,
    Cold,
}

impl DemandLevel {
    /// Classify by the number of comparable sales
    pub fn from_sales_count(count: usize) -> Self {
        match count {
            n if n >= 15 => DemandLevel::Hot,
            n if n >= 8 => DemandLevel::Steady,
            n if n >= 3 => DemandLevel::Slow,
            _ => DemandLevel::Cold,
        }
    }

    pub fn sales_velocity(&self) -> &'static str {
        match self {
            DemandLevel::Hot => "High - multiple sales per week",
            DemandLevel::Steady => "Moderate - several sales per month",
            DemandLevel::Slow => "Low - a few sales per month",
            DemandLevel::Cold => "Very low - sales are rare",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceTrend {
    Rising,
    Stable,
    Declining,
}

/// Synthesized market report for one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketIntelligence {
    /// Most recent first
    pub recent_sales: Vec<SoldListing>,
    pub average_sold_price: i64,
    pub price_range: PriceRange,
    pub sales_velocity: String,
    pub active_listings: Vec<ActiveListing>,
    pub average_asking_price: i64,
    pub demand_level: DemandLevel,
    pub price_trend: PriceTrend,
    pub best_venues: Vec<String>,
    pub seasonality: Option<String>,
    pub data_confidence: f64,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_dated(date: &str) -> SoldListing {
        SoldListing {
            id: "ebay-1".to_string(),
            title: "Teak sideboard".to_string(),
            sold_price: 120_000,
            sold_date: date.to_string(),
            source: Marketplace::Ebay,
            condition: "Used".to_string(),
            image_url: None,
            url: "https://www.ebay.com/itm/1".to_string(),
            similarity: 1.0,
            notes: None,
        }
    }

    #[test]
    fn sold_at_accepts_timestamps_and_plain_dates() {
        assert!(listing_dated("2024-03-01T10:15:00.000Z").sold_at().is_some());
        assert!(listing_dated("2024-03-01T10:15:00+02:00").sold_at().is_some());
        assert_eq!(
            listing_dated("2024-03-01").sold_at().map(|t| t.to_rfc3339()),
            Some("2024-03-01T00:00:00+00:00".to_string())
        );
        assert!(listing_dated("last tuesday").sold_at().is_none());
        assert!(listing_dated("").sold_at().is_none());
    }

    #[test]
    fn demand_level_thresholds_are_inclusive() {
        assert_eq!(DemandLevel::from_sales_count(15), DemandLevel::Hot);
        assert_eq!(DemandLevel::from_sales_count(14), DemandLevel::Steady);
        assert_eq!(DemandLevel::from_sales_count(8), DemandLevel::Steady);
        assert_eq!(DemandLevel::from_sales_count(7), DemandLevel::Slow);
        assert_eq!(DemandLevel::from_sales_count(3), DemandLevel::Slow);
        assert_eq!(DemandLevel::from_sales_count(2), DemandLevel::Cold);
        assert_eq!(DemandLevel::from_sales_count(0), DemandLevel::Cold);
    }

    #[test]
    fn estimate_range_normalizes_inverted_and_negative_bounds() {
        assert_eq!(EstimateRange::new(300, 100).normalized(), EstimateRange::new(100, 300));
        assert_eq!(EstimateRange::new(-50, 100).normalized(), EstimateRange::new(0, 100));
    }

    #[test]
    fn search_url_encodes_query() {
        let url = Marketplace::Etsy.search_url("Eames Lounge Chair");
        assert_eq!(url, "https://www.etsy.com/search?q=Eames+Lounge+Chair");
    }
}
