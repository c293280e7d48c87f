use crate::error::SourceError;
use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const USER_AGENT: &str = concat!("vintage-market/", env!("CARGO_PKG_VERSION"));

/// Optional filters for a sold-listing search.
/// Sources ignore the filters their API does not support.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchFilters {
    /// Source-specific category identifier
    pub category: Option<String>,
    /// Minimum sold price (smallest currency unit)
    pub min_price: Option<i64>,
    /// Maximum sold price (smallest currency unit)
    pub max_price: Option<i64>,
}

impl SearchFilters {
    /// Price bounds clamped to zero; negative prices mean nothing to any source
    pub fn sanitized(&self) -> Self {
        Self {
            category: self.category.clone(),
            min_price: self.min_price.map(|p| p.max(0)),
            max_price: self.max_price.map(|p| p.max(0)),
        }
    }
}

/// Largest price accepted from a source, in the smallest currency unit.
/// Anything above is treated as corrupt data.
pub const MAX_PRICE_MINOR_UNITS: i64 = 1_000_000_000_000_000;

pub fn is_plausible_price(price: i64) -> bool {
    (0..=MAX_PRICE_MINOR_UNITS).contains(&price)
}

/// Relevance score from result rank when the source gives none:
/// `max(0.5, 1 - rank * decay)`
pub fn rank_similarity(rank: usize, decay: f64) -> f64 {
    (1.0 - rank as f64 * decay).clamp(0.5, 1.0)
}

/// Convert a major-unit amount (e.g. dollars) into the smallest currency unit
pub fn to_minor_units(amount: f64) -> Option<i64> {
    let minor = (amount * 100.0).round();
    if minor.is_finite() && minor >= 0.0 && minor <= MAX_PRICE_MINOR_UNITS as f64 {
        Some(minor as i64)
    } else {
        None
    }
}

/// Format a minor-unit amount as a major-unit decimal string, e.g. 12345 -> "123.45".
/// Negative amounts format as zero.
pub fn format_major_units(amount: i64) -> String {
    let amount = amount.max(0);
    format!("{}.{:02}", amount / 100, amount % 100)
}

pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(5))
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")
}

/// Check the status and decode a JSON body into the source's response schema
pub async fn read_json<T: DeserializeOwned>(
    source: &'static str,
    response: Response,
) -> Result<T, SourceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(source, status = status.as_u16(), "Source returned error status");
        return Err(SourceError::Status {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| SourceError::Parse(format!("{}: {}", source, e)))
}
