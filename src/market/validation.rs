use crate::market::intelligence::MarketIntelligenceService;
use crate::models::{EstimateRange, MarketIntelligence, PriceRange};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Largest relative deviation from the market midpoint still considered reasonable
const REASONABLE_DEVIATION: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Reasonable,
    Unreasonable,
    /// No market baseline to compare against
    InsufficientData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceValidation {
    pub status: ValidationStatus,
    /// False only when market data contradicts the estimate
    pub is_reasonable: bool,
    pub market_average: i64,
    pub confidence: f64,
    /// Suggested range when the estimate is off
    pub adjustment: Option<PriceRange>,
    pub explanation: String,
}

impl MarketIntelligenceService {
    /// Check an AI valuation against market data. The estimate also seeds the
    /// fallback sales, so there is always some baseline unless it is zero.
    pub async fn validate_price_estimate(
        &self,
        item_name: &str,
        maker: Option<&str>,
        estimate: EstimateRange,
    ) -> PriceValidation {
        let intel = self
            .get_market_intelligence(item_name, maker, None, Some(estimate))
            .await;
        let validation = compare_to_market(estimate, &intel);
        info!(
            item = item_name,
            status = ?validation.status,
            "Validated price estimate"
        );
        validation
    }
}

pub fn compare_to_market(estimate: EstimateRange, intel: &MarketIntelligence) -> PriceValidation {
    let ai_mid = estimate.normalized().midpoint();
    let range = intel.price_range;
    let market_mid = (range.low as f64 + range.high as f64) / 2.0;

    if market_mid <= 0.0 {
        warn!("Market midpoint is zero, cannot validate estimate");
        return PriceValidation {
            status: ValidationStatus::InsufficientData,
            is_reasonable: true,
            market_average: intel.average_sold_price,
            confidence: 0.0,
            adjustment: None,
            explanation: "Insufficient market data to validate this estimate".to_string(),
        };
    }

    let difference = (ai_mid - market_mid).abs() / market_mid;
    if difference < REASONABLE_DEVIATION {
        PriceValidation {
            status: ValidationStatus::Reasonable,
            is_reasonable: true,
            market_average: intel.average_sold_price,
            confidence: intel.data_confidence,
            adjustment: None,
            explanation: format!(
                "Estimate is consistent with market data from {} comparable sales",
                intel.recent_sales.len()
            ),
        }
    } else {
        PriceValidation {
            status: ValidationStatus::Unreasonable,
            is_reasonable: false,
            market_average: intel.average_sold_price,
            confidence: intel.data_confidence,
            adjustment: Some(range),
            explanation: format!(
                "Estimate differs from market data by {}%; comparable sales range from {} to {}",
                (difference * 100.0).round() as i64,
                range.low,
                range.high
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::aggregator::mock::{listing, MockSource};
    use crate::market::aggregator::MarketAggregator;
    use crate::market::intelligence::build_intelligence;
    use crate::sources::MarketSource;
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;

    /// Intelligence over real sales whose humanized range is exactly {low, high}
    fn market(low: i64, high: i64) -> MarketIntelligence {
        let sales = vec![listing("a", "2024-02-01", low), listing("b", "2024-01-01", high)];
        build_intelligence("Widget", None, "Widget", sales, 2, Utc::now())
    }

    #[test]
    fn within_half_of_market_is_reasonable() {
        let intel = market(1_000, 3_000);
        // market midpoint 2000; ai midpoint 2900 is 45% off
        let result = compare_to_market(EstimateRange::new(2_800, 3_000), &intel);
        assert_eq!(result.status, ValidationStatus::Reasonable);
        assert!(result.is_reasonable);
        assert!(result.adjustment.is_none());
        assert_eq!(result.confidence, 0.5);
        assert!(result.explanation.contains("2 comparable sales"));
    }

    #[test]
    fn exactly_half_off_is_unreasonable() {
        let intel = market(1_000, 3_000);
        let result = compare_to_market(EstimateRange::new(3_000, 3_000), &intel);
        assert_eq!(result.status, ValidationStatus::Unreasonable);
        assert!(!result.is_reasonable);
        assert_eq!(result.adjustment, Some(PriceRange { low: 1_000, high: 3_000 }));
        assert!(result.explanation.contains("50%"));
    }

    #[test]
    fn far_below_market_suggests_the_market_range() {
        let intel = market(1_000, 3_000);
        let result = compare_to_market(EstimateRange::new(100, 300), &intel);
        assert!(!result.is_reasonable);
        assert_eq!(result.adjustment, Some(intel.price_range));
        assert!(result.explanation.contains("90%"));
    }

    #[test]
    fn zero_market_midpoint_is_insufficient_data() {
        let intel = build_intelligence("Widget", None, "Widget", Vec::new(), 0, Utc::now());
        let result = compare_to_market(EstimateRange::new(100, 200), &intel);
        assert_eq!(result.status, ValidationStatus::InsufficientData);
        assert!(result.is_reasonable);
        assert!(result.adjustment.is_none());
        assert_eq!(result.confidence, 0.0);
        assert!(result.confidence.is_finite());
    }

    #[tokio::test]
    async fn estimate_seeds_its_own_baseline_without_sales() {
        let service = MarketIntelligenceService::new(
            MarketAggregator::new(Duration::from_secs(1)),
            None,
            Some(3),
        );
        let result = service
            .validate_price_estimate("Tin Toy Robot", Some("Marx"), EstimateRange::new(10_000, 30_000))
            .await;
        assert_eq!(result.status, ValidationStatus::Reasonable);
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.market_average, 20_000);

        let zero = service
            .validate_price_estimate("Tin Toy Robot", None, EstimateRange::new(0, 0))
            .await;
        assert_eq!(zero.status, ValidationStatus::InsufficientData);
    }

    #[tokio::test]
    async fn real_sales_can_contradict_the_estimate() {
        let sales = vec![
            listing("ebay-1", "2024-03-01", 50_000),
            listing("ebay-2", "2024-02-01", 60_000),
        ];
        let primary: Arc<dyn MarketSource> = MockSource::returning("eBay", sales);
        let service = MarketIntelligenceService::new(
            MarketAggregator::new(Duration::from_secs(1)),
            Some(primary),
            None,
        );
        let result = service
            .validate_price_estimate("Rolex Submariner", Some("Rolex"), EstimateRange::new(1_000, 2_000))
            .await;
        assert!(!result.is_reasonable);
        assert_eq!(result.adjustment, Some(PriceRange { low: 50_000, high: 60_000 }));
    }
}
