//! Ad budget required to hit a revenue target

use serde::{Deserialize, Serialize};

use super::ratio;

/// Implied conversion rates above this (in %) are flagged as hard to achieve
pub const AGGRESSIVE_CONVERSION_RATE_PCT: f64 = 5.0;

/// Campaign targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingInput {
    pub target_revenue: f64,
    /// Average order value
    pub aov: f64,
    pub target_roas: f64,
    /// Cost per click
    pub cpc: f64,
}

impl Default for MarketingInput {
    fn default() -> Self {
        Self {
            target_revenue: 1_000_000.0,
            aov: 2000.0,
            target_roas: 4.0,
            cpc: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingMetrics {
    pub budget: f64,
    pub conversions_needed: f64,
    pub clicks_needed: f64,
    /// Conversion rate (%) the campaign has to achieve
    pub implied_conversion_rate: f64,
    /// Maximum affordable cost per acquisition
    pub cpa: f64,
    pub conversion_rate_aggressive: bool,
}

/// All four inputs must be positive for meaningful output; any zero
/// denominator yields 0 for the affected metrics.
pub fn calculate(input: &MarketingInput) -> MarketingMetrics {
    let budget = ratio(input.target_revenue, input.target_roas);
    let conversions_needed = ratio(input.target_revenue, input.aov);
    let clicks_needed = ratio(budget, input.cpc);
    let implied_conversion_rate = ratio(conversions_needed, clicks_needed) * 100.0;
    let cpa = ratio(budget, conversions_needed);

    MarketingMetrics {
        budget,
        conversions_needed,
        clicks_needed,
        implied_conversion_rate,
        cpa,
        conversion_rate_aggressive: implied_conversion_rate > AGGRESSIVE_CONVERSION_RATE_PCT,
    }
}
