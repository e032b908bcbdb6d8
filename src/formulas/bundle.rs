//! Single-unit versus bundle offer economics
//!
//! Shipping and acquisition cost are paid once per order, not per unit, so a
//! bundle spreads them over more units even after a discount.

use serde::{Deserialize, Serialize};

use super::{pct, ratio};
use crate::input::{clamp_percent, finite_or_zero};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleInput {
    pub base_cost: f64,
    pub base_price: f64,
    /// Per order
    pub shipping: f64,
    /// Per order
    pub marketing_cpa: f64,
    /// Units per bundle
    pub bundle_size: f64,
    /// Discount on the bundle's list value, %
    pub bundle_discount: f64,
}

impl Default for BundleInput {
    fn default() -> Self {
        Self {
            base_cost: 300.0,
            base_price: 999.0,
            shipping: 80.0,
            marketing_cpa: 350.0,
            bundle_size: 3.0,
            bundle_discount: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMetrics {
    pub single_profit: f64,
    pub single_margin: f64,
    pub bundle_revenue: f64,
    pub bundle_cost: f64,
    pub bundle_profit: f64,
    pub bundle_margin: f64,
    /// Bundle profit per order relative to a single-unit order; 0 unless the bundle is profitable
    pub profit_multiplier: f64,
}

pub fn calculate(input: &BundleInput) -> BundleMetrics {
    // Both orders share the expression shape so a 1-unit, 0% bundle reproduces the single order
    let single_revenue = input.base_price;
    let single_cost = input.base_cost + input.shipping + input.marketing_cpa;
    let single_profit = single_revenue - single_cost;
    let single_margin = ratio(single_profit, single_revenue) * 100.0;

    let bundle_revenue = input.base_price * input.bundle_size * (1.0 - pct(input.bundle_discount));
    let bundle_cost = input.base_cost * input.bundle_size + input.shipping + input.marketing_cpa;
    let bundle_profit = bundle_revenue - bundle_cost;
    let bundle_margin = ratio(bundle_profit, bundle_revenue) * 100.0;

    let profit_multiplier = if bundle_profit > 0.0 {
        ratio(bundle_profit, single_profit)
    } else {
        0.0
    };

    BundleMetrics {
        single_profit,
        single_margin,
        bundle_revenue,
        bundle_cost,
        bundle_profit,
        bundle_margin,
        profit_multiplier,
    }
}

/// Whether a price sits above or below the competition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Positioning {
    Premium,
    Value,
}

/// Cost-plus price for a target gross margin, compared with a competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePositioning {
    pub suggested_price: f64,
    pub positioning: Positioning,
    /// Absolute gap to the competitor price, % of the competitor price
    pub gap_pct: f64,
}

/// Price needed for `target_margin_pct` gross margin on `cost`
///
/// Returns `None` for margins of 100% or more, which no finite price achieves.
pub fn price_for_margin(cost: f64, target_margin_pct: f64, competitor_price: f64) -> Option<PricePositioning> {
    let cost = finite_or_zero(cost);
    let target_margin_pct = clamp_percent(target_margin_pct);
    let competitor_price = finite_or_zero(competitor_price);
    if target_margin_pct >= 100.0 {
        return None;
    }
    let suggested_price = cost / (1.0 - pct(target_margin_pct));
    let positioning = if suggested_price > competitor_price {
        Positioning::Premium
    } else {
        Positioning::Value
    };

    Some(PricePositioning {
        suggested_price,
        positioning,
        gap_pct: ratio(suggested_price - competitor_price, competitor_price).abs() * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_bundle() {
        let m = calculate(&BundleInput::default());

        assert_abs_diff_eq!(m.single_profit, 269.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.bundle_revenue, 999.0 * 3.0 * 0.85, epsilon = 1e-9);
        assert_abs_diff_eq!(m.bundle_cost, 900.0 + 80.0 + 350.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.bundle_profit, 2547.45 - 1330.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.profit_multiplier, (2547.45 - 1330.0) / 269.0, epsilon = 1e-9);
        assert!(m.bundle_margin > 0.0);
    }

    #[test]
    fn test_unit_bundle_without_discount_matches_single() {
        let prices = [1.0, 499.0, 999.0, 1234.56];
        for &price in &prices {
            let input = BundleInput {
                base_price: price,
                bundle_size: 1.0,
                bundle_discount: 0.0,
                ..BundleInput::default()
            };
            let m = calculate(&input);
            assert_eq!(m.bundle_revenue, price);
            assert_eq!(m.bundle_profit, m.single_profit);
            assert_eq!(m.bundle_margin, m.single_margin);
        }
    }

    #[test]
    fn test_unprofitable_bundle_has_zero_multiplier() {
        let input = BundleInput {
            bundle_discount: 70.0,
            ..BundleInput::default()
        };
        let m = calculate(&input);
        assert!(m.bundle_profit <= 0.0);
        assert_eq!(m.profit_multiplier, 0.0);
    }

    #[test]
    fn test_zero_price_guarded() {
        let input = BundleInput {
            base_price: 0.0,
            ..BundleInput::default()
        };
        let m = calculate(&input);
        assert_eq!(m.single_margin, 0.0);
        assert_eq!(m.bundle_margin, 0.0);
    }

    #[test]
    fn test_price_for_margin() {
        let p = price_for_margin(500.0, 65.0, 1499.0).unwrap();
        assert_abs_diff_eq!(p.suggested_price, 500.0 / 0.35, epsilon = 1e-9);
        assert_eq!(p.positioning, Positioning::Value);
        assert_abs_diff_eq!(p.gap_pct, (1499.0 - 500.0 / 0.35) / 1499.0 * 100.0, epsilon = 1e-9);

        let p = price_for_margin(500.0, 80.0, 1499.0).unwrap();
        assert_eq!(p.positioning, Positioning::Premium);

        assert!(price_for_margin(500.0, 100.0, 1499.0).is_none());
    }

    #[test]
    fn test_price_for_margin_non_finite_arguments() {
        assert!(price_for_margin(500.0, 150.0, 1499.0).is_none());

        let p = price_for_margin(500.0, 50.0, f64::INFINITY).unwrap();
        assert_abs_diff_eq!(p.suggested_price, 1000.0, epsilon = 1e-9);
        assert_eq!(p.gap_pct, 0.0);

        let p = price_for_margin(f64::NAN, -10.0, 800.0).unwrap();
        assert_eq!(p.suggested_price, 0.0);
        assert_eq!(p.positioning, Positioning::Value);
        assert!(p.gap_pct.is_finite());
    }
}
