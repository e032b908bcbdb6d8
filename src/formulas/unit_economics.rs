//! Per-unit contribution margin for a single product

use serde::{Deserialize, Serialize};

use super::{pct, ratio};

/// Per-unit prices and costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitEconomicsInput {
    pub selling_price: f64,
    pub cogs: f64,
    pub shipping: f64,
    pub packaging: f64,
    /// Marketing spend per acquired order
    pub marketing_cpa: f64,
    /// Gateway fee as % of selling price
    pub payment_gateway_percent: f64,
    /// Return losses as % of selling price
    pub returns_percent: f64,
}

impl Default for UnitEconomicsInput {
    fn default() -> Self {
        Self {
            selling_price: 1500.0,
            cogs: 450.0,
            shipping: 80.0,
            packaging: 40.0,
            marketing_cpa: 400.0,
            payment_gateway_percent: 2.0,
            returns_percent: 15.0,
        }
    }
}

/// Derived unit economics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitEconomicsMetrics {
    pub gateway_fee: f64,
    pub return_cost: f64,
    pub total_variable_cost: f64,
    /// Negative when every unit sold loses money
    pub contribution_margin: f64,
    /// 0 when the selling price is 0
    pub margin_pct: f64,
    /// Minimum ROAS at which ad spend breaks even
    pub breakeven_roas: f64,
    pub breakdown: CostBreakdown,
}

/// Where each rupee of the selling price goes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub cogs: f64,
    pub marketing: f64,
    /// Shipping + packaging
    pub logistics: f64,
    /// Gateway fee + return cost
    pub fees_and_returns: f64,
    /// Contribution margin floored at 0
    pub profit: f64,
}

pub fn calculate(input: &UnitEconomicsInput) -> UnitEconomicsMetrics {
    let price = input.selling_price;
    let gateway_fee = price * pct(input.payment_gateway_percent);
    let return_cost = price * pct(input.returns_percent);

    let total_variable_cost = input.cogs
        + input.shipping
        + input.packaging
        + gateway_fee
        + input.marketing_cpa
        + return_cost;

    let contribution_margin = price - total_variable_cost;
    let margin_pct = ratio(contribution_margin, price) * 100.0;

    // Margin before ad spend; below 1 the floor keeps ROAS finite
    let pre_marketing_margin = price - (total_variable_cost - input.marketing_cpa);
    let breakeven_roas = price / pre_marketing_margin.max(1.0);

    UnitEconomicsMetrics {
        gateway_fee,
        return_cost,
        total_variable_cost,
        contribution_margin,
        margin_pct,
        breakeven_roas,
        breakdown: CostBreakdown {
            cogs: input.cogs,
            marketing: input.marketing_cpa,
            logistics: input.shipping + input.packaging,
            fees_and_returns: gateway_fee + return_cost,
            profit: contribution_margin.max(0.0),
        },
    }
}
