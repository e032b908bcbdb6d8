//! The six calculators as one closed set
//!
//! [`CalculatorInput`] and [`CalculatorOutput`] are tagged variants over the
//! calculator domains. External JSON (batch files, AI suggestions) is checked
//! against these types at the boundary and never trusted by shape alone.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::formulas::{
    self, BreakEvenInput, BundleInput, BundleMetrics, InventoryInput,
    InventoryMetrics, MarketingInput, MarketingMetrics, RtoInput, RtoMetrics, RunwayAnalysis, UnitEconomicsInput,
    UnitEconomicsMetrics,
};
use crate::input::{clamp_percent, finite_or_zero};

/// Which calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculatorKind {
    UnitEconomics,
    MarketingBudget,
    BreakEven,
    Inventory,
    CodRto,
    BundlePricing,
}

impl CalculatorKind {
    pub const ALL: [CalculatorKind; 6] = [
        CalculatorKind::UnitEconomics,
        CalculatorKind::MarketingBudget,
        CalculatorKind::BreakEven,
        CalculatorKind::Inventory,
        CalculatorKind::CodRto,
        CalculatorKind::BundlePricing,
    ];

    /// Short route name; unit economics is the root route
    pub fn slug(&self) -> &'static str {
        match self {
            CalculatorKind::UnitEconomics => "",
            CalculatorKind::MarketingBudget => "marketing",
            CalculatorKind::BreakEven => "runway",
            CalculatorKind::Inventory => "inventory",
            CalculatorKind::CodRto => "rto",
            CalculatorKind::BundlePricing => "bundles",
        }
    }

    /// Resolve a route (with or without a leading `#` and query string).
    /// Unknown routes land on unit economics.
    pub fn from_route(route: &str) -> Self {
        let clean = route.trim_start_matches('#').split('?').next().unwrap_or("");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| !kind.slug().is_empty() && kind.slug() == clean)
            .unwrap_or(CalculatorKind::UnitEconomics)
    }

    pub fn title(&self) -> &'static str {
        match self {
            CalculatorKind::UnitEconomics => "Unit Economics Calculator",
            CalculatorKind::MarketingBudget => "Marketing Budget Simulator",
            CalculatorKind::BreakEven => "Runway and Cashflow Planner",
            CalculatorKind::Inventory => "Inventory & Capital Planner",
            CalculatorKind::CodRto => "COD & RTO Analyzer",
            CalculatorKind::BundlePricing => "Bundle Pricing Comparator",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CalculatorKind::UnitEconomics => "Product-level profitability per unit sold",
            CalculatorKind::MarketingBudget => "Ad spend, ROAS and the funnel needed to hit a revenue target",
            CalculatorKind::BreakEven => "Break-even point, burn, runway and an 18-month cash simulation",
            CalculatorKind::Inventory => "Stockout risk, reorder point and working capital for the next order",
            CalculatorKind::CodRto => "True cost of cash-on-delivery and return-to-origin orders",
            CalculatorKind::BundlePricing => "Single-unit versus bundle offer economics",
        }
    }

    /// Context label sent with insight requests
    pub fn context_label(&self) -> &'static str {
        match self {
            CalculatorKind::UnitEconomics => "unit economics",
            CalculatorKind::MarketingBudget => "marketing budget planning",
            CalculatorKind::BreakEven => "startup runway and cash flow",
            CalculatorKind::Inventory => "inventory and working capital planning",
            CalculatorKind::CodRto => "COD and RTO profitability",
            CalculatorKind::BundlePricing => "bundle pricing strategy",
        }
    }

    /// Context label sent with optimization requests
    pub fn optimization_goal(&self) -> &'static str {
        match self {
            CalculatorKind::UnitEconomics => "Unit Economics (Goal: Healthy Contribution Margin)",
            CalculatorKind::MarketingBudget => "Marketing Budget & ROAS Planning (Goal: Maximize Efficiency)",
            CalculatorKind::BreakEven => "Runway & Cash Flow (Goal: Reach Profitability Before Cash Runs Out)",
            CalculatorKind::Inventory => "Inventory Planning (Goal: Avoid Stockouts With Minimal Capital)",
            CalculatorKind::CodRto => "COD & RTO Mix (Goal: Maximize Blended Profit per Order)",
            CalculatorKind::BundlePricing => "Bundle Offer Design (Goal: Maximize Profit per Order)",
        }
    }

    fn serde_name(&self) -> &'static str {
        match self {
            CalculatorKind::UnitEconomics => "unit-economics",
            CalculatorKind::MarketingBudget => "marketing-budget",
            CalculatorKind::BreakEven => "break-even",
            CalculatorKind::Inventory => "inventory",
            CalculatorKind::CodRto => "cod-rto",
            CalculatorKind::BundlePricing => "bundle-pricing",
        }
    }
}

impl fmt::Display for CalculatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.serde_name())
    }
}

impl FromStr for CalculatorKind {
    type Err = Error;

    /// Accepts either the route slug or the kebab-case name
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.serde_name() == name || (!kind.slug().is_empty() && kind.slug() == name))
            .ok_or_else(|| Error::InvalidData(format!("Unknown calculator: {}", s)))
    }
}

/// Named numeric fields of an input record
pub trait InputFields {
    /// Field names in declaration order, as they appear on the wire
    const FIELDS: &'static [&'static str];

    /// Fields stored as percentages in [0, 100]
    const PERCENT_FIELDS: &'static [&'static str];

    fn get(&self, field: &str) -> Option<f64>;

    fn slot(&mut self, field: &str) -> Option<&mut f64>;
}

macro_rules! impl_input_fields {
    ($ty:ty { $($name:literal => $field:ident),* $(,)? } percent [$($pct:literal),*]) => {
        impl InputFields for $ty {
            const FIELDS: &'static [&'static str] = &[$($name),*];
            const PERCENT_FIELDS: &'static [&'static str] = &[$($pct),*];

            fn get(&self, field: &str) -> Option<f64> {
                match field {
                    $($name => Some(self.$field),)*
                    _ => None,
                }
            }

            fn slot(&mut self, field: &str) -> Option<&mut f64> {
                match field {
                    $($name => Some(&mut self.$field),)*
                    _ => None,
                }
            }
        }
    };
}

impl_input_fields!(UnitEconomicsInput {
    "sellingPrice" => selling_price,
    "cogs" => cogs,
    "shipping" => shipping,
    "packaging" => packaging,
    "marketingCpa" => marketing_cpa,
    "paymentGatewayPercent" => payment_gateway_percent,
    "returnsPercent" => returns_percent,
} percent ["paymentGatewayPercent", "returnsPercent"]);

impl_input_fields!(MarketingInput {
    "targetRevenue" => target_revenue,
    "aov" => aov,
    "targetRoas" => target_roas,
    "cpc" => cpc,
} percent []);

impl_input_fields!(BreakEvenInput {
    "fixedCosts" => fixed_costs,
    "avgSellingPrice" => avg_selling_price,
    "avgVariableCost" => avg_variable_cost,
    "cashInBank" => cash_in_bank,
    "currentMonthlyRevenue" => current_monthly_revenue,
    "monthlyGrowthRate" => monthly_growth_rate,
} percent ["monthlyGrowthRate"]);

impl_input_fields!(InventoryInput {
    "avgDailySales" => avg_daily_sales,
    "currentStock" => current_stock,
    "leadTime" => lead_time,
    "safetyStockDays" => safety_stock_days,
    "unitCost" => unit_cost,
    "moq" => moq,
} percent []);

impl_input_fields!(RtoInput {
    "asp" => asp,
    "cogs" => cogs,
    "forwardShipping" => forward_shipping,
    "reverseShipping" => reverse_shipping,
    "codFee" => cod_fee,
    "gatewayPercent" => gateway_percent,
    "prepaidShare" => prepaid_share,
    "rtoPrepaid" => rto_prepaid,
    "rtoCod" => rto_cod,
} percent ["gatewayPercent", "prepaidShare", "rtoPrepaid", "rtoCod"]);

impl_input_fields!(BundleInput {
    "baseCost" => base_cost,
    "basePrice" => base_price,
    "shipping" => shipping,
    "marketingCpa" => marketing_cpa,
    "bundleSize" => bundle_size,
    "bundleDiscount" => bundle_discount,
} percent ["bundleDiscount"]);

/// Input record for any calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "calculator", content = "inputs", rename_all = "kebab-case")]
pub enum CalculatorInput {
    UnitEconomics(UnitEconomicsInput),
    MarketingBudget(MarketingInput),
    BreakEven(BreakEvenInput),
    Inventory(InventoryInput),
    CodRto(RtoInput),
    BundlePricing(BundleInput),
}

/// Derived metrics for any calculator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "calculator", content = "metrics", rename_all = "kebab-case")]
pub enum CalculatorOutput {
    UnitEconomics(UnitEconomicsMetrics),
    MarketingBudget(MarketingMetrics),
    BreakEven(RunwayAnalysis),
    Inventory(InventoryMetrics),
    CodRto(RtoMetrics),
    BundlePricing(BundleMetrics),
}

/// Dispatch an expression over the inner record of a [`CalculatorInput`]
macro_rules! with_record {
    ($input:expr, $record:ident => $body:expr) => {
        match $input {
            CalculatorInput::UnitEconomics($record) => $body,
            CalculatorInput::MarketingBudget($record) => $body,
            CalculatorInput::BreakEven($record) => $body,
            CalculatorInput::Inventory($record) => $body,
            CalculatorInput::CodRto($record) => $body,
            CalculatorInput::BundlePricing($record) => $body,
        }
    };
}

fn field_names_of<T: InputFields>(_: &T) -> &'static [&'static str] {
    T::FIELDS
}

fn is_percent_field<T: InputFields>(_: &T, field: &str) -> bool {
    T::PERCENT_FIELDS.contains(&field)
}

impl CalculatorInput {
    /// Default starting values for a calculator
    pub fn default_for(kind: CalculatorKind) -> Self {
        match kind {
            CalculatorKind::UnitEconomics => CalculatorInput::UnitEconomics(Default::default()),
            CalculatorKind::MarketingBudget => CalculatorInput::MarketingBudget(Default::default()),
            CalculatorKind::BreakEven => CalculatorInput::BreakEven(Default::default()),
            CalculatorKind::Inventory => CalculatorInput::Inventory(Default::default()),
            CalculatorKind::CodRto => CalculatorInput::CodRto(Default::default()),
            CalculatorKind::BundlePricing => CalculatorInput::BundlePricing(Default::default()),
        }
    }

    pub fn kind(&self) -> CalculatorKind {
        match self {
            CalculatorInput::UnitEconomics(_) => CalculatorKind::UnitEconomics,
            CalculatorInput::MarketingBudget(_) => CalculatorKind::MarketingBudget,
            CalculatorInput::BreakEven(_) => CalculatorKind::BreakEven,
            CalculatorInput::Inventory(_) => CalculatorKind::Inventory,
            CalculatorInput::CodRto(_) => CalculatorKind::CodRto,
            CalculatorInput::BundlePricing(_) => CalculatorKind::BundlePricing,
        }
    }

    pub fn field_names(&self) -> &'static [&'static str] {
        with_record!(self, r => field_names_of(r))
    }

    pub fn is_percent_field(&self, field: &str) -> bool {
        with_record!(self, r => is_percent_field(r, field))
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        with_record!(self, r => r.get(field))
    }

    /// Store a value, normalizing it the way the input boundary does:
    /// non-finite becomes 0, percentages are clamped into [0, 100].
    /// Returns the value actually stored.
    pub fn set(&mut self, field: &str, value: f64) -> Result<f64> {
        let kind = self.kind();
        let percent = self.is_percent_field(field);
        let slot = with_record!(self, r => r.slot(field)).ok_or_else(|| Error::UnknownField {
            calculator: kind,
            field: field.to_string(),
        })?;

        let stored = if percent { clamp_percent(value) } else { finite_or_zero(value) };
        *slot = stored;
        Ok(stored)
    }

    /// Run every stored value back through [`CalculatorInput::set`]
    pub fn normalize(&mut self) {
        for (field, value) in self.values() {
            // names come from this record, so the lookup cannot miss
            let _ = self.set(field, value);
        }
    }

    /// All fields with their current values, in declaration order
    pub fn values(&self) -> Vec<(&'static str, f64)> {
        self.field_names()
            .iter()
            .filter_map(|name| self.get(name).map(|value| (*name, value)))
            .collect()
    }

    /// Inner record as a flat JSON object keyed by field name
    pub fn to_fields_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .values()
            .into_iter()
            .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Run the formula engine. `as_of` anchors inventory dates.
    pub fn evaluate(&self, as_of: NaiveDate) -> CalculatorOutput {
        match self {
            CalculatorInput::UnitEconomics(i) => {
                CalculatorOutput::UnitEconomics(formulas::unit_economics::calculate(i))
            }
            CalculatorInput::MarketingBudget(i) => {
                CalculatorOutput::MarketingBudget(formulas::marketing::calculate(i))
            }
            CalculatorInput::BreakEven(i) => CalculatorOutput::BreakEven(formulas::break_even::analyze(i)),
            CalculatorInput::Inventory(i) => {
                CalculatorOutput::Inventory(formulas::inventory::calculate(i, as_of))
            }
            CalculatorInput::CodRto(i) => CalculatorOutput::CodRto(formulas::rto::calculate(i)),
            CalculatorInput::BundlePricing(i) => {
                CalculatorOutput::BundlePricing(formulas::bundle::calculate(i))
            }
        }
    }
}

impl CalculatorOutput {
    pub fn kind(&self) -> CalculatorKind {
        match self {
            CalculatorOutput::UnitEconomics(_) => CalculatorKind::UnitEconomics,
            CalculatorOutput::MarketingBudget(_) => CalculatorKind::MarketingBudget,
            CalculatorOutput::BreakEven(_) => CalculatorKind::BreakEven,
            CalculatorOutput::Inventory(_) => CalculatorKind::Inventory,
            CalculatorOutput::CodRto(_) => CalculatorKind::CodRto,
            CalculatorOutput::BundlePricing(_) => CalculatorKind::BundlePricing,
        }
    }

    /// Inner metrics as JSON, without the variant tag
    pub fn to_metrics_json(&self) -> serde_json::Value {
        let value = match self {
            CalculatorOutput::UnitEconomics(m) => serde_json::to_value(m),
            CalculatorOutput::MarketingBudget(m) => serde_json::to_value(m),
            CalculatorOutput::BreakEven(m) => serde_json::to_value(m),
            CalculatorOutput::Inventory(m) => serde_json::to_value(m),
            CalculatorOutput::CodRto(m) => serde_json::to_value(m),
            CalculatorOutput::BundlePricing(m) => serde_json::to_value(m),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}
