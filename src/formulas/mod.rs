//! Formula engine: one pure module per calculator domain
//!
//! Each module maps an input record to a derived-metrics record. The functions
//! are total: degenerate denominators resolve to `0.0` (via [`ratio`]) or to an
//! explicit `None`/enum state, never to NaN or infinity.

pub mod unit_economics;
pub mod break_even;
pub mod marketing;
pub mod inventory;
pub mod rto;
pub mod bundle;

pub use unit_economics::{UnitEconomicsInput, UnitEconomicsMetrics, CostBreakdown};
pub use break_even::{BreakEvenInput, BreakEvenMetrics, Runway, RunwayAnalysis};
pub use marketing::{MarketingInput, MarketingMetrics};
pub use inventory::{InventoryInput, InventoryMetrics, StockStatus, ReorderTiming};
pub use rto::{RtoInput, RtoMetrics, PaymentModeEconomics, SettlementQuote};
pub use bundle::{BundleInput, BundleMetrics, PricePositioning, Positioning};

/// Divide, returning `0.0` when the denominator is zero or the quotient is not finite
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Convert a [0, 100] percentage into a fraction
pub fn pct(value: f64) -> f64 {
    value / 100.0
}
