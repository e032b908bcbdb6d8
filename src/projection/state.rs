//! Running state carried between projection periods

use crate::formulas::BreakEvenInput;
use crate::formulas::pct;

/// State of the business at a point in time during projection
#[derive(Debug, Clone)]
pub struct ProjectionState {
    /// Current projection period (1-indexed, 0 before the first advance)
    pub period: u32,

    /// Cash balance, allowed to go negative so insolvency keeps compounding
    pub cash: f64,

    /// Revenue booked in the current period
    pub revenue: f64,

    /// Monthly growth multiplier applied after each period
    growth_factor: f64,
}

impl ProjectionState {
    /// Initialize state from the calculator inputs at projection start
    pub fn from_input(input: &BreakEvenInput) -> Self {
        Self {
            period: 0,
            cash: input.cash_in_bank,
            revenue: input.current_monthly_revenue,
            growth_factor: 1.0 + pct(input.monthly_growth_rate),
        }
    }

    /// Advance to next period
    pub fn advance_period(&mut self) {
        self.period += 1;
    }

    /// Book a period's profit into the unbounded cash balance
    pub fn apply_profit(&mut self, profit: f64) {
        self.cash += profit;
    }

    /// Grow revenue for the following period
    pub fn grow_revenue(&mut self) {
        self.revenue *= self.growth_factor;
    }

    /// Cash as shown to the user (never below zero)
    pub fn displayed_cash(&self) -> f64 {
        self.cash.max(0.0)
    }
}
