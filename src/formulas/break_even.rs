//! Break-even point, burn rate and runway
//!
//! Static snapshot metrics live here. The month-by-month cash simulation is in
//! [`crate::projection`]; [`analyze`] bundles both.

use serde::{Deserialize, Serialize};

use super::ratio;
use crate::projection::{ProjectionResult, RunwayProjector};

/// Monthly cost structure and cash position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvenInput {
    /// Salaries, rent, retainers (per month)
    pub fixed_costs: f64,
    pub avg_selling_price: f64,
    /// COGS + ad spend + shipping per unit
    pub avg_variable_cost: f64,
    pub cash_in_bank: f64,
    pub current_monthly_revenue: f64,
    /// Month-over-month revenue growth, %
    pub monthly_growth_rate: f64,
}

impl Default for BreakEvenInput {
    fn default() -> Self {
        Self {
            fixed_costs: 150_000.0,
            avg_selling_price: 2000.0,
            avg_variable_cost: 1200.0,
            cash_in_bank: 1_000_000.0,
            current_monthly_revenue: 300_000.0,
            monthly_growth_rate: 15.0,
        }
    }
}

/// Months of cash left at the current burn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Runway {
    /// Cash runs out after this many months at the current burn
    Finite { months: f64 },
    /// Current revenue already covers fixed costs
    Profitable,
}

impl Runway {
    pub fn months(&self) -> Option<f64> {
        match self {
            Runway::Finite { months } => Some(*months),
            Runway::Profitable => None,
        }
    }

    pub fn is_profitable(&self) -> bool {
        matches!(self, Runway::Profitable)
    }
}

/// Snapshot metrics at the current revenue level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvenMetrics {
    pub contribution_per_unit: f64,
    /// Unrounded units per month needed to cover fixed costs (0 if unreachable)
    pub break_even_units_exact: f64,
    /// Whole units per month needed to cover fixed costs
    pub break_even_units: u64,
    pub break_even_revenue: f64,
    /// Whether each unit contributes anything toward fixed costs
    pub break_even_reachable: bool,
    pub current_units: f64,
    /// Monthly cash loss, 0 once the business covers its fixed costs
    pub burn_rate: f64,
    pub runway: Runway,
}

/// Snapshot metrics plus the 18-month cash projection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunwayAnalysis {
    pub metrics: BreakEvenMetrics,
    pub projection: ProjectionResult,
}

pub fn calculate(input: &BreakEvenInput) -> BreakEvenMetrics {
    let contribution_per_unit = input.avg_selling_price - input.avg_variable_cost;
    let break_even_reachable = contribution_per_unit > 0.0;

    let break_even_units_exact = if break_even_reachable {
        ratio(input.fixed_costs, contribution_per_unit).max(0.0)
    } else {
        0.0
    };
    let break_even_units = break_even_units_exact.ceil() as u64;
    let break_even_revenue = break_even_units as f64 * input.avg_selling_price;

    let current_units = ratio(input.current_monthly_revenue, input.avg_selling_price);
    let burn = input.fixed_costs - current_units * contribution_per_unit;

    let runway = if burn > 0.0 {
        Runway::Finite {
            months: ratio(input.cash_in_bank, burn).max(0.0),
        }
    } else {
        Runway::Profitable
    };

    BreakEvenMetrics {
        contribution_per_unit,
        break_even_units_exact,
        break_even_units,
        break_even_revenue,
        break_even_reachable,
        current_units,
        burn_rate: burn.max(0.0),
        runway,
    }
}

pub fn analyze(input: &BreakEvenInput) -> RunwayAnalysis {
    RunwayAnalysis {
        metrics: calculate(input),
        projection: RunwayProjector::new().project(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn input(fixed: f64, price: f64, variable: f64) -> BreakEvenInput {
        BreakEvenInput {
            fixed_costs: fixed,
            avg_selling_price: price,
            avg_variable_cost: variable,
            ..BreakEvenInput::default()
        }
    }

    #[test]
    fn test_reference_break_even() {
        let m = calculate(&input(100_000.0, 1500.0, 800.0));
        assert_eq!(m.break_even_units, 143);
        assert_abs_diff_eq!(m.break_even_revenue, 214_500.0, epsilon = 1e-9);
        assert!(m.break_even_reachable);
    }

    #[test]
    fn test_ceiling_correctness() {
        let cases = [
            (100_000.0, 1500.0, 800.0),
            (150_000.0, 2000.0, 1200.0),
            (99_999.0, 999.0, 1.0),
            (12_345.0, 70.0, 33.0),
            (1.0, 3.0, 2.5),
        ];
        for &(fixed, price, variable) in &cases {
            let m = calculate(&input(fixed, price, variable));
            let unit = price - variable;
            let units = m.break_even_units as f64;
            assert!(units * unit >= fixed - 1e-9, "{} units too few for {}", units, fixed);
            assert!((units - 1.0) * unit < fixed, "{} units too many for {}", units, fixed);
        }
    }

    #[test]
    fn test_unreachable_break_even() {
        let m = calculate(&input(100_000.0, 800.0, 800.0));
        assert!(!m.break_even_reachable);
        assert_eq!(m.break_even_units, 0);
        assert_eq!(m.break_even_revenue, 0.0);
    }

    #[test]
    fn test_runway_finite_when_burning() {
        // Revenue 100k at price 2000 => 50 units * 800 = 40k contribution, burn 110k
        let data = BreakEvenInput {
            current_monthly_revenue: 100_000.0,
            ..BreakEvenInput::default()
        };
        let m = calculate(&data);
        assert_abs_diff_eq!(m.burn_rate, 110_000.0, epsilon = 1e-9);
        let months = m.runway.months().expect("finite runway");
        assert_abs_diff_eq!(months, 1_000_000.0 / 110_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_runway_profitable_state() {
        // Default: 150 units * 800 = 120k contribution against 150k fixed => still burning
        assert!(!calculate(&BreakEvenInput::default()).runway.is_profitable());

        let data = BreakEvenInput {
            current_monthly_revenue: 500_000.0,
            ..BreakEvenInput::default()
        };
        let m = calculate(&data);
        assert_eq!(m.runway, Runway::Profitable);
        assert_eq!(m.burn_rate, 0.0);
        assert_eq!(m.runway.months(), None);
    }

    #[test]
    fn test_zero_price_guarded() {
        let m = calculate(&input(50_000.0, 0.0, 100.0));
        assert_eq!(m.current_units, 0.0);
        assert_abs_diff_eq!(m.burn_rate, 50_000.0, epsilon = 1e-9);
        assert!(m.runway.months().map_or(false, f64::is_finite));
    }

    #[test]
    fn test_negative_cash_runway_floored() {
        let data = BreakEvenInput {
            cash_in_bank: -10_000.0,
            current_monthly_revenue: 0.0,
            ..BreakEvenInput::default()
        };
        assert_eq!(calculate(&data).runway, Runway::Finite { months: 0.0 });
    }
}
