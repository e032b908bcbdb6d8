//! Month-by-month cash-flow projection for the runway calculator

use crate::formulas::{ratio, BreakEvenInput};
use super::state::ProjectionState;
use super::cashflows::{PeriodRow, ProjectionResult};

/// Number of monthly periods in every projection
pub const PROJECTION_PERIODS: u32 = 18;

/// Projects cash, profit and revenue forward under constant fixed costs,
/// variable costs scaling linearly with revenue, and compounding growth
#[derive(Debug, Clone, Default)]
pub struct RunwayProjector;

impl RunwayProjector {
    pub fn new() -> Self {
        Self
    }

    /// Run the full projection horizon
    pub fn project(&self, input: &BreakEvenInput) -> ProjectionResult {
        let mut result = ProjectionResult::new();
        let mut state = ProjectionState::from_input(input);

        for _period in 1..=PROJECTION_PERIODS {
            state.advance_period();

            let row = self.calculate_period(input, &mut state);
            result.add_row(row);

            // Revenue for the next period compounds from this period's figure
            state.grow_revenue();
        }

        log::debug!(
            "projected {} periods: profitable at {:?}, cash out at {:?}",
            result.periods.len(),
            result.months_to_profitability,
            result.cash_out_period
        );

        result
    }

    /// Calculate profit and cash for a single period
    fn calculate_period(&self, input: &BreakEvenInput, state: &mut ProjectionState) -> PeriodRow {
        let units = ratio(state.revenue, input.avg_selling_price);
        let variable_costs = units * input.avg_variable_cost;
        let profit = state.revenue - variable_costs - input.fixed_costs;

        // The display floor is not fed back; a negative balance keeps accumulating
        state.apply_profit(profit);

        PeriodRow {
            period: state.period,
            cash_balance: state.displayed_cash(),
            unbounded_cash: state.cash,
            profit,
            revenue: state.revenue,
            units,
            variable_costs,
        }
    }
}
