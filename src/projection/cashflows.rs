//! Projection output structures

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single period of the cash-flow projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRow {
    /// Period index (1-indexed)
    pub period: u32,

    /// End-of-period cash, floored at zero
    pub cash_balance: f64,

    /// End-of-period cash without the display floor
    pub unbounded_cash: f64,

    pub profit: f64,
    pub revenue: f64,
    pub units: f64,
    pub variable_costs: f64,
}

/// Complete projection result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    /// Period rows in order
    pub periods: Vec<PeriodRow>,

    /// First period with positive profit, if any within the horizon
    pub months_to_profitability: Option<u32>,

    /// First period in which the unbounded cash balance drops below zero
    pub cash_out_period: Option<u32>,
}

impl ProjectionResult {
    pub fn new() -> Self {
        Self {
            periods: Vec::new(),
            months_to_profitability: None,
            cash_out_period: None,
        }
    }

    /// Add a period row, tracking the first profitable and first insolvent periods
    pub fn add_row(&mut self, row: PeriodRow) {
        if self.months_to_profitability.is_none() && row.profit > 0.0 {
            self.months_to_profitability = Some(row.period);
        }
        if self.cash_out_period.is_none() && row.unbounded_cash < 0.0 {
            self.cash_out_period = Some(row.period);
        }
        self.periods.push(row);
    }

    /// Get summary statistics
    pub fn summary(&self) -> ProjectionSummary {
        let total_revenue: f64 = self.periods.iter().map(|r| r.revenue).sum();
        let total_profit: f64 = self.periods.iter().map(|r| r.profit).sum();

        let ending_cash = self.periods.last().map(|r| r.unbounded_cash).unwrap_or(0.0);
        let lowest_cash = self
            .periods
            .iter()
            .map(|r| r.unbounded_cash)
            .fold(None, |low: Option<f64>, cash| Some(low.map_or(cash, |l| l.min(cash))))
            .unwrap_or(0.0);

        ProjectionSummary {
            total_periods: self.periods.len() as u32,
            total_revenue,
            total_profit,
            ending_cash,
            lowest_cash,
        }
    }
}

impl ProjectionResult {
    /// Write the period rows as CSV with a camelCase header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for row in &self.periods {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Default for ProjectionResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub total_periods: u32,
    pub total_revenue: f64,
    pub total_profit: f64,
    /// Unbounded cash at the end of the horizon
    pub ending_cash: f64,
    /// Lowest unbounded cash balance seen
    pub lowest_cash: f64,
}
