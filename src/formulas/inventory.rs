//! Stock cover, reorder point and working capital for the next purchase order

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ratio;

/// Stock above the reorder point but within this multiple of it is a warning
pub const WARNING_BUFFER: f64 = 1.2;

/// Suggested orders cover this many reorder-point quantities
const ORDER_COVER_MULTIPLE: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInput {
    pub avg_daily_sales: f64,
    pub current_stock: f64,
    /// Supplier lead time in days
    pub lead_time: f64,
    pub safety_stock_days: f64,
    pub unit_cost: f64,
    /// Minimum order quantity
    pub moq: f64,
}

impl Default for InventoryInput {
    fn default() -> Self {
        Self {
            avg_daily_sales: 20.0,
            current_stock: 500.0,
            lead_time: 15.0,
            safety_stock_days: 7.0,
            unit_cost: 350.0,
            moq: 500.0,
        }
    }
}

/// Stock health, first match wins: critical, then warning, then healthy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Critical,
    Warning,
    Healthy,
}

/// When the next purchase order should be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "camelCase")]
pub enum ReorderTiming {
    /// Reorder point already passed
    Immediately,
    On { date: NaiveDate },
    /// No sales velocity, so stock never depletes
    NotNeeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMetrics {
    /// Days of cover at current sales; `None` when nothing sells
    pub days_of_inventory: Option<f64>,
    pub reorder_point_units: f64,
    pub status: StockStatus,
    pub suggested_order_units: f64,
    pub capital_required: f64,
    /// Negative when the reorder is overdue
    pub days_until_reorder: Option<f64>,
    pub stockout_date: Option<NaiveDate>,
    pub reorder: ReorderTiming,
}

/// Compute inventory metrics as of `today`
pub fn calculate(input: &InventoryInput, today: NaiveDate) -> InventoryMetrics {
    let days_of_inventory = if input.avg_daily_sales > 0.0 {
        Some(ratio(input.current_stock, input.avg_daily_sales))
    } else {
        None
    };

    let reorder_point_units = input.avg_daily_sales * (input.lead_time + input.safety_stock_days);

    let status = if input.current_stock <= reorder_point_units {
        StockStatus::Critical
    } else if input.current_stock <= reorder_point_units * WARNING_BUFFER {
        StockStatus::Warning
    } else {
        StockStatus::Healthy
    };

    let suggested_order_units = input.moq.max(reorder_point_units * ORDER_COVER_MULTIPLE);
    let capital_required = suggested_order_units * input.unit_cost;

    let days_until_reorder =
        days_of_inventory.map(|days| days - input.lead_time - input.safety_stock_days);

    let stockout_date = days_of_inventory.and_then(|days| add_days(today, days));

    let reorder = match days_until_reorder {
        None => ReorderTiming::NotNeeded,
        Some(days) if days < 0.0 => ReorderTiming::Immediately,
        Some(days) => match add_days(today, days) {
            Some(date) => ReorderTiming::On { date },
            None => ReorderTiming::NotNeeded,
        },
    };

    InventoryMetrics {
        days_of_inventory,
        reorder_point_units,
        status,
        suggested_order_units,
        capital_required,
        days_until_reorder,
        stockout_date,
        reorder,
    }
}

/// Add a fractional day count (truncated to whole days) to a date
fn add_days(date: NaiveDate, days: f64) -> Option<NaiveDate> {
    if !days.is_finite() || days < 0.0 || days > u32::MAX as f64 {
        return None;
    }
    date.checked_add_days(Days::new(days.trunc() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn input(daily: f64, stock: f64, lead: f64, safety: f64) -> InventoryInput {
        InventoryInput {
            avg_daily_sales: daily,
            current_stock: stock,
            lead_time: lead,
            safety_stock_days: safety,
            unit_cost: 200.0,
            moq: 1000.0,
        }
    }

    #[test]
    fn test_reference_healthy_scenario() {
        let m = calculate(&input(25.0, 1200.0, 20.0, 10.0), today());

        assert_abs_diff_eq!(m.reorder_point_units, 750.0);
        assert_eq!(m.status, StockStatus::Healthy);
        assert_abs_diff_eq!(m.days_of_inventory.unwrap(), 48.0);
        assert_abs_diff_eq!(m.days_until_reorder.unwrap(), 18.0);
        assert_eq!(m.stockout_date, NaiveDate::from_ymd_opt(2026, 4, 18));
        assert_eq!(
            m.reorder,
            ReorderTiming::On { date: NaiveDate::from_ymd_opt(2026, 3, 19).unwrap() }
        );
    }

    #[test]
    fn test_status_thresholds() {
        // Reorder point 750, warning band up to 900
        assert_eq!(calculate(&input(25.0, 750.0, 20.0, 10.0), today()).status, StockStatus::Critical);
        assert_eq!(calculate(&input(25.0, 751.0, 20.0, 10.0), today()).status, StockStatus::Warning);
        assert_eq!(calculate(&input(25.0, 900.0, 20.0, 10.0), today()).status, StockStatus::Warning);
        assert_eq!(calculate(&input(25.0, 901.0, 20.0, 10.0), today()).status, StockStatus::Healthy);
    }

    #[test]
    fn test_suggested_order_respects_moq() {
        // 2 x 750 = 1500 beats MOQ of 1000
        let m = calculate(&input(25.0, 1200.0, 20.0, 10.0), today());
        assert_abs_diff_eq!(m.suggested_order_units, 1500.0);
        assert_abs_diff_eq!(m.capital_required, 300_000.0);

        // 2 x 150 = 300 loses to MOQ
        let m = calculate(&input(5.0, 1200.0, 20.0, 10.0), today());
        assert_abs_diff_eq!(m.suggested_order_units, 1000.0);
        assert_abs_diff_eq!(m.capital_required, 200_000.0);
    }

    #[test]
    fn test_overdue_reorder_is_immediate() {
        let m = calculate(&input(25.0, 500.0, 20.0, 10.0), today());
        assert_eq!(m.status, StockStatus::Critical);
        assert!(m.days_until_reorder.unwrap() < 0.0);
        assert_eq!(m.reorder, ReorderTiming::Immediately);
        assert_eq!(m.stockout_date, NaiveDate::from_ymd_opt(2026, 3, 21));
    }

    #[test]
    fn test_zero_sales_never_stocks_out() {
        let m = calculate(&input(0.0, 400.0, 20.0, 10.0), today());

        assert_eq!(m.days_of_inventory, None);
        assert_eq!(m.stockout_date, None);
        assert_eq!(m.reorder, ReorderTiming::NotNeeded);
        assert_eq!(m.reorder_point_units, 0.0);
        assert_eq!(m.status, StockStatus::Healthy);
    }

    #[test]
    fn test_fractional_days_truncate() {
        // 100 / 30 = 3.33 days of cover
        let m = calculate(&input(30.0, 100.0, 0.0, 0.0), today());
        assert_eq!(m.stockout_date, NaiveDate::from_ymd_opt(2026, 3, 4));
    }
}
