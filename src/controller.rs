//! Calculator controller: current inputs and their derived metrics
//!
//! Every edit recomputes the whole output synchronously. Edits bump a
//! revision counter; optimization results carry the revision they were
//! requested at and are refused once the inputs have moved on.

use chrono::{Local, NaiveDate};
use serde_json::json;

use crate::calculator::{CalculatorInput, CalculatorKind, CalculatorOutput};
use crate::error::{Error, Result};
use crate::input::parse_or_default;
use crate::insight::{FieldChange, Optimization};

/// Receipt for an outstanding optimization request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizationTicket {
    pub kind: CalculatorKind,
    /// Input revision the request was built from
    pub revision: u64,
}

/// Holds one calculator's state
#[derive(Debug, Clone)]
pub struct CalculatorController {
    input: CalculatorInput,
    output: CalculatorOutput,
    as_of: NaiveDate,
    revision: u64,
    pending: Option<OptimizationTicket>,
}

impl CalculatorController {
    /// Controller with the calculator's default inputs, dated today
    pub fn new(kind: CalculatorKind) -> Self {
        Self::with_input(CalculatorInput::default_for(kind), Local::now().date_naive())
    }

    /// Controller over `input`, normalized like a user edit
    pub fn with_input(mut input: CalculatorInput, as_of: NaiveDate) -> Self {
        input.normalize();
        let output = input.evaluate(as_of);
        Self {
            input,
            output,
            as_of,
            revision: 0,
            pending: None,
        }
    }

    pub fn kind(&self) -> CalculatorKind {
        self.input.kind()
    }

    pub fn input(&self) -> &CalculatorInput {
        &self.input
    }

    pub fn output(&self) -> &CalculatorOutput {
        &self.output
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Move the reference date used for inventory dates
    pub fn set_as_of(&mut self, as_of: NaiveDate) {
        self.as_of = as_of;
        self.recompute();
    }

    /// Apply a raw text edit from the user. Unparseable text stores 0.
    pub fn set_field(&mut self, field: &str, raw: &str) -> Result<f64> {
        self.set_value(field, parse_or_default(raw))
    }

    pub fn set_value(&mut self, field: &str, value: f64) -> Result<f64> {
        let stored = self.input.set(field, value)?;
        self.revision += 1;
        self.recompute();
        Ok(stored)
    }

    /// Replace the whole input record (must be the same calculator)
    pub fn replace_input(&mut self, mut input: CalculatorInput) -> Result<()> {
        self.ensure_kind(input.kind())?;
        input.normalize();
        self.input = input;
        self.revision += 1;
        self.recompute();
        Ok(())
    }

    /// Inputs and metrics for an insight request
    pub fn snapshot(&self) -> serde_json::Value {
        json!({
            "inputs": self.input.to_fields_json(),
            "calculated": self.output.to_metrics_json(),
        })
    }

    /// Whether an optimization request is outstanding
    pub fn is_optimizing(&self) -> bool {
        self.pending.is_some()
    }

    /// Reserve the single optimization slot for this calculator
    pub fn begin_optimization(&mut self) -> Result<OptimizationTicket> {
        if self.pending.is_some() {
            return Err(Error::RequestInFlight);
        }
        let ticket = OptimizationTicket {
            kind: self.kind(),
            revision: self.revision,
        };
        self.pending = Some(ticket);
        Ok(ticket)
    }

    /// Release the slot without applying anything (request failed or was dismissed)
    pub fn cancel_optimization(&mut self, ticket: OptimizationTicket) {
        if self.pending == Some(ticket) {
            self.pending = None;
        }
    }

    /// Accept an optimization result, replacing the inputs
    ///
    /// Refused, leaving inputs untouched, when the ticket is not the pending
    /// one, the inputs were edited after the request, or the suggestion is
    /// for another calculator. The slot is released in every case.
    pub fn apply_optimization(
        &mut self,
        ticket: OptimizationTicket,
        optimization: &Optimization,
    ) -> Result<Vec<FieldChange>> {
        if self.pending != Some(ticket) {
            return Err(Error::NoPendingRequest);
        }
        self.pending = None;

        if ticket.revision != self.revision {
            log::warn!(
                "discarding {} optimization from revision {} (inputs at {})",
                ticket.kind,
                ticket.revision,
                self.revision
            );
            return Err(Error::StaleOptimization {
                issued: ticket.revision,
                current: self.revision,
            });
        }
        self.ensure_kind(optimization.optimized.kind())?;

        let changes = optimization.changes_from(&self.input);
        self.input = optimization.optimized.clone();
        self.revision += 1;
        self.recompute();

        log::info!("applied {} optimization ({} fields changed)", ticket.kind, changes.len());
        Ok(changes)
    }

    fn ensure_kind(&self, actual: CalculatorKind) -> Result<()> {
        let expected = self.kind();
        if expected != actual {
            return Err(Error::CalculatorMismatch { expected, actual });
        }
        Ok(())
    }

    fn recompute(&mut self) {
        self.output = self.input.evaluate(self.as_of);
        log::debug!("recomputed {} at revision {}", self.kind(), self.revision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::CalculatorOutput;
    use crate::formulas::unit_economics::UnitEconomicsInput;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn controller(kind: CalculatorKind) -> CalculatorController {
        CalculatorController::with_input(CalculatorInput::default_for(kind), today())
    }

    fn suggestion(kind: CalculatorKind, field: &str, value: f64) -> Optimization {
        let mut optimized = CalculatorInput::default_for(kind);
        optimized.set(field, value).unwrap();
        Optimization {
            optimized,
            explanation: "Raise the price".to_string(),
            impact: "Margin improves".to_string(),
            rejected_fields: Vec::new(),
        }
    }

    fn margin(c: &CalculatorController) -> f64 {
        match c.output() {
            CalculatorOutput::UnitEconomics(m) => m.contribution_margin,
            other => panic!("unexpected output {:?}", other.kind()),
        }
    }

    #[test]
    fn test_edit_recomputes() {
        let mut c = controller(CalculatorKind::UnitEconomics);
        assert!((margin(&c) - 275.0).abs() < 1e-9);

        c.set_field("sellingPrice", "1600").unwrap();
        assert_eq!(c.revision(), 1);
        // Gateway and returns scale with price: +100 - 2 - 15
        assert!((margin(&c) - 358.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_text_stores_zero() {
        let mut c = controller(CalculatorKind::UnitEconomics);
        assert_eq!(c.set_field("cogs", "lots").unwrap(), 0.0);
        assert_eq!(c.input().get("cogs"), Some(0.0));
    }

    #[test]
    fn test_unknown_field_leaves_state() {
        let mut c = controller(CalculatorKind::MarketingBudget);
        assert!(c.set_field("sellingPrice", "10").is_err());
        assert_eq!(c.revision(), 0);
    }

    #[test]
    fn test_snapshot_shape() {
        let c = controller(CalculatorKind::MarketingBudget);
        let snapshot = c.snapshot();
        assert_eq!(snapshot["inputs"]["aov"], 2000.0);
        assert_eq!(snapshot["calculated"]["budget"], 250_000.0);
    }

    #[test]
    fn test_single_request_in_flight() {
        let mut c = controller(CalculatorKind::UnitEconomics);
        let ticket = c.begin_optimization().unwrap();
        assert!(c.is_optimizing());
        assert!(matches!(c.begin_optimization(), Err(Error::RequestInFlight)));

        c.cancel_optimization(ticket);
        assert!(!c.is_optimizing());
        assert!(c.begin_optimization().is_ok());
    }

    #[test]
    fn test_apply_optimization() {
        let mut c = controller(CalculatorKind::UnitEconomics);
        let ticket = c.begin_optimization().unwrap();

        let changes = c
            .apply_optimization(ticket, &suggestion(CalculatorKind::UnitEconomics, "sellingPrice", 1800.0))
            .unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "sellingPrice");
        assert_eq!(c.input().get("sellingPrice"), Some(1800.0));
        assert!(!c.is_optimizing());
        assert_eq!(c.revision(), 1);
    }

    #[test]
    fn test_stale_optimization_rejected() {
        let mut c = controller(CalculatorKind::UnitEconomics);
        let ticket = c.begin_optimization().unwrap();

        c.set_field("cogs", "500").unwrap();

        let result = c.apply_optimization(ticket, &suggestion(CalculatorKind::UnitEconomics, "sellingPrice", 1800.0));
        assert!(matches!(result, Err(Error::StaleOptimization { issued: 0, current: 1 })));
        assert_eq!(c.input().get("sellingPrice"), Some(1500.0));
        assert_eq!(c.input().get("cogs"), Some(500.0));
        assert!(!c.is_optimizing());
    }

    #[test]
    fn test_mismatched_optimization_rejected() {
        let mut c = controller(CalculatorKind::UnitEconomics);
        let ticket = c.begin_optimization().unwrap();

        let result = c.apply_optimization(ticket, &suggestion(CalculatorKind::MarketingBudget, "aov", 10.0));
        assert!(matches!(result, Err(Error::CalculatorMismatch { .. })));
        assert_eq!(c.input(), &CalculatorInput::default_for(CalculatorKind::UnitEconomics));
    }

    #[test]
    fn test_apply_without_ticket() {
        let mut c = controller(CalculatorKind::UnitEconomics);
        let ticket = OptimizationTicket {
            kind: CalculatorKind::UnitEconomics,
            revision: 0,
        };
        let result = c.apply_optimization(ticket, &suggestion(CalculatorKind::UnitEconomics, "cogs", 1.0));
        assert!(matches!(result, Err(Error::NoPendingRequest)));
    }

    #[test]
    fn test_replaced_input_is_normalized() {
        let mut c = controller(CalculatorKind::UnitEconomics);
        let raw = UnitEconomicsInput {
            selling_price: f64::NAN,
            returns_percent: 250.0,
            ..Default::default()
        };

        c.replace_input(CalculatorInput::UnitEconomics(raw)).unwrap();

        assert_eq!(c.input().get("sellingPrice"), Some(0.0));
        assert_eq!(c.input().get("returnsPercent"), Some(100.0));
        assert_eq!(c.revision(), 1);
        assert!(margin(&c).is_finite());
        assert!(!format!("{:?}", c.output()).contains("NaN"));
    }

    #[test]
    fn test_replace_with_other_calculator_refused() {
        let mut c = controller(CalculatorKind::UnitEconomics);
        let result = c.replace_input(CalculatorInput::default_for(CalculatorKind::BundlePricing));
        assert!(matches!(result, Err(Error::CalculatorMismatch { .. })));
        assert_eq!(c.revision(), 0);
    }

    #[test]
    fn test_constructed_input_is_normalized() {
        let raw = UnitEconomicsInput {
            payment_gateway_percent: -5.0,
            cogs: f64::INFINITY,
            ..Default::default()
        };
        let c = CalculatorController::with_input(CalculatorInput::UnitEconomics(raw), today());
        assert_eq!(c.input().get("paymentGatewayPercent"), Some(0.0));
        assert_eq!(c.input().get("cogs"), Some(0.0));
    }

    #[test]
    fn test_inventory_dates_follow_as_of() {
        let mut c = controller(CalculatorKind::Inventory);
        let before = match c.output() {
            CalculatorOutput::Inventory(m) => m.stockout_date,
            _ => unreachable!(),
        };
        c.set_as_of(today().succ_opt().unwrap());
        let after = match c.output() {
            CalculatorOutput::Inventory(m) => m.stockout_date,
            _ => unreachable!(),
        };
        assert_eq!(after, before.and_then(|d| d.succ_opt()));
    }
}
