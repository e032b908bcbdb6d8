//! Scenario runner for batch evaluation
//!
//! Evaluates many input records against one reference date. Formula
//! evaluation is pure, so records are evaluated in parallel.

use std::path::Path;

use chrono::{Local, NaiveDate};
use rayon::prelude::*;

use crate::calculator::{CalculatorInput, CalculatorOutput};
use crate::error::Result;

/// Batch evaluator for calculator input records
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new();
///
/// // Sweep one input across several values
/// let base = CalculatorInput::default_for(CalculatorKind::UnitEconomics);
/// for (price, output) in runner.sweep(&base, "sellingPrice", &[1299.0, 1499.0, 1699.0])? {
///     println!("{}: {:?}", price, output);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    /// Reference date for inventory stockout and reorder dates
    as_of: NaiveDate,
}

impl ScenarioRunner {
    /// Runner dated today
    pub fn new() -> Self {
        Self::as_of(Local::now().date_naive())
    }

    pub fn as_of(as_of: NaiveDate) -> Self {
        Self { as_of }
    }

    pub fn date(&self) -> NaiveDate {
        self.as_of
    }

    /// Load a JSON array of tagged input records
    pub fn load_batch(path: &Path) -> Result<Vec<CalculatorInput>> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_batch(&text)
    }

    /// Parse a JSON array of tagged input records, normalizing every value
    /// the same way a user edit would
    pub fn parse_batch(json: &str) -> Result<Vec<CalculatorInput>> {
        let records: Vec<CalculatorInput> = serde_json::from_str(json)?;
        Ok(records
            .into_iter()
            .map(|mut input| {
                input.normalize();
                input
            })
            .collect())
    }

    pub fn run(&self, input: &CalculatorInput) -> CalculatorOutput {
        input.evaluate(self.as_of)
    }

    /// Evaluate every record, preserving order
    pub fn run_batch(&self, inputs: &[CalculatorInput]) -> Vec<CalculatorOutput> {
        inputs.par_iter().map(|input| self.run(input)).collect()
    }

    /// Evaluate `base` once per value of `field`
    pub fn sweep(&self, base: &CalculatorInput, field: &str, values: &[f64]) -> Result<Vec<(f64, CalculatorOutput)>> {
        let scenarios = values
            .iter()
            .map(|&value| {
                let mut input = base.clone();
                let stored = input.set(field, value)?;
                Ok((stored, input))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(scenarios
            .into_par_iter()
            .map(|(value, input)| (value, self.run(&input)))
            .collect())
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}
