//! D2C Calculators - deterministic financial calculators for e-commerce sellers
//!
//! This library provides:
//! - Unit economics, marketing budget, runway, inventory, COD/RTO and bundle formulas
//! - An 18-month cash-flow projection for the runway calculator
//! - Calculator controllers with revisioned inputs for safe AI optimization
//! - An insight gateway (Gemini or mock) with schema-checked suggestions
//! - Session identities, access gating and a write-only event log

pub mod error;
pub mod input;
pub mod formulas;
pub mod projection;
pub mod calculator;
pub mod controller;
pub mod insight;
pub mod session;
pub mod tracking;
pub mod config;
pub mod scenario;

// Re-export commonly used types
pub use error::{Error, Result};
pub use calculator::{CalculatorInput, CalculatorKind, CalculatorOutput, InputFields};
pub use controller::{CalculatorController, OptimizationTicket};
pub use projection::{RunwayProjector, ProjectionResult, PeriodRow, PROJECTION_PERIODS};
pub use insight::{FieldChange, InsightClient, InsightGateway, Optimization};
pub use session::{Access, AccessGate, AccessRequirement, Session};
pub use tracking::{DeviceType, EventLog, TrackedEvent};
pub use config::AppConfig;
pub use scenario::ScenarioRunner;
