//! Scenario projector for the runway calculator

mod state;
mod engine;
mod cashflows;

pub use state::ProjectionState;
pub use engine::{RunwayProjector, PROJECTION_PERIODS};
pub use cashflows::{PeriodRow, ProjectionResult, ProjectionSummary};
