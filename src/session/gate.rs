//! Which identity each calculator needs before it is shown

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calculator::CalculatorKind;
use crate::controller::CalculatorController;
use crate::error::{Error, Result};

use super::Session;

/// Identity a calculator requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRequirement {
    Open,
    Email,
    Phone,
}

impl fmt::Display for AccessRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessRequirement::Open => f.write_str("nothing"),
            AccessRequirement::Email => f.write_str("an email sign-in"),
            AccessRequirement::Phone => f.write_str("a verified phone number"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Locked(AccessRequirement),
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted)
    }
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    rules: HashMap<CalculatorKind, AccessRequirement>,
}

impl Default for AccessGate {
    fn default() -> Self {
        let rules = CalculatorKind::ALL
            .iter()
            .map(|&kind| {
                let requirement = match kind {
                    CalculatorKind::UnitEconomics | CalculatorKind::MarketingBudget => AccessRequirement::Open,
                    CalculatorKind::BreakEven | CalculatorKind::Inventory => AccessRequirement::Email,
                    CalculatorKind::CodRto | CalculatorKind::BundlePricing => AccessRequirement::Phone,
                };
                (kind, requirement)
            })
            .collect();
        Self { rules }
    }
}

impl AccessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the requirement for one calculator
    pub fn with_rule(mut self, kind: CalculatorKind, requirement: AccessRequirement) -> Self {
        self.rules.insert(kind, requirement);
        self
    }

    pub fn requirement(&self, kind: CalculatorKind) -> AccessRequirement {
        self.rules.get(&kind).copied().unwrap_or(AccessRequirement::Open)
    }

    pub fn check(&self, kind: CalculatorKind, session: &Session) -> Access {
        let requirement = self.requirement(kind);
        let satisfied = match requirement {
            AccessRequirement::Open => true,
            AccessRequirement::Email => session.email().is_some(),
            AccessRequirement::Phone => session.phone().is_some(),
        };
        if satisfied {
            Access::Granted
        } else {
            Access::Locked(requirement)
        }
    }

    /// A controller for `kind`, or [`Error::Locked`] until the session
    /// carries the required identity
    pub fn open(&self, kind: CalculatorKind, session: &Session) -> Result<CalculatorController> {
        match self.check(kind, session) {
            Access::Granted => Ok(CalculatorController::new(kind)),
            Access::Locked(requirement) => Err(Error::Locked {
                calculator: kind,
                requirement,
            }),
        }
    }
}
