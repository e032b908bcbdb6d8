//! Error types for the calculators library

use thiserror::Error;

use crate::calculator::CalculatorKind;
use crate::session::AccessRequirement;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown field '{field}' for {calculator}")]
    UnknownField {
        calculator: CalculatorKind,
        field: String,
    },

    #[error("Calculator mismatch: expected {expected}, got {actual}")]
    CalculatorMismatch {
        expected: CalculatorKind,
        actual: CalculatorKind,
    },

    #[error("{calculator} is locked: requires {requirement}")]
    Locked {
        calculator: CalculatorKind,
        requirement: AccessRequirement,
    },

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("An optimization request is already in flight")]
    RequestInFlight,

    #[error("Stale optimization: issued at revision {issued}, inputs now at revision {current}")]
    StaleOptimization { issued: u64, current: u64 },

    #[error("No optimization request is pending")]
    NoPendingRequest,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
