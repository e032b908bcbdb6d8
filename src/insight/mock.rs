//! Mock backend for tests and offline use
//!
//! Text requests get a fixed recommendation list. JSON requests echo the
//! current inputs back as `optimizedData` unless a canned response is set.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{Error, Result};

use super::{GenerationRequest, InsightBackend};

const MOCK_INSIGHT: &str = "- Contribution margin is thin: trim COGS or raise price before scaling spend.\n\
- Push prepaid payments to cut RTO losses.\n\
- Track CAC payback monthly and pause channels above target.";

#[derive(Debug, Clone)]
enum Behaviour {
    Respond {
        insight: Option<String>,
        optimization: Option<String>,
    },
    Fail,
}

/// Predictable backend
#[derive(Debug, Clone)]
pub struct MockBackend {
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            behaviour: Behaviour::Respond {
                insight: None,
                optimization: None,
            },
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every request fails with a transport-style error
    pub fn failing() -> Self {
        Self {
            behaviour: Behaviour::Fail,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fixed text for insight requests (may be empty)
    pub fn with_insight(mut self, text: impl Into<String>) -> Self {
        if let Behaviour::Respond { insight, .. } = &mut self.behaviour {
            *insight = Some(text.into());
        }
        self
    }

    /// Fixed raw response for optimization requests
    pub fn with_optimization(mut self, raw: impl Into<String>) -> Self {
        if let Behaviour::Respond { optimization, .. } = &mut self.behaviour {
            *optimization = Some(raw.into());
        }
        self
    }

    /// Requests seen so far, shared between clones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InsightBackend for MockBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Fail => Err(Error::InvalidData("mock backend configured to fail".into())),
            Behaviour::Respond { insight, optimization } => {
                if request.json_output {
                    if let Some(raw) = optimization {
                        return Ok(raw.clone());
                    }
                    let echo = json!({
                        "optimizedData": request.inputs.clone().unwrap_or_else(|| json!({})),
                        "explanation": "Current inputs are already balanced.",
                        "impact": "No change",
                    });
                    Ok(echo.to_string())
                } else {
                    Ok(insight.clone().unwrap_or_else(|| MOCK_INSIGHT.to_string()))
                }
            }
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
