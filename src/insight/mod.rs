//! Insight Gateway: AI commentary and input optimization
//!
//! # Architecture
//!
//! - `InsightBackend` trait: one text-generation call per request
//! - `InsightClient` enum: concrete wrapper over the backends (`GeminiBackend`, `MockBackend`)
//! - `InsightGateway`: builds prompts, validates responses and records events
//!
//! Gateway operations never fail outward. A failed insight becomes a
//! user-facing message; a failed or malformed optimization becomes `None`
//! and the calculator inputs stay as they were.
//!
//! # Usage
//!
//! ```rust,ignore
//! let gateway = InsightGateway::new(client, events);
//! let text = gateway.request_insight(kind.context_label(), &controller.snapshot(), session.user_label()).await;
//!
//! let ticket = controller.begin_optimization()?;
//! let current = controller.input().clone();
//! match gateway.request_optimization(&current, session.user_label()).await {
//!     Some(opt) => { gateway.accept_optimization(&mut controller, ticket, &opt, session.user_label())?; }
//!     None => controller.cancel_optimization(ticket),
//! }
//! ```

mod gemini;
mod mock;
pub mod parsing;
pub mod prompts;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::calculator::CalculatorInput;
use crate::config::{AppConfig, BackendKind};
use crate::controller::{CalculatorController, OptimizationTicket};
use crate::error::Result;
use crate::tracking::{EventLog, TrackedEvent};

/// Shown when the model returned no text
pub const INSIGHT_UNAVAILABLE: &str = "Could not generate insights at this time.";

/// Shown when the request itself failed
pub const INSIGHT_FAILED: &str = "Error generating insights. Please try again.";

/// One generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    /// Ask for a JSON response body
    pub json_output: bool,
    /// Current input fields, for optimization requests
    pub inputs: Option<Value>,
}

/// Trait implemented by text-generation backends
#[async_trait]
pub trait InsightBackend: Send + Sync {
    /// Raw model text for a request
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

#[derive(Debug, Clone)]
pub enum InsightClient {
    Gemini(GeminiBackend),
    Mock(MockBackend),
}

impl InsightClient {
    /// Backend selected by configuration, or `None` when the gemini backend
    /// has no API key
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        match config.backend {
            BackendKind::Mock => Ok(Some(InsightClient::Mock(MockBackend::new()))),
            BackendKind::Gemini => {
                if config.gemini_api_key.is_none() {
                    log::debug!("GEMINI_API_KEY not set, insights disabled");
                    return Ok(None);
                }
                Ok(Some(InsightClient::Gemini(GeminiBackend::from_config(config)?)))
            }
        }
    }
}

#[async_trait]
impl InsightBackend for InsightClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        match self {
            InsightClient::Gemini(b) => b.generate(request).await,
            InsightClient::Mock(b) => b.generate(request).await,
        }
    }

    fn model(&self) -> &str {
        match self {
            InsightClient::Gemini(b) => b.model(),
            InsightClient::Mock(b) => b.model(),
        }
    }
}

/// One field that an optimization changes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: &'static str,
    pub before: f64,
    pub after: f64,
}

/// A validated optimization suggestion
#[derive(Debug, Clone, PartialEq)]
pub struct Optimization {
    /// Complete input record with the suggested values merged in
    pub optimized: CalculatorInput,
    pub explanation: String,
    pub impact: String,
    /// Suggested keys that were unknown or not numeric
    pub rejected_fields: Vec<String>,
}

impl Optimization {
    /// Fields whose value differs from `current`, in declaration order
    pub fn changes_from(&self, current: &CalculatorInput) -> Vec<FieldChange> {
        self.optimized
            .values()
            .into_iter()
            .filter_map(|(field, after)| {
                let before = current.get(field)?;
                (before != after).then_some(FieldChange { field, before, after })
            })
            .collect()
    }
}

pub struct InsightGateway {
    client: InsightClient,
    events: Arc<EventLog>,
}

impl InsightGateway {
    pub fn new(client: InsightClient, events: Arc<EventLog>) -> Self {
        Self { client, events }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Free-text recommendations for a calculator snapshot
    pub async fn request_insight(&self, context: &str, snapshot: &Value, user: &str) -> String {
        log::debug!("insight request for {} by {} via {}", context, user, self.model());
        let request = prompts::insight_request(context, snapshot);
        match self.client.generate(&request).await {
            Ok(text) if text.trim().is_empty() => {
                log::warn!("{} returned no insight text for {}", self.model(), context);
                INSIGHT_UNAVAILABLE.to_string()
            }
            Ok(text) => {
                let text = text.trim().to_string();
                self.events.record(TrackedEvent::InsightGenerated {
                    user: user.to_string(),
                    context: context.to_string(),
                    input: snapshot.clone(),
                    insight: text.clone(),
                });
                text
            }
            Err(e) => {
                log::warn!("Insight request failed: {}", e);
                INSIGHT_FAILED.to_string()
            }
        }
    }

    /// Suggested inputs for `current`, validated and merged onto it
    pub async fn request_optimization(&self, current: &CalculatorInput, user: &str) -> Option<Optimization> {
        log::debug!("optimization request for {} by {} via {}", current.kind(), user, self.model());
        let request = prompts::optimization_request(current.kind().optimization_goal(), current);
        let raw = match self.client.generate(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Optimization request failed: {}", e);
                return None;
            }
        };

        match parsing::parse_optimization(&raw, current) {
            Ok(optimization) => Some(optimization),
            Err(e) => {
                log::warn!("Rejected optimization for {}: {}", current.kind(), e);
                None
            }
        }
    }

    /// Apply an optimization to its controller and record the acceptance
    pub fn accept_optimization(
        &self,
        controller: &mut CalculatorController,
        ticket: OptimizationTicket,
        optimization: &Optimization,
        user: &str,
    ) -> Result<Vec<FieldChange>> {
        let original = controller.input().to_fields_json();
        let changes = controller.apply_optimization(ticket, optimization)?;
        self.events.record(TrackedEvent::OptimizationAccepted {
            user: user.to_string(),
            context: controller.kind().optimization_goal().to_string(),
            original,
            optimized: optimization.optimized.to_fields_json(),
            explanation: optimization.explanation.clone(),
        });
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::CalculatorKind;
    use crate::error::Error;
    use crate::tracking::{DeviceType, EventRecord, EventSink, MemorySink};
    use chrono::NaiveDate;
    use serde_json::json;

    struct Shared(Arc<MemorySink>);

    impl EventSink for Shared {
        fn append(&self, record: &EventRecord) -> Result<()> {
            self.0.append(record)
        }
    }

    fn gateway(backend: MockBackend) -> (InsightGateway, Arc<MemorySink>) {
        let memory = Arc::new(MemorySink::new());
        let events = Arc::new(EventLog::new(Box::new(Shared(memory.clone())), DeviceType::Desktop));
        (InsightGateway::new(InsightClient::Mock(backend), events), memory)
    }

    fn controller() -> CalculatorController {
        CalculatorController::with_input(
            CalculatorInput::default_for(CalculatorKind::UnitEconomics),
            NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_insight_recorded() {
        let (gateway, memory) = gateway(MockBackend::new().with_insight("  - Raise prices\n"));
        let text = gateway
            .request_insight("unit economics", &json!({"inputs": {}}), "anonymous")
            .await;

        assert_eq!(text, "- Raise prices");
        let records = memory.records();
        assert_eq!(records.len(), 1);
        assert!(matches!(
            &records[0].event,
            TrackedEvent::InsightGenerated { user, .. } if user == "anonymous"
        ));
    }

    #[tokio::test]
    async fn test_empty_insight_uses_fallback() {
        let (gateway, memory) = gateway(MockBackend::new().with_insight("   "));
        let text = gateway.request_insight("unit economics", &json!({}), "anonymous").await;
        assert_eq!(text, INSIGHT_UNAVAILABLE);
        assert!(memory.records().is_empty());
    }

    #[tokio::test]
    async fn test_failed_insight_uses_error_message() {
        let (gateway, _) = gateway(MockBackend::failing());
        let text = gateway.request_insight("unit economics", &json!({}), "anonymous").await;
        assert_eq!(text, INSIGHT_FAILED);
    }

    #[tokio::test]
    async fn test_optimization_accepted() {
        let raw = r#"Sure! {"optimizedData":{"sellingPrice":1799,"returnsPercent":10},"explanation":"Price up, returns down","impact":"+400/order"}"#;
        let (gateway, memory) = gateway(MockBackend::new().with_optimization(raw));
        let mut c = controller();

        let ticket = c.begin_optimization().unwrap();
        let current = c.input().clone();
        let optimization = gateway.request_optimization(&current, "founder@brand.in").await.unwrap();
        let changes = gateway
            .accept_optimization(&mut c, ticket, &optimization, "founder@brand.in")
            .unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0], FieldChange { field: "sellingPrice", before: 1500.0, after: 1799.0 });
        assert_eq!(c.input().get("returnsPercent"), Some(10.0));

        let records = memory.records();
        assert_eq!(records.len(), 1);
        match &records[0].event {
            TrackedEvent::OptimizationAccepted { original, optimized, .. } => {
                assert_eq!(original["sellingPrice"], 1500.0);
                assert_eq!(optimized["sellingPrice"], 1799.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_optimization_leaves_inputs() {
        let (gateway, memory) = gateway(MockBackend::new().with_optimization(r#"{"explanation":"trust me"}"#));
        let mut c = controller();

        let ticket = c.begin_optimization().unwrap();
        let current = c.input().clone();
        assert!(gateway.request_optimization(&current, "anonymous").await.is_none());
        c.cancel_optimization(ticket);

        assert_eq!(c.input(), &current);
        assert!(!c.is_optimizing());
        assert!(memory.records().is_empty());
    }

    #[tokio::test]
    async fn test_failed_optimization_is_none() {
        let (gateway, _) = gateway(MockBackend::failing());
        let current = CalculatorInput::default_for(CalculatorKind::CodRto);
        assert!(gateway.request_optimization(&current, "anonymous").await.is_none());
    }

    #[tokio::test]
    async fn test_stale_result_not_recorded() {
        let (gateway, memory) = gateway(MockBackend::new().with_optimization(r#"{"optimizedData":{"cogs":400}}"#));
        let mut c = controller();

        let ticket = c.begin_optimization().unwrap();
        let current = c.input().clone();
        let optimization = gateway.request_optimization(&current, "anonymous").await.unwrap();

        // User keeps editing while the request is out
        c.set_field("shipping", "90").unwrap();

        let result = gateway.accept_optimization(&mut c, ticket, &optimization, "anonymous");
        assert!(matches!(result, Err(Error::StaleOptimization { .. })));
        assert_eq!(c.input().get("cogs"), Some(450.0));
        assert_eq!(c.input().get("shipping"), Some(90.0));
        assert!(memory.records().is_empty());
    }

    #[tokio::test]
    async fn test_mock_echo_is_a_no_op_suggestion() {
        let backend = MockBackend::new();
        let (gateway, _) = gateway(backend.clone());
        let current = CalculatorInput::default_for(CalculatorKind::BundlePricing);

        let optimization = gateway.request_optimization(&current, "anonymous").await.unwrap();
        assert_eq!(optimization.optimized, current);
        assert!(optimization.changes_from(&current).is_empty());
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_client_from_config() {
        let mut config = AppConfig::default();
        assert!(InsightClient::from_config(&config).unwrap().is_none());

        config.backend = BackendKind::Mock;
        let client = InsightClient::from_config(&config).unwrap().unwrap();
        assert_eq!(client.model(), "mock");

        config.backend = BackendKind::Gemini;
        config.gemini_api_key = Some("key".to_string());
        let client = InsightClient::from_config(&config).unwrap().unwrap();
        assert_eq!(client.model(), "gemini-2.5-flash");
    }
}
