//! Gemini `generateContent` backend

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::{Error, Result};

use super::{GenerationRequest, InsightBackend};

#[derive(Debug, Clone)]
pub struct GeminiBackend {
    http_client: reqwest::Client,
    host: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: &request.system }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &request.prompt }],
            }],
            generation_config: request.json_output.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        }
    }
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated; empty when absent
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default()
    }
}

impl GeminiBackend {
    pub fn new(host: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| Error::Config("GEMINI_API_KEY is not set".into()))?;
        Self::new(
            &config.gemini_host,
            &config.gemini_model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.host, self.model)
    }
}

#[async_trait]
impl InsightBackend for GeminiBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = GenerateContentRequest::from_request(request);

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed.text();

        log::debug!("Gemini response ({} chars)", text.len());
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
