// src/extraction/gemini.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::config::Settings;
use crate::utils::error::{AppError, ExtractError};

/// Everything the model needs for one extraction call.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub prompt: String,
    pub schema: Value,
    pub temperature: f32,
}

/// A hosted text-generation endpoint that answers with JSON text.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate_json(&self, request: &ExtractionRequest) -> Result<String, ExtractError>;
}

// --- Wire types (generateContent) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<PartOut<'a>>,
}

#[derive(Debug, Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartIn>,
}

#[derive(Debug, Deserialize)]
struct PartIn {
    text: Option<String>,
}

/// Gemini REST client for JSON-mode generation.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: crate::utils::config::DEFAULT_GEMINI_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let api_key = settings.require_api_key()?;
        Ok(Self::new(api_key, settings.model.clone()).with_base_url(settings.gemini_base_url.clone()))
    }

    /// Set a custom base URL (proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_json(&self, request: &ExtractionRequest) -> Result<String, ExtractError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![PartOut { text: &request.prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.schema,
                temperature: request.temperature,
            },
        };

        let start = std::time::Instant::now();
        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api { status, body });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        tracing::debug!(
            "Gemini generateContent ({}) finished in {} ms",
            self.model,
            start.elapsed().as_millis()
        );

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ExtractError::EmptyResponse);
        }
        Ok(text)
    }
}
