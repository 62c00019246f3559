//! Gemini `generateContent` client.
//!
//! Endpoint, model, credential and timeout are injected through
//! [`GeminiConfig`]. The key travels in the `x-goog-api-key` header.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{GenerationRequest, GenerationResult, Generator};
use crate::error::LlmError;

const PROVIDER: &str = "gemini";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base URL, without the `/models/...` suffix.
    pub base_url: String,
    pub model: String,
    pub api_key: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: SecretString::from(String::new()),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GeminiConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("TRIAGE_LLM_BASE_URL").unwrap_or(defaults.base_url);
        let model = std::env::var("TRIAGE_MODEL").unwrap_or(defaults.model);
        let api_key = std::env::var("GEMINI_API_KEY")
            .map(SecretString::from)
            .unwrap_or(defaults.api_key);
        let timeout = std::env::var("TRIAGE_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            base_url,
            model,
            api_key,
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = SecretString::from(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Gemini REST generator.
pub struct GeminiGenerator {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, LlmError> {
        let body = build_payload(request);

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        provider: PROVIDER.to_string(),
                        timeout: self.config.timeout,
                    }
                } else {
                    LlmError::RequestFailed {
                        provider: PROVIDER.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            debug!(status = %status, detail = %detail, "Gemini request rejected");
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthFailed {
                    provider: PROVIDER.to_string(),
                },
                429 => LlmError::RateLimited {
                    provider: PROVIDER.to_string(),
                },
                _ => LlmError::RequestFailed {
                    provider: PROVIDER.to_string(),
                    reason: format!("HTTP {status}"),
                },
            });
        }

        let raw = response.text().await.map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;
        parse_response(&raw)
    }
}

/// Build the `generateContent` JSON payload.
fn build_payload(request: &GenerationRequest) -> serde_json::Value {
    let mut body = json!({
        "contents": [{
            "parts": [
                { "text": request.prompt },
                { "text": request.context }
            ]
        }],
        "systemInstruction": {
            "parts": [{ "text": request.system_instruction }]
        }
    });
    if request.grounding {
        body["tools"] = json!([{ "google_search": {} }]);
    }
    body
}

// ── Response parsing ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Extract `candidates[0].content.parts[0].text`.
///
/// Any missing step is a malformed response; later candidates and parts are
/// never consulted.
fn parse_response(raw: &str) -> Result<GenerationResult, LlmError> {
    let response: GenerateContentResponse = serde_json::from_str(raw)?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: "missing candidates[0].content.parts[0].text".to_string(),
        })?;

    Ok(GenerationResult {
        candidates: vec![text],
    })
}
