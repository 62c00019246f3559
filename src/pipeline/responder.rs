//! Drafted-reply generation with deterministic fallback.
//!
//! One provider call per request, bounded by a timeout. Any failure (transport,
//! timeout, malformed payload, empty candidate) yields [`FALLBACK_RESPONSE`].
//! There are no retries.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::{GenerationRequest, Generator};
use crate::pipeline::types::{DraftSource, DraftedResponse};

/// Reply used whenever generation fails.
pub const FALLBACK_RESPONSE: &str =
    "Thank you for reaching out. We have received your request and will get back to you shortly.";

/// Persona given to the provider as its system instruction.
pub const SYSTEM_INSTRUCTION: &str = "You are a friendly and helpful customer support representative. \
     Generate a concise, professional response to the customer's email.";

/// Drafts replies through a [`Generator`].
pub struct ResponseGenerator {
    generator: Arc<dyn Generator>,
    timeout: Duration,
    grounding: bool,
}

impl ResponseGenerator {
    pub fn new(generator: Arc<dyn Generator>, timeout: Duration) -> Self {
        Self {
            generator,
            timeout,
            grounding: true,
        }
    }

    /// Toggle the up-to-date grounding flag on outgoing requests.
    pub fn with_grounding(mut self, grounding: bool) -> Self {
        self.grounding = grounding;
        self
    }

    /// Drafted reply text. Never empty.
    pub async fn generate_response(&self, sender: &str, subject: &str, body: &str) -> String {
        self.draft(sender, subject, body).await.text
    }

    /// Drafted reply plus whether the fallback was substituted.
    pub async fn draft(&self, sender: &str, subject: &str, body: &str) -> DraftedResponse {
        let request = build_request(sender, subject, body, self.grounding);

        match self.call(&request).await {
            Ok(text) => {
                debug!(sender = %sender, provider = self.generator.name(), "Drafted reply");
                DraftedResponse {
                    text,
                    source: DraftSource::Generated,
                }
            }
            Err(e) => {
                warn!(
                    sender = %sender,
                    provider = self.generator.name(),
                    error = %e,
                    "Generation failed, using fallback response"
                );
                DraftedResponse {
                    text: FALLBACK_RESPONSE.to_string(),
                    source: DraftSource::Fallback,
                }
            }
        }
    }

    async fn call(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let result = tokio::time::timeout(self.timeout, self.generator.generate(request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: self.generator.name().to_string(),
                timeout: self.timeout,
            })??;

        match result.first() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(LlmError::InvalidResponse {
                provider: self.generator.name().to_string(),
                reason: "empty first candidate".to_string(),
            }),
        }
    }
}

/// Build the generation request for one support message.
pub fn build_request(sender: &str, subject: &str, body: &str, grounding: bool) -> GenerationRequest {
    GenerationRequest {
        prompt: format!(
            "Draft a response to the following email from {sender} regarding '{subject}':"
        ),
        context: body.to_string(),
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        grounding,
    }
}
