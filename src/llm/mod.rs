//! Text-generation provider integration.
//!
//! The pipeline only sees the [`Generator`] trait. Concrete providers own
//! their transport, authentication and decoding; any of those failing is an
//! [`LlmError`].

pub mod gemini;

pub use gemini::{GeminiConfig, GeminiGenerator};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// One generation request: prompt, context, persona, grounding flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Instruction prompt (names the sender and subject).
    pub prompt: String,
    /// Supporting context (the request body).
    pub context: String,
    /// System instruction describing the persona.
    pub system_instruction: String,
    /// Ask the provider to ground the answer in up-to-date search results.
    pub grounding: bool,
}

/// Candidates returned by a provider, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResult {
    pub candidates: Vec<String>,
}

impl GenerationResult {
    pub fn first(&self) -> Option<&str> {
        self.candidates.first().map(String::as_str)
    }
}

/// Abstract text-generation capability.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Provider name, for logging.
    fn name(&self) -> &str;

    /// Run one generation request. No retries.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, LlmError>;
}

/// Supported generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Gemini,
}

/// Create a generator for the configured backend.
pub fn create_generator(
    backend: LlmBackend,
    config: &GeminiConfig,
) -> Result<Arc<dyn Generator>, LlmError> {
    match backend {
        LlmBackend::Gemini => {
            let generator = GeminiGenerator::new(config.clone())?;
            tracing::info!("Using Gemini (model: {})", config.model);
            Ok(Arc::new(generator))
        }
    }
}
