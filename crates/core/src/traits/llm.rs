//! Text generation interface

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single prompt for the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// System prompt framing the analyst persona
    pub system: String,
    /// User prompt carrying the aggregated figures
    pub prompt: String,
    /// Upper bound on generated tokens, backend default when `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Free-text generation used for narrative insights
///
/// Callers must treat any error as "no narrative available" and fall back
/// to deterministic text.
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    /// Generate a completion for the request
    async fn generate(&self, request: GenerationRequest) -> Result<String>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}
