//! Narrative text generation for analysis endpoints
//!
//! - [`OpenAiGenerator`] talks to any OpenAI-compatible chat-completions API
//!   and implements [`revpulse_core::TextGenerator`]
//! - [`insights`] turns free-form model output into bounded lists of
//!   insights and recommendations

pub mod backend;
pub mod insights;

pub use backend::{OpenAiConfig, OpenAiGenerator};
pub use insights::{extract_insights, ParsedInsights};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::Timeout)
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for revpulse_core::Error {
    fn from(err: LlmError) -> Self {
        revpulse_core::Error::Generation(err.to_string())
    }
}
