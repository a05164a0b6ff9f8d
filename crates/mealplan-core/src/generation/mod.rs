//! Text-generation collaborator.
//!
//! The orchestrator only sees [`GenerationClient`]; [`gemini::GeminiClient`]
//! is the production implementation.

pub mod gemini;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::{GeminiClient, GeminiConfig};

/// Errors from a generation call.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("generation returned no text")]
    EmptyResponse,

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for GenerationError {
    /// Drops the request URL so endpoint details stay out of logs.
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}

impl GenerationError {
    /// Whether the same call might succeed if issued again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_connect() || err.is_timeout(),
            Self::Api { retryable, .. } => *retryable,
            Self::Timeout(_) => true,
            Self::EmptyResponse | Self::InvalidResponse(_) => false,
        }
    }
}

/// Produces free text for a prompt. Each call is independent.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
