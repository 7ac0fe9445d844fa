//! Text generation backends used by the AI-assisted search.

use async_trait::async_trait;
use thiserror::Error;

mod gemini_client;

pub use gemini_client::GeminiClient;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI client is not configured")]
    Disabled,

    #[error("AI request failed: {0}")]
    Request(String),

    #[error("AI returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI response had no text")]
    EmptyResponse,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a single-turn prompt
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}
