//! Text-in/text-out model inference.
//!
//! The pipeline sends one rendered request and gets back raw text; parsing
//! that text is the selection parser's job, not the model's.

mod anthropic;

pub use anthropic::AnthropicModel;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model API key is not configured")]
    MissingApiKey,

    #[error("Model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model returned no text content")]
    EmptyResponse,
}

/// A generative model that completes a single prompt.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}
