mod factory;
mod fallback;
mod google;
mod prompt;

pub use factory::ProviderFactory;
pub use fallback::FallbackProvider;
pub use google::GoogleProvider;
pub use prompt::{build_extraction_prompt, RECIPE_EXTRACTION_PROMPT};

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by model providers
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The model identifier was rejected by the service
    #[error("Model '{model}' is not supported: {message}")]
    UnsupportedModel { model: String, message: String },

    /// The service answered with an error
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The service could not be reached
    #[error("{0}")]
    Transport(String),

    /// The service answered without usable text
    #[error("{0}")]
    InvalidResponse(String),

    #[error("Provider configuration error: {0}")]
    Config(String),
}

/// Unified trait for hosted language models
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "google")
    fn provider_name(&self) -> &str;

    /// Model identifier used for requests
    fn model(&self) -> &str;

    /// Send `prompt` with JSON output mode and return the raw text reply
    async fn generate_json(&self, prompt: &str) -> Result<String, ProviderError>;
}
