use crate::providers::{LlmProvider, ProviderError};
use async_trait::async_trait;
use log::{debug, info, warn};

/// Tries providers in order, moving on only when a model is rejected as
/// unsupported. Any other failure is returned as-is.
pub struct FallbackProvider {
    providers: Vec<Box<dyn LlmProvider>>,
}

impl FallbackProvider {
    pub fn new(providers: Vec<Box<dyn LlmProvider>>) -> Result<Self, ProviderError> {
        if providers.is_empty() {
            return Err(ProviderError::Config(
                "No providers available in fallback chain".to_string(),
            ));
        }
        Ok(FallbackProvider { providers })
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl LlmProvider for FallbackProvider {
    fn provider_name(&self) -> &str {
        "fallback"
    }

    fn model(&self) -> &str {
        self.providers[0].model()
    }

    async fn generate_json(&self, prompt: &str) -> Result<String, ProviderError> {
        let last = self.providers.len() - 1;

        for (index, provider) in self.providers.iter().enumerate() {
            debug!(
                "Requesting extraction from {} model '{}'",
                provider.provider_name(),
                provider.model()
            );

            match provider.generate_json(prompt).await {
                Ok(text) => {
                    info!("Extraction succeeded with model '{}'", provider.model());
                    return Ok(text);
                }
                Err(ProviderError::UnsupportedModel { model, message }) if index < last => {
                    warn!(
                        "Model '{}' rejected as unsupported ({}), trying '{}'",
                        model,
                        message,
                        self.providers[index + 1].model()
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(ProviderError::Config(
            "No providers available in fallback chain".to_string(),
        ))
    }
}
