use crate::config::GeminiConfig;
use crate::providers::{FallbackProvider, GoogleProvider, LlmProvider, ProviderError};
use log::info;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the extraction provider from configuration.
    ///
    /// When an alternate model is configured the primary model is wrapped in
    /// a [`FallbackProvider`] that switches to it once if the primary model is
    /// rejected as unsupported.
    pub fn create(config: &GeminiConfig) -> Result<Box<dyn LlmProvider>, ProviderError> {
        let primary = GoogleProvider::new(config, &config.model)?;

        let alternate = config
            .fallback_model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty() && *model != config.model);

        match alternate {
            Some(model) => {
                info!(
                    "Using model '{}' with '{}' as fallback",
                    config.model, model
                );
                let secondary = GoogleProvider::new(config, model)?;
                let chain: Vec<Box<dyn LlmProvider>> = vec![Box::new(primary), Box::new(secondary)];
                Ok(Box::new(FallbackProvider::new(chain)?))
            }
            None => {
                info!("Using model '{}'", config.model);
                Ok(Box::new(primary))
            }
        }
    }
}
