use log::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::ScrapeError;
use crate::extractors::parse_model_output;
use crate::model::Recipe;
use crate::providers::{build_extraction_prompt, LlmProvider, ProviderFactory};
use crate::url_to_text::fetchers::RequestFetcher;
use crate::url_to_text::html::{page_image, sanitize};

/// Check that `url` is an absolute http(s) URL and return it trimmed for fetching.
pub fn validate_url(url: &str) -> Result<&str, ScrapeError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ScrapeError::Validation("URL is required".to_string()));
    }

    match ::url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(url),
        _ => Err(ScrapeError::Validation("Invalid URL format".to_string())),
    }
}

/// The scrape pipeline.
///
/// For each URL:
/// 1. Validates the URL and checks that a model API key is configured
/// 2. Fetches the HTML with [`RequestFetcher`]
/// 3. Reduces the page to plain text
/// 4. Asks the model for the recipe as JSON
/// 5. Parses and normalizes the reply into a [`Recipe`]
///
/// Holds no per-request state; one instance serves every request.
pub struct RecipeScraper {
    config: AppConfig,
    fetcher: RequestFetcher,
    provider: Option<Box<dyn LlmProvider>>,
}

impl RecipeScraper {
    /// Build the pipeline from configuration.
    ///
    /// A missing API key is not an error here; each scrape reports it instead.
    pub fn new(config: AppConfig) -> Result<Self, ScrapeError> {
        let provider = match config.gemini.api_key() {
            Some(_) => Some(
                ProviderFactory::create(&config.gemini)
                    .map_err(|e| ScrapeError::Configuration(e.to_string()))?,
            ),
            None => {
                warn!("No Gemini API key configured, scrape requests will fail");
                None
            }
        };

        Self::build(config, provider)
    }

    /// Build the pipeline around an existing provider
    pub fn with_provider(
        config: AppConfig,
        provider: Box<dyn LlmProvider>,
    ) -> Result<Self, ScrapeError> {
        Self::build(config, Some(provider))
    }

    fn build(
        config: AppConfig,
        provider: Option<Box<dyn LlmProvider>>,
    ) -> Result<Self, ScrapeError> {
        let fetcher = RequestFetcher::new(&config.fetch)?;
        Ok(Self {
            config,
            fetcher,
            provider,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Scrape `url` into a canonical recipe.
    pub async fn scrape(&self, url: &str) -> Result<Recipe, ScrapeError> {
        let result = self.run(url).await;

        if let Err(e) = &result {
            error!("--- SCRAPE ERROR ---");
            error!("URL: {}", url);
            error!("Kind: {}", e.kind().as_str());
            error!("Status: {}", e.status_code());
            error!("Message: {}", e);
            error!("Detail: {:?}", e);
        }

        result
    }

    async fn run(&self, url: &str) -> Result<Recipe, ScrapeError> {
        let target = validate_url(url)?;

        // Checked before fetching so a misconfigured server does no network work
        let provider = self.provider.as_deref().ok_or_else(|| {
            error!("CRITICAL: Gemini API key is missing from configuration");
            ScrapeError::Configuration(
                "Server Configuration Error: API Key not found.".to_string(),
            )
        })?;

        info!("Fetching {}", target);
        let html = self.fetcher.fetch(target).await?;

        let text = sanitize(&html, self.config.fetch.max_text_chars);
        debug!(
            "Reduced {} bytes of HTML to {} characters of text",
            html.len(),
            text.chars().count()
        );
        if text.is_empty() {
            return Err(ScrapeError::Fetch {
                status: 502,
                message: "Failed to reach recipe site: the page contained no readable text"
                    .to_string(),
            });
        }

        info!("Sending page text to model '{}'", provider.model());
        let output = provider
            .generate_json(&build_extraction_prompt(&text))
            .await
            .map_err(|e| ScrapeError::extraction(e.to_string()))?;

        info!("Parsing model output ({} bytes)", output.len());
        let value = parse_model_output(&output)?;
        // The recipe carries the URL exactly as submitted
        let mut recipe = Recipe::from_model_json(&value, url)?;

        if recipe.image.is_none() {
            recipe.image = page_image(&html);
        }

        info!(
            "Extracted '{}': {} ingredients, {} components",
            recipe.title,
            recipe.ingredients.len(),
            recipe.components.len()
        );
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Replies with a fixed text and records the prompts it was given
    struct CannedProvider {
        reply: Result<&'static str, &'static str>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn provider_name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-model"
        }

        async fn generate_json(&self, prompt: &str) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(message) => Err(ProviderError::Api {
                    status: 429,
                    message: message.to_string(),
                }),
            }
        }
    }

    fn canned_scraper(
        reply: Result<&'static str, &'static str>,
    ) -> (RecipeScraper, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let mut config = AppConfig::default();
        config.fetch.retry_delay_ms = 0;
        let provider = CannedProvider {
            reply,
            prompts: Arc::clone(&prompts),
        };
        (
            RecipeScraper::with_provider(config, Box::new(provider)).unwrap(),
            prompts,
        )
    }

    #[tokio::test]
    async fn test_scrape_with_substituted_provider() {
        let mut site = mockito::Server::new_async().await;
        let _page = site
            .mock("GET", "/pie")
            .with_status(200)
            .with_body("<html><body><h1>Pie</h1><p>Mix &amp; bake.</p></body></html>")
            .create_async()
            .await;
        let (scraper, prompts) = canned_scraper(Ok(
            r#"{"title":"Pie","ingredients":["flour"],"components":[{"name":"Crust","steps":["Mix","Bake"]}]}"#,
        ));

        let submitted = format!("  {}/pie ", site.url());
        let recipe = scraper.scrape(&submitted).await.unwrap();

        assert_eq!(recipe.title, "Pie");
        assert_eq!(recipe.url, submitted);
        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Pie Mix & bake."));
    }

    #[tokio::test]
    async fn test_provider_failure_is_classified() {
        let mut site = mockito::Server::new_async().await;
        let _page = site
            .mock("GET", "/pie")
            .with_status(200)
            .with_body("<p>Pie</p>")
            .create_async()
            .await;
        let (scraper, _) = canned_scraper(Err("[429 RESOURCE_EXHAUSTED] Quota exceeded"));

        let err = scraper
            .scrape(&format!("{}/pie", site.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_site_skips_provider() {
        let (scraper, prompts) = canned_scraper(Ok("{}"));
        let err = scraper.scrape("http://127.0.0.1:1/pie").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch { status: 502, .. }));
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_validate_url() {
        assert_eq!(
            validate_url(" https://example.com/pie ").unwrap(),
            "https://example.com/pie"
        );
        assert!(validate_url("http://example.com").is_ok());

        for bad in ["", "   ", "not-a-url", "/relative/path", "ftp://example.com/file"] {
            let err = validate_url(bad).unwrap_err();
            assert_eq!(err.status_code(), 400, "{:?}", bad);
        }
        assert_eq!(validate_url("").unwrap_err().to_string(), "URL is required");
        assert_eq!(
            validate_url("not-a-url").unwrap_err().to_string(),
            "Invalid URL format"
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let scraper = RecipeScraper::new(AppConfig::default()).unwrap();
        let err = scraper.scrape("https://example.com/pie").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Configuration(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_url_checked_before_configuration() {
        let scraper = RecipeScraper::new(AppConfig::default()).unwrap();
        let err = scraper.scrape("not-a-url").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Validation(_)));
    }
}
