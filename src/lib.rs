pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod extractors;
pub mod model;
pub mod pipelines;
pub mod providers;
pub mod server;
pub mod url_to_text;
pub mod view_model;

pub use client::{ClientError, HttpRecipeClient, RecipeSource};
pub use config::AppConfig;
pub use error::{ErrorKind, ScrapeError};
pub use model::{Recipe, RecipeComponent};
pub use pipelines::RecipeScraper;
pub use view_model::{ExportView, RecipeViewModel};

/// Scrape a single recipe with the given configuration.
///
/// Builds a fresh [`RecipeScraper`] for the call. Reuse one scraper when
/// scraping more than one URL.
///
/// # Example
/// ```no_run
/// use recipe_scraper::{scrape_recipe, AppConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AppConfig::load()?;
/// let recipe = scrape_recipe("https://example.com/apple-pie", config).await?;
/// println!("{}", recipe.title);
/// # Ok(())
/// # }
/// ```
pub async fn scrape_recipe(url: &str, config: AppConfig) -> Result<Recipe, ScrapeError> {
    RecipeScraper::new(config)?.scrape(url).await
}
