mod errors;
mod handlers;

pub use errors::ErrorBody;
pub use handlers::ScrapeRequest;

use axum::{
    routing::{get, post},
    Router,
};
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::pipelines::RecipeScraper;

/// Build the application router
pub fn routes(scraper: Arc<RecipeScraper>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/scrape", post(handlers::scrape))
        .with_state(scraper)
}

/// Serve the API on `bind` until the process is stopped
pub async fn serve(scraper: RecipeScraper, bind: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, routes(Arc::new(scraper))).await
}
