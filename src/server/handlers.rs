use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ScrapeError;
use crate::model::Recipe;
use crate::pipelines::RecipeScraper;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/scrape`
pub async fn scrape(
    State(scraper): State<Arc<RecipeScraper>>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<Recipe>, ScrapeError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected scrape request body: {}", rejection.body_text());
        ScrapeError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let url = request
        .url
        .ok_or_else(|| ScrapeError::Validation("URL is required".to_string()))?;

    info!("Scrape requested for {}", url);
    let recipe = scraper.scrape(&url).await?;
    Ok(Json(recipe))
}
