use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::model::Recipe;
use crate::pipelines::RecipeScraper;
use crate::server::{ErrorBody, ScrapeRequest};

/// Errors seen by a client of the scrape endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The endpoint answered with an error status
    #[error("HTTP {status}: {}", .status_message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        status_message: Option<String>,
    },

    /// The endpoint could not be reached or answered garbage
    #[error("{0}")]
    Transport(String),
}

impl ClientError {
    /// The structured message from the endpoint, when there is one
    pub fn status_message(&self) -> Option<&str> {
        match self {
            ClientError::Status { status_message, .. } => status_message.as_deref(),
            ClientError::Transport(_) => None,
        }
    }
}

/// Anything that turns a URL into a recipe
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<Recipe, ClientError>;
}

/// Calls a remote `POST /api/scrape` endpoint
pub struct HttpRecipeClient {
    client: Client,
    base_url: String,
}

impl HttpRecipeClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ClientError> {
        // Fetch and model calls happen behind the endpoint, so allow for both
        let timeout = timeout.unwrap_or(Duration::from_secs(120));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RecipeSource for HttpRecipeClient {
    async fn scrape(&self, url: &str) -> Result<Recipe, ClientError> {
        let endpoint = format!("{}/api/scrape", self.base_url);
        debug!("POST {} for {}", endpoint, url);

        let response = self
            .client
            .post(&endpoint)
            .json(&ScrapeRequest {
                url: Some(url.to_string()),
            })
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let status_message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .map(|body| body.status_message)
                .filter(|message| !message.trim().is_empty());
            return Err(ClientError::Status {
                status: status.as_u16(),
                status_message,
            });
        }

        response
            .json::<Recipe>()
            .await
            .map_err(|e| ClientError::Transport(format!("Invalid recipe response: {}", e)))
    }
}

#[async_trait]
impl RecipeSource for RecipeScraper {
    async fn scrape(&self, url: &str) -> Result<Recipe, ClientError> {
        RecipeScraper::scrape(self, url)
            .await
            .map_err(|e| ClientError::Status {
                status: e.status_code(),
                status_message: Some(e.status_message()),
            })
    }
}
