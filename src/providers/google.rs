use crate::config::GeminiConfig;
use crate::providers::{LlmProvider, ProviderError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::error::Error;
use std::time::Duration;

/// Messages the Gemini API uses for model identifiers it does not serve
const UNSUPPORTED_MODEL_MARKERS: &[&str] = &[
    "is not found for api version",
    "is not supported for generatecontent",
    "model not found",
];

pub struct GoogleProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GoogleProvider {
    /// Create a new Google Gemini provider for `model` from configuration
    pub fn new(config: &GeminiConfig, model: &str) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| ProviderError::Config("Gemini API key not configured".to_string()))?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| ProviderError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(GoogleProvider {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn api_error(&self, status: u16, body: &str) -> ProviderError {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let error = parsed.as_ref().map(|v| &v["error"]);

        let message = error
            .and_then(|e| e["message"].as_str())
            .unwrap_or(body)
            .trim()
            .to_string();
        let code = error
            .and_then(|e| e["status"].as_str())
            .unwrap_or("UNKNOWN");

        let lower = message.to_lowercase();
        let unsupported = UNSUPPORTED_MODEL_MARKERS
            .iter()
            .any(|marker| lower.contains(marker));

        if status == 404 || unsupported {
            return ProviderError::UnsupportedModel {
                model: self.model.clone(),
                message,
            };
        }

        ProviderError::Api {
            status,
            message: format!("[{} {}] {}", status, code, message),
        }
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_json(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{
                    "parts": [{ "text": prompt }]
                }],
                "generationConfig": {
                    "temperature": self.temperature,
                    "maxOutputTokens": self.max_tokens,
                    "responseMimeType": "application/json"
                }
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(error_chain(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(error_chain(&e)))?;

        if !status.is_success() {
            return Err(self.api_error(status.as_u16(), &body));
        }

        let response_body: Value = serde_json::from_str(&body).map_err(|e| {
            ProviderError::InvalidResponse(format!("Gemini returned a non-JSON envelope: {}", e))
        })?;
        debug!("{:?}", response_body);

        let text: String = response_body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = response_body["promptFeedback"]["blockReason"]
                .as_str()
                .or_else(|| response_body["candidates"][0]["finishReason"].as_str())
                .unwrap_or("no content");
            return Err(ProviderError::InvalidResponse(format!(
                "Failed to extract content from Google Gemini response ({})",
                reason
            )));
        }

        Ok(text)
    }
}

fn error_chain(e: &dyn Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
