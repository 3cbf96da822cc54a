//! HTTP client for the generation endpoint

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use medisecure_config::GenerationConfig;
use crate::GenerationError;

/// Request body for the `/api/generate` endpoint
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body from the `/api/generate` endpoint.
///
/// Only the generated text is extracted; the endpoint's other fields are
/// ignored. The field may be absent on some server versions.
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub response: Option<String>,
}

/// Non-streaming client for a locally hosted model server.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: Client,
    url: String,
    model: String,
}

impl GenerationClient {
    /// Create a client from configuration.
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        // Local models can be slow; the timeout bounds the whole request.
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Request(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: config.url.clone(),
            model: config.model.clone(),
        })
    }

    /// The configured endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a prompt and return the complete response.
    pub async fn generate(&self, prompt: &str) -> Result<GenerationResponse, GenerationError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        tracing::debug!(url = %self.url, model = %self.model, "Sending generation request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::METHOD_NOT_ALLOWED {
            return Err(GenerationError::EndpointMisconfigured {
                url: self.url.clone(),
            });
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerationError::Request(format!(
                "HTTP {status}: {detail}"
            )));
        }

        response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| GenerationError::Request(format!("Invalid response body: {e}")))
    }
}
