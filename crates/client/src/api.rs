//! API client for the MediSecure RAG service

use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Outcome of a login attempt
#[derive(Debug)]
pub enum LoginOutcome {
    /// Access token to present on subsequent requests
    Success(String),
    /// Rejected with the server's error detail
    Rejected(String),
}

/// Outcome of a question
#[derive(Debug)]
pub enum AskOutcome {
    Answer(String),
    /// Token rejected; the caller should return to the login screen
    SessionExpired,
    /// Any other failure, with detail
    Failed(String),
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    answer: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: String,
}

/// Thin client over the two API endpoints.
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            http: Client::builder()
                .build()
                .context("Failed to create HTTP client")?,
            base_url: base_url.into(),
        })
    }

    /// Exchange credentials for an access token.
    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<LoginOutcome> {
        let response = self
            .http
            .post(format!("{}/login", self.base_url))
            .timeout(Duration::from_secs(10))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .context("Login request failed")?;

        if response.status().is_success() {
            let body: LoginResponse = response.json().await.context("Malformed login response")?;
            return Ok(LoginOutcome::Success(body.access_token));
        }

        let detail = error_detail(response).await;
        Ok(LoginOutcome::Rejected(detail))
    }

    /// Submit a question with the bearer token.
    pub async fn ask(&self, token: &str, question: &str) -> anyhow::Result<AskOutcome> {
        let response = self
            .http
            .post(format!("{}/ask", self.base_url))
            .timeout(Duration::from_secs(60))
            .bearer_auth(token)
            .form(&[("question", question)])
            .send()
            .await
            .context("Ask request failed")?;

        match response.status() {
            status if status.is_success() => {
                let body: AskResponse = response.json().await.context("Malformed ask response")?;
                Ok(AskOutcome::Answer(body.answer))
            }
            StatusCode::UNAUTHORIZED => Ok(AskOutcome::SessionExpired),
            status => Ok(AskOutcome::Failed(format!(
                "Error {status}: {}",
                error_detail(response).await
            ))),
        }
    }
}

async fn error_detail(response: reqwest::Response) -> String {
    match response.json::<ErrorResponse>().await {
        Ok(body) if !body.detail.is_empty() => body.detail,
        _ => "Unknown error".to_string(),
    }
}
