//! HTTP endpoints
//!
//! REST API for the MediSecure RAG service. All request payloads are
//! form-encoded; authentication is a bearer token in the Authorization
//! header.

use axum::{
    async_trait,
    extract::{Form, FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use medisecure_core::AuthError;
use medisecure_rag::AnswerError;

use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/login", post(login))
        .route("/ask", post(ask))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http());

    if state.config.server.cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}

/// API error rendered as `{"detail": ...}` with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn unauthorized(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            detail: detail.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::unauthorized(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

/// Doctor identity proven by a valid bearer token.
///
/// Rejects the request before any retrieval work when the token is missing,
/// malformed or expired.
pub struct AuthedDoctor(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthedDoctor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

        let username = state.tokens.verify(token)?;
        Ok(AuthedDoctor(username))
    }
}

/// Login request
#[derive(Debug, Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

/// Login response
#[derive(Debug, Serialize)]
struct LoginResponse {
    access_token: String,
    token_type: &'static str,
}

/// Login endpoint
///
/// Unknown usernames and wrong passwords produce the same error body, so
/// responses cannot be used to enumerate accounts.
async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<LoginResponse>, ApiError> {
    if !state.credentials.verify(&form.username, &form.password) {
        tracing::info!(username = %form.username, "Login rejected");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens.issue(&form.username)?;
    tracing::info!(username = %form.username, "Login succeeded");

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer",
    }))
}

/// Ask request
#[derive(Debug, Deserialize)]
struct AskForm {
    question: String,
}

/// Ask response
#[derive(Debug, Serialize)]
struct AskResponse {
    doctor: String,
    answer: String,
}

/// Ask endpoint
///
/// Only authentication can fail this request; retrieval and generation
/// failures are rendered into the answer string.
async fn ask(
    State(state): State<AppState>,
    AuthedDoctor(doctor): AuthedDoctor,
    Form(form): Form<AskForm>,
) -> Json<AskResponse> {
    let answer = match state.query.answer(&form.question).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, "Query degraded to diagnostic answer");
            diagnostic_message(&err)
        }
    };

    Json(AskResponse { doctor, answer })
}

/// Render a query failure into the user-facing answer string.
pub fn diagnostic_message(err: &AnswerError) -> String {
    match err {
        AnswerError::StoreUninitialized => {
            "Database not initialized. Run the ingestion job first.".to_string()
        }
        AnswerError::EndpointMisconfigured(url) => format!(
            "Error 405: check that the generation URL ends with /api/generate (got {url})"
        ),
        AnswerError::Generation(detail) => {
            format!("Connection Error: is the model server running? {detail}")
        }
        AnswerError::Embedding(detail) => format!("Retrieval error: {detail}"),
    }
}

/// Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
