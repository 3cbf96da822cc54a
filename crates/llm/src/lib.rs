//! Generation client for the MediSecure RAG service
//!
//! Talks to a locally hosted model server (Ollama-compatible
//! `/api/generate` endpoint) over HTTP, non-streaming.

pub mod client;
pub mod prompt;

pub use client::{GenerationClient, GenerationResponse};
pub use prompt::{build_prompt, EMPTY_CONTEXT};

use thiserror::Error;

/// Generation failures.
///
/// The misconfigured-endpoint case is kept distinct so the boundary can hint
/// at a URL missing its `/api/generate` suffix; everything else collapses
/// into a request-level detail string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Generation endpoint rejected the method: {url}")]
    EndpointMisconfigured { url: String },

    #[error("Generation request failed: {0}")]
    Request(String),
}

impl From<GenerationError> for medisecure_core::Error {
    fn from(err: GenerationError) -> Self {
        medisecure_core::Error::Generation(err.to_string())
    }
}
