//! MediSecure RAG API server
//!
//! Two form-encoded endpoints behind bearer-token auth: `POST /login` and
//! `POST /ask`, plus a health check.

pub mod http;
pub mod state;

pub use http::{create_router, diagnostic_message, ApiError};
pub use state::AppState;
