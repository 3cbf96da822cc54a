//! Application state
//!
//! Shared state across all handlers. Every collaborator is constructed once
//! at startup and injected here; handlers never reach for globals.

use std::sync::Arc;

use medisecure_auth::{CredentialStore, TokenIssuer};
use medisecure_config::Settings;
use medisecure_llm::GenerationClient;
use medisecure_rag::{CaseStore, Embedder, QueryService};

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Settings>,
    /// Registered doctor credentials
    pub credentials: Arc<CredentialStore>,
    /// Token issuer/verifier
    pub tokens: Arc<TokenIssuer>,
    /// Retrieval-and-answer service
    pub query: Arc<QueryService>,
}

impl AppState {
    /// Wire up all collaborators from settings.
    ///
    /// The case store may be absent (ingestion never run); the query service
    /// then degrades softly instead of blocking startup.
    pub fn build(config: Settings) -> medisecure_core::Result<Self> {
        config
            .require_signing_key()
            .map_err(|e| medisecure_core::Error::Config(e.to_string()))?;

        let credentials = CredentialStore::from_config(&config.auth)?;
        let tokens = TokenIssuer::new(&config.auth.signing_key, config.auth.token_lifetime_secs);

        let embedder = Embedder::new(config.rag.embedding.clone())
            .map_err(medisecure_core::Error::from)?;
        let store = CaseStore::open(&config.rag.store_dir, &config.rag.collection)
            .map_err(medisecure_core::Error::from)?;
        let generator = GenerationClient::new(&config.generation)
            .map_err(medisecure_core::Error::from)?;

        let query = QueryService::new(embedder, store, generator, config.rag.top_k);

        Ok(Self {
            config: Arc::new(config),
            credentials: Arc::new(credentials),
            tokens: Arc::new(tokens),
            query: Arc::new(query),
        })
    }
}
