//! RAG query service
//!
//! Embeds an incoming question, retrieves the nearest cases, assembles the
//! prompt and forwards it to the generation endpoint. Every failure is a
//! tagged error; the HTTP boundary decides the user-facing wording and
//! `/ask` itself only ever fails on authentication.

use thiserror::Error;

use medisecure_core::CaseRecord;
use medisecure_llm::{build_prompt, GenerationClient, GenerationError};

use crate::{CaseStore, Embedder};

/// Success payload when the endpoint returned 2xx without a text field.
pub const NO_RESPONSE_TEXT: &str = "No response text found.";

/// Failure kinds of [`QueryService::answer`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnswerError {
    /// Ingestion has never run; retrieval is unavailable.
    #[error("Vector store not initialized")]
    StoreUninitialized,

    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// The generation endpoint rejected the method; the URL is likely
    /// missing its /api/generate suffix.
    #[error("Generation endpoint misconfigured: {0}")]
    EndpointMisconfigured(String),

    #[error("Generation failed: {0}")]
    Generation(String),
}

/// Retrieval-and-answer service.
///
/// Holds explicitly constructed collaborators, injected at startup and
/// shared read-only for the process lifetime.
pub struct QueryService {
    embedder: Embedder,
    store: Option<CaseStore>,
    generator: GenerationClient,
    top_k: usize,
}

impl QueryService {
    pub fn new(
        embedder: Embedder,
        store: Option<CaseStore>,
        generator: GenerationClient,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            generator,
            top_k,
        }
    }

    /// Records available for retrieval, if the store is initialized.
    pub fn store_count(&self) -> Option<usize> {
        self.store.as_ref().map(CaseStore::count)
    }

    /// Retrieve the nearest cases for a question.
    pub fn retrieve(&self, question: &str) -> Result<Vec<(CaseRecord, f32)>, AnswerError> {
        let store = self.store.as_ref().ok_or(AnswerError::StoreUninitialized)?;

        let query = self
            .embedder
            .embed(question)
            .map_err(|e| AnswerError::Embedding(e.to_string()))?;

        store
            .search(&query, self.top_k)
            .map_err(|e| AnswerError::Embedding(e.to_string()))
    }

    /// Answer a question with retrieved context.
    ///
    /// The uninitialized-store case returns before any network activity.
    pub async fn answer(&self, question: &str) -> Result<String, AnswerError> {
        let hits = self.retrieve(question)?;

        let cases: Vec<String> = hits.into_iter().map(|(record, _)| record.text).collect();
        tracing::debug!(retrieved = cases.len(), "Assembling prompt");

        let prompt = build_prompt(&cases, question);

        match self.generator.generate(&prompt).await {
            Ok(response) => Ok(response
                .response
                .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string())),
            Err(GenerationError::EndpointMisconfigured { url }) => {
                Err(AnswerError::EndpointMisconfigured(url))
            }
            Err(GenerationError::Request(detail)) => Err(AnswerError::Generation(detail)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medisecure_config::{EmbeddingConfig, GenerationConfig};
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CASES: &[&str] = &[
        "Patient reports chest pain",
        "Fractured left ankle after a fall",
        "Seasonal allergic rhinitis, prescribed antihistamines",
    ];

    fn generator(url: String) -> GenerationClient {
        GenerationClient::new(&GenerationConfig {
            url,
            model: "mistral".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn populated_store(dir: &TempDir) -> CaseStore {
        let config = EmbeddingConfig::default();
        let embedder = Embedder::new(config.clone()).unwrap();
        let mut store =
            CaseStore::create_or_open(dir.path(), "medical_notes", config.dimension).unwrap();
        for (i, text) in CASES.iter().enumerate() {
            let embedding = embedder.embed(text).unwrap();
            store
                .insert(medisecure_core::CaseRecord::new(i.to_string(), *text, embedding))
                .unwrap();
        }
        store
    }

    fn service(store: Option<CaseStore>, url: String) -> QueryService {
        QueryService::new(
            Embedder::new(EmbeddingConfig::default()).unwrap(),
            store,
            generator(url),
            3,
        )
    }

    #[tokio::test]
    async fn test_uninitialized_store_makes_no_network_call() {
        let server = MockServer::start().await;
        // Mounted with expect(0): any request would fail verification on drop.
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let service = service(None, format!("{}/api/generate", server.uri()));
        let err = service.answer("chest pain symptoms").await.unwrap_err();
        assert_eq!(err, AnswerError::StoreUninitialized);
    }

    #[test]
    fn test_retrieval_includes_matching_case() {
        let dir = TempDir::new().unwrap();
        let service = service(
            Some(populated_store(&dir)),
            "http://127.0.0.1:9/api/generate".to_string(),
        );

        let hits = service.retrieve("chest pain symptoms").unwrap();
        assert!(!hits.is_empty());
        assert!(hits
            .iter()
            .any(|(record, _)| record.text == "Patient reports chest pain"));
    }

    #[tokio::test]
    async fn test_answer_success() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Likely angina; order an ECG.",
            })))
            .mount(&server)
            .await;

        let service = service(
            Some(populated_store(&dir)),
            format!("{}/api/generate", server.uri()),
        );
        let answer = service.answer("chest pain symptoms").await.unwrap();
        assert_eq!(answer, "Likely angina; order an ECG.");
    }

    #[tokio::test]
    async fn test_answer_missing_text_placeholder() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "done": true })))
            .mount(&server)
            .await;

        let service = service(
            Some(populated_store(&dir)),
            format!("{}/api/generate", server.uri()),
        );
        let answer = service.answer("chest pain symptoms").await.unwrap();
        assert_eq!(answer, NO_RESPONSE_TEXT);
    }

    #[tokio::test]
    async fn test_unreachable_generator_is_tagged_not_panicked() {
        let dir = TempDir::new().unwrap();
        let service = service(
            Some(populated_store(&dir)),
            "http://127.0.0.1:9/api/generate".to_string(),
        );

        match service.answer("chest pain symptoms").await.unwrap_err() {
            AnswerError::Generation(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_method_not_allowed_is_misconfiguration() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;

        let service = service(Some(populated_store(&dir)), server.uri());
        match service.answer("chest pain symptoms").await.unwrap_err() {
            AnswerError::EndpointMisconfigured(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
