//! Retrieval-augmented generation for medical transcriptions
//!
//! Pieces:
//! - Dense embeddings (hashed bag-of-words by default, ONNX behind a feature)
//! - A persistent flat vector store with cosine nearest-neighbor search
//! - The one-shot ingestion pipeline
//! - The query service driving retrieve -> prompt -> generate

pub mod embeddings;
pub mod pipeline;
pub mod query;
pub mod store;

pub use embeddings::Embedder;
pub use pipeline::{IngestionPipeline, IngestionReport};
pub use query::{AnswerError, QueryService, NO_RESPONSE_TEXT};
pub use store::CaseStore;

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<RagError> for medisecure_core::Error {
    fn from(err: RagError) -> Self {
        medisecure_core::Error::Rag(err.to_string())
    }
}
