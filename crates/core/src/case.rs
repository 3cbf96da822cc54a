//! Case records stored in the vector store

use serde::{Deserialize, Serialize};

/// One medical transcription with its embedding.
///
/// Records are created during ingestion and never mutated afterwards. The id
/// is unique within a store; the embedding dimension is fixed per store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseRecord {
    /// Record id (row index of the source corpus, as a string)
    pub id: String,
    /// Original transcription text
    pub text: String,
    /// Dense embedding of `text`
    pub embedding: Vec<f32>,
}

impl CaseRecord {
    /// Create a new case record
    pub fn new(id: impl Into<String>, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding,
        }
    }
}
