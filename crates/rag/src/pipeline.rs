//! Ingestion pipeline
//!
//! Drives corpus text through the embedder into the case store. One-shot,
//! offline; any embedding or store error aborts the run (no retry, no
//! partial-failure recovery).

use medisecure_core::CaseRecord;

use crate::{CaseStore, Embedder, RagError};

/// Outcome of an ingestion run
#[derive(Debug, Clone, Copy)]
pub struct IngestionReport {
    /// Rows embedded and inserted
    pub indexed: usize,
    /// Records in the store after persisting
    pub stored: usize,
}

/// One-shot ingestion: texts -> embeddings -> persisted store.
pub struct IngestionPipeline {
    embedder: Embedder,
    store: CaseStore,
}

impl IngestionPipeline {
    pub fn new(embedder: Embedder, store: CaseStore) -> Self {
        Self { embedder, store }
    }

    /// Embed and insert every text, then persist the store.
    ///
    /// Ids are the row index as a string, starting from 0 each run, so
    /// re-running replaces the previous corpus record-for-record.
    pub fn run(mut self, texts: &[String]) -> Result<(CaseStore, IngestionReport), RagError> {
        tracing::info!(rows = texts.len(), "Indexing corpus");

        for (i, text) in texts.iter().enumerate() {
            let embedding = self.embedder.embed(text)?;
            self.store.insert(CaseRecord::new(i.to_string(), text, embedding))?;

            if (i + 1) % 100 == 0 {
                tracing::info!(indexed = i + 1, "Indexing progress");
            }
        }

        self.store.persist()?;

        let report = IngestionReport {
            indexed: texts.len(),
            stored: self.store.count(),
        };
        tracing::info!(stored = report.stored, "Corpus indexed");

        Ok((self.store, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medisecure_config::EmbeddingConfig;
    use tempfile::TempDir;

    fn pipeline(dir: &TempDir) -> IngestionPipeline {
        let config = EmbeddingConfig::default();
        let store = CaseStore::create_or_open(dir.path(), "medical_notes", config.dimension).unwrap();
        IngestionPipeline::new(Embedder::new(config).unwrap(), store)
    }

    #[test]
    fn test_count_matches_rows() {
        let dir = TempDir::new().unwrap();
        let texts: Vec<String> = (0..5).map(|i| format!("transcription number {i}")).collect();

        let (store, report) = pipeline(&dir).run(&texts).unwrap();
        assert_eq!(report.indexed, 5);
        assert_eq!(report.stored, 5);
        assert_eq!(store.count(), 5);

        // Persisted too
        let reloaded = CaseStore::open(dir.path(), "medical_notes").unwrap().unwrap();
        assert_eq!(reloaded.count(), 5);
    }

    #[test]
    fn test_rerun_replaces_corpus() {
        let dir = TempDir::new().unwrap();
        let first: Vec<String> = (0..3).map(|i| format!("old case {i}")).collect();
        pipeline(&dir).run(&first).unwrap();

        let second: Vec<String> = (0..3).map(|i| format!("new case {i}")).collect();
        let (store, _) = pipeline(&dir).run(&second).unwrap();

        assert_eq!(store.count(), 3);
        let query = Embedder::new(EmbeddingConfig::default())
            .unwrap()
            .embed("new case 0")
            .unwrap();
        let hits = store.search(&query, 1).unwrap();
        assert_eq!(hits[0].0.text, "new case 0");
    }
}
