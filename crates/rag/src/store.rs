//! Persistent case store
//!
//! A flat vector store: every record is kept in memory and scanned with
//! cosine similarity on query. One collection per file under the store
//! directory; the on-disk format is plain JSON, written atomically.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use medisecure_core::CaseRecord;

use crate::RagError;

/// On-disk representation of a collection
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    dimension: usize,
    records: Vec<CaseRecord>,
}

/// Persistent vector store for case records.
///
/// Records are keyed by id; inserting an existing id overwrites it, which
/// gives re-ingestion replace-the-corpus semantics.
pub struct CaseStore {
    path: PathBuf,
    dimension: usize,
    records: BTreeMap<String, CaseRecord>,
}

impl CaseStore {
    /// Open an existing collection.
    ///
    /// Returns `Ok(None)` when the collection has never been persisted, so
    /// serving can degrade softly instead of failing at startup.
    pub fn open(dir: impl AsRef<Path>, collection: &str) -> Result<Option<Self>, RagError> {
        let path = collection_path(dir.as_ref(), collection);
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&path)?;
        let file: StoreFile = serde_json::from_str(&data)?;

        let records = file
            .records
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        Ok(Some(Self {
            path,
            dimension: file.dimension,
            records,
        }))
    }

    /// Open a collection, creating an empty one (and the store directory)
    /// if absent. The create is idempotent.
    pub fn create_or_open(
        dir: impl AsRef<Path>,
        collection: &str,
        dimension: usize,
    ) -> Result<Self, RagError> {
        fs::create_dir_all(dir.as_ref())?;

        if let Some(store) = Self::open(dir.as_ref(), collection)? {
            return Ok(store);
        }

        Ok(Self {
            path: collection_path(dir.as_ref(), collection),
            dimension,
            records: BTreeMap::new(),
        })
    }

    /// Insert a record, overwriting any record with the same id.
    pub fn insert(&mut self, record: CaseRecord) -> Result<(), RagError> {
        if record.embedding.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: record.embedding.len(),
            });
        }

        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Return the k nearest records by cosine similarity, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(CaseRecord, f32)>, RagError> {
        if query.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(CaseRecord, f32)> = self
            .records
            .values()
            .map(|r| (r.clone(), cosine_similarity(query, &r.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }

    /// Number of stored records
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Embedding dimension of this collection
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Write the collection to disk (temp file + rename).
    pub fn persist(&self) -> Result<(), RagError> {
        let file = StoreFile {
            dimension: self.dimension,
            records: self.records.values().cloned().collect(),
        };

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&file)?)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), count = self.count(), "Persisted store");
        Ok(())
    }
}

fn collection_path(dir: &Path, collection: &str) -> PathBuf {
    dir.join(format!("{collection}.json"))
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, embedding: Vec<f32>) -> CaseRecord {
        CaseRecord::new(id, format!("case {id}"), embedding)
    }

    #[test]
    fn test_open_missing_collection() {
        let dir = TempDir::new().unwrap();
        assert!(CaseStore::open(dir.path(), "medical_notes").unwrap().is_none());
    }

    #[test]
    fn test_insert_search_count() {
        let dir = TempDir::new().unwrap();
        let mut store = CaseStore::create_or_open(dir.path(), "medical_notes", 3).unwrap();

        store.insert(record("0", vec![1.0, 0.0, 0.0])).unwrap();
        store.insert(record("1", vec![0.0, 1.0, 0.0])).unwrap();
        store.insert(record("2", vec![0.9, 0.1, 0.0])).unwrap();
        assert_eq!(store.count(), 3);

        let hits = store.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.id, "0");
        assert_eq!(hits[1].0.id, "2");
        assert!(hits[0].1 >= hits[1].1);
    }

    #[test]
    fn test_insert_overwrites_same_id() {
        let dir = TempDir::new().unwrap();
        let mut store = CaseStore::create_or_open(dir.path(), "medical_notes", 3).unwrap();

        store.insert(record("0", vec![1.0, 0.0, 0.0])).unwrap();
        store
            .insert(CaseRecord::new("0", "replaced", vec![0.0, 1.0, 0.0]))
            .unwrap();

        assert_eq!(store.count(), 1);
        let hits = store.search(&[0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].0.text, "replaced");
    }

    #[test]
    fn test_dimension_mismatch() {
        let dir = TempDir::new().unwrap();
        let mut store = CaseStore::create_or_open(dir.path(), "medical_notes", 3).unwrap();

        let err = store.insert(record("0", vec![1.0])).unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch { expected: 3, actual: 1 }
        ));
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let mut store = CaseStore::create_or_open(dir.path(), "medical_notes", 3).unwrap();
        store.insert(record("0", vec![1.0, 0.0, 0.0])).unwrap();
        store.insert(record("1", vec![0.0, 1.0, 0.0])).unwrap();
        store.persist().unwrap();

        let reloaded = CaseStore::open(dir.path(), "medical_notes").unwrap().unwrap();
        assert_eq!(reloaded.count(), 2);
        assert_eq!(reloaded.dimension(), 3);

        let hits = reloaded.search(&[0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].0.id, "1");
    }

    #[test]
    fn test_create_or_open_is_idempotent() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = CaseStore::create_or_open(dir.path(), "medical_notes", 3).unwrap();
            store.insert(record("0", vec![1.0, 0.0, 0.0])).unwrap();
            store.persist().unwrap();
        }

        // Re-opening must see the persisted records, not an empty store.
        let store = CaseStore::create_or_open(dir.path(), "medical_notes", 3).unwrap();
        assert_eq!(store.count(), 1);
    }
}
