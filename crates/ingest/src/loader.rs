//! Corpus loader
//!
//! Reads the tabular dataset and extracts the transcription column,
//! discarding rows with missing or empty text.

use std::path::Path;

use anyhow::{anyhow, Context};

/// Load every non-empty text row from the corpus CSV.
pub fn load_corpus(path: impl AsRef<Path>, text_column: &str) -> anyhow::Result<Vec<String>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;

    let headers = reader.headers().context("Corpus has no header row")?.clone();
    let column = headers
        .iter()
        .position(|h| h == text_column)
        .ok_or_else(|| anyhow!("Column '{}' not found in {}", text_column, path.display()))?;

    let mut texts = Vec::new();
    for record in reader.records() {
        let record = record.context("Malformed CSV record")?;
        if let Some(text) = record.get(column) {
            let text = text.trim();
            if !text.is_empty() {
                texts.push(text.to_string());
            }
        }
    }

    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn corpus(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_loads_text_column() {
        let file = corpus(
            "specialty,transcription\n\
             cardiology,Patient reports chest pain\n\
             orthopedics,Fractured left ankle\n",
        );

        let texts = load_corpus(file.path(), "transcription").unwrap();
        assert_eq!(
            texts,
            vec!["Patient reports chest pain", "Fractured left ankle"]
        );
    }

    #[test]
    fn test_drops_empty_rows() {
        let file = corpus(
            "specialty,transcription\n\
             cardiology,Patient reports chest pain\n\
             unknown,\n\
             other,   \n\
             orthopedics,Fractured left ankle\n",
        );

        let texts = load_corpus(file.path(), "transcription").unwrap();
        assert_eq!(texts.len(), 2);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let file = corpus("specialty,notes\ncardiology,hello\n");
        assert!(load_corpus(file.path(), "transcription").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_corpus("does/not/exist.csv", "transcription").is_err());
    }
}
