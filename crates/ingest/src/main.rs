//! Corpus ingestion job
//!
//! Run-to-completion, no flags: reads the transcription CSV, embeds every
//! non-empty row and persists the case store. Any error aborts the run.

mod loader;

use anyhow::Context;

use medisecure_config::load_settings;
use medisecure_rag::{CaseStore, Embedder, IngestionPipeline};

fn main() -> anyhow::Result<()> {
    let settings = load_settings(std::env::var("MEDISECURE_ENV").ok().as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.observability.log_level.clone().into()),
        )
        .init();

    tracing::info!(store_dir = %settings.rag.store_dir, "Persistent store directory");

    let texts = loader::load_corpus(&settings.ingest.data_path, &settings.ingest.text_column)
        .with_context(|| format!("Failed to load corpus from {}", settings.ingest.data_path))?;
    tracing::info!(rows = texts.len(), "Documents found in CSV");

    let embedder = Embedder::new(settings.rag.embedding.clone())
        .context("Failed to initialize embedder")?;
    let store = CaseStore::create_or_open(
        &settings.rag.store_dir,
        &settings.rag.collection,
        settings.rag.embedding.dimension,
    )
    .context("Failed to open case store")?;

    tracing::info!("Indexing documents... this may take a minute.");
    let (store, report) = IngestionPipeline::new(embedder, store)
        .run(&texts)
        .context("Ingestion aborted")?;

    tracing::info!(total = store.count(), indexed = report.indexed, "Total vectors stored");
    tracing::info!("Medical notes indexed and saved successfully.");

    Ok(())
}
