//! Ingestion pipeline: file → document row → chunks → embeddings rows.

use std::path::Path;

use neetprep_chat::config::ResolvedProvider;
use neetprep_chat::embeddings;
use neetprep_core::Result;
use neetprep_store::{NewDocument, NewEmbedding, SupabaseClient};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::chunking::{chunk_text, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

/// Language tag recorded on every ingested document.
const CONTENT_LANG: &str = "en";

/// Totals for one ingest run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

/// Loads files into `documents` and `embeddings`.
pub struct Ingester<'a> {
    store: &'a SupabaseClient,
    http: &'a Client,
    provider: &'a ResolvedProvider,
    embedding_model: &'a str,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl<'a> Ingester<'a> {
    pub fn new(
        store: &'a SupabaseClient,
        http: &'a Client,
        provider: &'a ResolvedProvider,
        embedding_model: &'a str,
    ) -> Self {
        Self {
            store,
            http,
            provider,
            embedding_model,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }

    pub fn with_chunking(mut self, size: usize, overlap: usize) -> Self {
        self.chunk_size = size;
        self.chunk_overlap = overlap;
        self
    }

    /// Ingest every regular file directly under `dir`, in name order.
    /// A missing directory is not an error.
    pub async fn ingest_dir(&self, dir: &Path) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        if !dir.is_dir() {
            info!("No content directory at {}", dir.display());
            return Ok(report);
        }

        let mut files: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        for path in files {
            let chunks = self.ingest_file(&path).await?;
            report.documents += 1;
            report.chunks += chunks;
        }

        info!(
            "Ingest done: {} documents, {} chunks",
            report.documents, report.chunks
        );
        Ok(report)
    }

    /// Ingest one file; returns the number of chunks stored.
    pub async fn ingest_file(&self, path: &Path) -> Result<usize> {
        let text = std::fs::read_to_string(path)?;
        let topic = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let doc = self
            .store
            .insert_document(&NewDocument {
                text: text.clone(),
                topic,
                lang: CONTENT_LANG.into(),
            })
            .await?;
        let doc_key = match &doc.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        let chunks = chunk_text(&text, self.chunk_size, self.chunk_overlap);
        for (idx, chunk) in chunks.iter().enumerate() {
            let vector =
                embeddings::embed(self.http, self.provider, self.embedding_model, chunk).await?;
            self.store
                .insert_embedding(&NewEmbedding {
                    document_id: doc.id.clone(),
                    embedding: vector,
                    chunk_id: format!("{}-{}", doc_key, idx),
                    chunk_index: idx,
                })
                .await?;
            debug!("Inserted chunk {} for {}", idx, path.display());
        }

        info!("Ingested {} ({} chunks)", path.display(), chunks.len());
        Ok(chunks.len())
    }
}
