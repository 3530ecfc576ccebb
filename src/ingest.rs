//! Playbook ingestion into the vector index
//!
//! One-shot batch: make sure the index exists, tag and embed every document,
//! then upsert them by id. A failing document is recorded in the
//! [`IngestReport`] and the batch carries on.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use futures::stream;
use futures::StreamExt;
use glob::Pattern;
use sha2::Digest;
use sha2::Sha256;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::embeddings::Embedder;
use crate::errors::GuardianlyError;
use crate::errors::Result;
use crate::hazards::HazardCategory;
use crate::models::IngestFailure;
use crate::models::IngestReport;
use crate::models::IngestStage;
use crate::models::ProcedureDocument;
use crate::models::SourceDocument;
use crate::vector_index::IndexSpec;
use crate::vector_index::VectorIndex;

/// Hex characters of the content hash used in generated ids
const HASH_ID_LEN: usize = 16;

/// Document Store Loader
pub struct PlaybookLoader {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    spec: IndexSpec,
    concurrency: usize,
}

/// A source document with its id and tag resolved, before embedding
#[derive(Debug, Clone)]
struct PendingDocument {
    id: String,
    source: String,
    category: HazardCategory,
    text: String,
}

impl PlaybookLoader {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        spec: IndexSpec,
        concurrency: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            spec,
            concurrency: concurrency.max(1),
        }
    }

    pub fn index_spec(&self) -> &IndexSpec {
        &self.spec
    }

    /// Ingest a batch of documents; never fails as a whole
    pub async fn ingest(&self, documents: Vec<SourceDocument>) -> IngestReport {
        let started_at = Utc::now();
        info!(
            "Ingesting {} playbooks into {}",
            documents.len(),
            self.spec.name
        );

        let (index_created, index_error) = match self.index.ensure_index(&self.spec).await {
            Ok(created) => (created, None),
            Err(e) => {
                warn!("Index setup for {} failed: {}", self.spec.name, e);
                (false, Some(e.to_string()))
            }
        };

        let pending: Vec<PendingDocument> = documents.into_iter().map(prepare).collect();

        // Embeddings run concurrently; results keep input order
        let embedder = &self.embedder;
        let embedded: Vec<(PendingDocument, Result<Vec<f32>>)> = stream::iter(pending)
            .map(|doc| async move {
                let embedding = embedder.embed(&doc.text).await;
                (doc, embedding)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut indexed = Vec::new();
        let mut failed = Vec::new();

        // Sequential upserts so a repeated id ends with the later document
        for (doc, embedding) in embedded {
            let embedding = match embedding {
                Ok(embedding) => embedding,
                Err(e) => {
                    warn!("Failed to embed {}: {}", doc.id, e);
                    failed.push(IngestFailure {
                        id: doc.id,
                        stage: IngestStage::Embedding,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let id = doc.id.clone();
            let record = ProcedureDocument {
                id: doc.id,
                text: doc.text,
                hazard_category: doc.category,
                source: doc.source,
                embedding,
            }
            .into_record();

            match self.index.upsert(std::slice::from_ref(&record)).await {
                Ok(()) => {
                    info!("Successfully indexed: {} ({})", id, record.metadata.hazard);
                    indexed.push(id);
                }
                Err(e) => {
                    warn!("Failed to upsert {}: {}", id, e);
                    failed.push(IngestFailure {
                        id,
                        stage: IngestStage::Upsert,
                        error: e.to_string(),
                    });
                }
            }
        }

        let report = IngestReport {
            index_name: self.spec.name.clone(),
            index_created,
            index_error,
            indexed,
            failed,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "Ingestion finished: {} indexed, {} failed",
            report.indexed.len(),
            report.failed.len()
        );
        report
    }
}

fn prepare(document: SourceDocument) -> PendingDocument {
    let filename = document
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    match filename {
        Some(name) => PendingDocument {
            category: HazardCategory::detect_from_filename(&name),
            id: name.clone(),
            source: name,
            text: document.text,
        },
        None => {
            let id = content_id(&document.text);
            PendingDocument {
                category: HazardCategory::General,
                source: id.clone(),
                id,
                text: document.text,
            }
        }
    }
}

/// Stable id for a document supplied without a filename
pub fn content_id(text: &str) -> String {
    let digest = hex::encode(Sha256::digest(text.as_bytes()));
    format!("doc-{}", &digest[..HASH_ID_LEN])
}

/// Read every file in `dir` whose name matches the glob `pattern`, sorted by name
///
/// Files that are not valid UTF-8 are skipped.
pub fn discover_playbooks(dir: impl AsRef<Path>, pattern: &str) -> Result<Vec<SourceDocument>> {
    let dir = dir.as_ref();
    let matcher = Pattern::new(pattern).map_err(|e| {
        GuardianlyError::ConfigError(format!("invalid playbook pattern '{pattern}': {e}"))
    })?;
    let mut names: Vec<String> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if matcher.matches(&name) {
            names.push(name);
        }
    }
    names.sort();

    let mut documents = Vec::with_capacity(names.len());
    for name in names {
        match std::fs::read_to_string(dir.join(&name)) {
            Ok(text) => documents.push(SourceDocument::new(name, text)),
            Err(e) => warn!("Skipping {}: {}", name, e),
        }
    }

    debug!(
        "Found {} playbooks matching {} in {}",
        documents.len(),
        pattern,
        dir.display()
    );
    Ok(documents)
}
