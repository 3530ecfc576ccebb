//! Vector index access
//!
//! The index is an external system of record for playbook embeddings. The
//! core talks to it only through [`VectorIndex`]: idempotent index creation,
//! upsert-by-id and top-k similarity search with metadata.

pub mod memory;
pub mod pinecone;

use async_trait::async_trait;
pub use memory::InMemoryIndex;
pub use pinecone::PineconeIndex;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::Result;
use crate::models::IndexMatch;
use crate::models::VectorRecord;

/// Similarity metric of an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
    Euclidean,
    Dotproduct,
}

/// Shape of the index the loader expects to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
}

impl IndexSpec {
    /// Cosine index with the given name and dimension
    pub fn cosine(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric: Metric::Cosine,
        }
    }
}

/// Narrow client interface over a vector index service
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the index if it does not exist; returns whether it was created
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<bool>;

    /// Insert or overwrite records by id
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Nearest neighbours of `vector`, best match first
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>>;
}
