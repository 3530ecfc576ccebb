//! In-process vector index with cosine similarity
//!
//! Backs the `memory` backend for local runs and serves as the index in
//! integration tests. Semantics follow the remote index: upsert-by-id, top-k
//! by descending score, metadata only on request.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::IndexSpec;
use super::VectorIndex;
use crate::errors::GuardianlyError;
use crate::errors::Result;
use crate::models::IndexMatch;
use crate::models::VectorRecord;

#[derive(Default)]
pub struct InMemoryIndex {
    records: DashMap<String, VectorRecord>,
    /// 0 until the index has been created
    dimension: AtomicUsize,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// An index that already exists with the given dimension
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            records: DashMap::new(),
            dimension: AtomicUsize::new(dimension),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<VectorRecord> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    fn check_dimension(&self, len: usize) -> Result<()> {
        match self.dimension.load(Ordering::SeqCst) {
            0 => Err(GuardianlyError::IndexError("index does not exist".to_string())),
            expected if expected != len => Err(GuardianlyError::IndexError(format!(
                "vector dimension {len} does not match index dimension {expected}"
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<bool> {
        match self
            .dimension
            .compare_exchange(0, spec.dimension, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => {
                debug!("Created in-memory index {} ({} dims)", spec.name, spec.dimension);
                Ok(true)
            }
            Err(existing) if existing == spec.dimension => Ok(false),
            Err(existing) => Err(GuardianlyError::IndexError(format!(
                "index {} exists with dimension {existing}, expected {}",
                spec.name, spec.dimension
            ))),
        }
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        for record in records {
            self.check_dimension(record.values.len())?;
        }
        for record in records {
            self.records.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>> {
        self.check_dimension(vector.len())?;

        let mut matches: Vec<IndexMatch> = self
            .records
            .iter()
            .map(|entry| {
                let record = entry.value();
                IndexMatch {
                    id: record.id.clone(),
                    score: cosine_similarity(vector, &record.values),
                    metadata: include_metadata.then(|| record.metadata.clone()),
                }
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(top_k);
        Ok(matches)
    }
}

/// Cosine similarity; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
