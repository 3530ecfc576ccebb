//! Query-time retrieval of playbook context

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tracing::debug;
use tracing::warn;

use crate::embeddings::Embedder;
use crate::errors::GuardianlyError;
use crate::errors::Result;
use crate::hazards::HazardCategory;
use crate::models::RetrievedContext;
use crate::rag::ContextAssembler;
use crate::vector_index::VectorIndex;

/// Embeds a hazard query and fetches the nearest playbooks
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    assembler: ContextAssembler,
    top_k: usize,
    timeout: Duration,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            assembler: ContextAssembler::default(),
            top_k,
            timeout,
        }
    }

    /// Stable query text for a hazard at a location
    pub fn build_query(category: HazardCategory, lat: f64, lng: f64) -> String {
        format!("Procedures for {} hazard near {lat}, {lng}", category.key())
    }

    /// Retrieve grounding context; never fails
    ///
    /// Embedding or index errors, and the whole call exceeding the retrieval
    /// timeout, degrade to [`RetrievedContext::RetrievalFailed`].
    pub async fn retrieve(&self, category: HazardCategory, lat: f64, lng: f64) -> RetrievedContext {
        let started = Instant::now();
        match tokio::time::timeout(self.timeout, self.try_retrieve(category, lat, lng)).await {
            Ok(Ok(context)) => {
                debug!(
                    "Retrieved context for {} in {}ms (grounded: {})",
                    category,
                    started.elapsed().as_millis(),
                    context.is_grounded()
                );
                context
            }
            Ok(Err(e)) => {
                warn!("Context retrieval failed for {}: {}", category, e);
                RetrievedContext::RetrievalFailed
            }
            Err(_) => {
                let e = GuardianlyError::Timeout {
                    operation: "context retrieval",
                    elapsed: started.elapsed(),
                };
                warn!("Context retrieval failed for {}: {}", category, e);
                RetrievedContext::RetrievalFailed
            }
        }
    }

    /// Retrieval with errors propagated
    pub async fn try_retrieve(
        &self,
        category: HazardCategory,
        lat: f64,
        lng: f64,
    ) -> Result<RetrievedContext> {
        let query = Self::build_query(category, lat, lng);
        debug!("Embedding retrieval query: {}", query);

        let vector = self.embedder.embed(&query).await?;
        let matches = self.index.query(&vector, self.top_k, true).await?;
        debug!("Index returned {} matches", matches.len());

        Ok(self.assembler.assemble(&matches))
    }
}
