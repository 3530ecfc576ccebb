//! TTL cache for query embeddings
//!
//! Retrieval builds the same query string for the same hazard and
//! coordinates, so repeated alerts from one spot can skip the embedding call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::Embedder;
use crate::errors::Result;

/// Cache entry with TTL support
#[derive(Debug, Clone)]
struct CacheEntry {
    embedding: Vec<f32>,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(embedding: Vec<f32>, ttl: Duration) -> Self {
        Self {
            embedding,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() > at)
    }
}

/// Cache statistics
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Wraps any [`Embedder`] with an exact-text TTL cache
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    entries: RwLock<HashMap<String, CacheEntry>>,
    stats: RwLock<CacheStats>,
    ttl: Duration,
    max_entries: usize,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, 10_000)
    }

    pub fn with_capacity(inner: Arc<dyn Embedder>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    async fn lookup(&self, text: &str) -> Option<Vec<f32>> {
        let mut entries = self.entries.write().await;
        match entries.get(text) {
            Some(entry) if !entry.is_expired() => Some(entry.embedding.clone()),
            Some(_) => {
                entries.remove(text);
                self.stats.write().await.evictions += 1;
                None
            }
            None => None,
        }
    }

    async fn store(&self, text: &str, embedding: Vec<f32>) {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries {
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired());
            if entries.len() >= self.max_entries {
                entries.clear();
            }
            self.stats.write().await.evictions += (before - entries.len()) as u64;
        }
        entries.insert(text.to_string(), CacheEntry::new(embedding, self.ttl));
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(embedding) = self.lookup(text).await {
            self.stats.write().await.hits += 1;
            debug!("Embedding cache hit");
            return Ok(embedding);
        }

        let hit_rate = {
            let mut stats = self.stats.write().await;
            stats.misses += 1;
            stats.hit_rate()
        };
        debug!("Embedding cache miss, hit rate {:.2}", hit_rate);
        let embedding = self.inner.embed(text).await?;
        self.store(text, embedding.clone()).await;
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::errors::GuardianlyError;

    struct CountingEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GuardianlyError::EmbeddingError("quota".to_string()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn counting(fail: bool) -> Arc<CountingEmbedder> {
        Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test]
    async fn test_repeated_text_hits_cache() {
        let inner = counting(false);
        let cached = CachedEmbedder::new(inner.clone(), Duration::from_secs(60));

        let first = cached.embed("road_closure near 1, 2").await.unwrap();
        let second = cached.embed("road_closure near 1, 2").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        let stats = *cached.stats.read().await;
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
        assert_eq!(cached.dimension(), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_are_refetched() {
        let inner = counting(false);
        let cached = CachedEmbedder::new(inner.clone(), Duration::ZERO);

        cached.embed("a").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        cached.embed("a").await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.stats.read().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_unbounded_ttl_never_expires() {
        let inner = counting(false);
        let cached = CachedEmbedder::new(inner.clone(), Duration::from_secs(u64::MAX));

        cached.embed("q").await.unwrap();
        cached.embed("q").await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.stats.read().await.evictions, 0);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let inner = counting(true);
        let cached = CachedEmbedder::new(inner.clone(), Duration::from_secs(60));

        assert!(cached.embed("a").await.is_err());
        assert!(cached.embed("a").await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_capacity_bound() {
        let inner = counting(false);
        let cached = CachedEmbedder::with_capacity(inner, Duration::from_secs(60), 2);
        for text in ["a", "bb", "ccc"] {
            cached.embed(text).await.unwrap();
        }
        assert!(cached.entries.read().await.len() <= 2);
    }
}
