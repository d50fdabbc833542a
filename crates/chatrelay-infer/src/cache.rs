//! Memoizing wrapper for query embeddings.
//!
//! Only single-text `embed` calls are cached: those are user questions and
//! tend to repeat. Batch calls (index building) pass straight through.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ndarray::Array1;
use parking_lot::Mutex;
use tracing::trace;

use chatrelay_core::Result;

use crate::embedder::Embedder;

pub const DEFAULT_CAPACITY: usize = 1000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct Slot {
    vector: Array1<f32>,
    stored_at: Instant,
}

struct Lru {
    slots: HashMap<String, Slot>,
    /// Least recently used at the front.
    recency: VecDeque<String>,
}

impl Lru {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            if let Some(k) = self.recency.remove(pos) {
                self.recency.push_back(k);
            }
        }
    }

    fn forget(&mut self, key: &str) {
        self.slots.remove(key);
        self.recency.retain(|k| k != key);
    }
}

pub struct CachedEmbedder<E> {
    inner: E,
    lru: Mutex<Lru>,
    capacity: usize,
    ttl: Duration,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E, capacity: usize, ttl: Duration) -> Self {
        Self {
            inner,
            lru: Mutex::new(Lru {
                slots: HashMap::with_capacity(capacity),
                recency: VecDeque::with_capacity(capacity),
            }),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn with_defaults(inner: E) -> Self {
        Self::new(inner, DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    pub fn len(&self) -> usize {
        self.lru.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<Array1<f32>> {
        let mut lru = self.lru.lock();
        let fresh = lru.slots.get(key).map(|s| s.stored_at.elapsed() < self.ttl)?;
        if !fresh {
            lru.forget(key);
            return None;
        }
        lru.touch(key);
        lru.slots.get(key).map(|s| s.vector.clone())
    }

    fn store(&self, key: String, vector: Array1<f32>) {
        let mut lru = self.lru.lock();
        if lru.slots.contains_key(&key) {
            lru.forget(&key);
        }
        while lru.slots.len() >= self.capacity {
            match lru.recency.pop_front() {
                Some(oldest) => {
                    lru.slots.remove(&oldest);
                }
                None => break,
            }
        }
        lru.recency.push_back(key.clone());
        lru.slots.insert(
            key,
            Slot {
                vector,
                stored_at: Instant::now(),
            },
        );
    }
}

#[async_trait]
impl<E: Embedder> Embedder for CachedEmbedder<E> {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Array1<f32>>> {
        self.inner.embed_batch(texts).await
    }

    async fn embed(&self, text: &str) -> Result<Array1<f32>> {
        if let Some(hit) = self.lookup(text) {
            trace!("Query embedding cache hit");
            return Ok(hit);
        }
        let vector = self.inner.embed(text).await?;
        self.store(text.to_string(), vector.clone());
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Array1<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| Array1::from_vec(vec![t.len() as f32]))
                .collect())
        }
    }

    fn counting() -> CountingEmbedder {
        CountingEmbedder {
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_repeated_query_hits_cache() {
        let cached = CachedEmbedder::new(counting(), 10, Duration::from_secs(60));
        let a = cached.embed("what is rust").await.unwrap();
        let b = cached.embed("what is rust").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_evicts_least_recent() {
        let cached = CachedEmbedder::new(counting(), 2, Duration::from_secs(60));
        cached.embed("a").await.unwrap();
        cached.embed("b").await.unwrap();
        cached.embed("a").await.unwrap(); // "b" is now least recent
        cached.embed("c").await.unwrap();

        assert_eq!(cached.len(), 2);
        assert!(cached.lookup("b").is_none());
        assert!(cached.lookup("a").is_some());
        assert!(cached.lookup("c").is_some());
    }

    #[tokio::test]
    async fn test_expired_entries_refetch() {
        let cached = CachedEmbedder::new(counting(), 10, Duration::from_millis(1));
        cached.embed("ephemeral").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        cached.embed("ephemeral").await.unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_batches_bypass_cache() {
        let cached = CachedEmbedder::with_defaults(counting());
        cached
            .embed_batch(&["x".to_string(), "y".to_string()])
            .await
            .unwrap();
        assert!(cached.is_empty());
    }
}
