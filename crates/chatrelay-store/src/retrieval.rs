//! Document retrieval: chunk, embed once at startup, look up per request.

use std::sync::Arc;

use tracing::{debug, info};

use chatrelay_core::{Error, Result};
use chatrelay_infer::Embedder;
use chatrelay_ingest::FixedSizeChunker;

use crate::index::VectorIndex;
use crate::types::{format_context, SearchHit};

pub struct RetrievalIndex {
    embedder: Arc<dyn Embedder>,
    index: VectorIndex,
    top_k: usize,
}

impl RetrievalIndex {
    /// Chunk `document`, embed every chunk and load the vectors.
    pub async fn build(
        document: &str,
        chunker: &FixedSizeChunker,
        embedder: Arc<dyn Embedder>,
        top_k: usize,
    ) -> Result<Self> {
        let chunks = chunker.chunk(document);
        if chunks.is_empty() {
            return Err(Error::Index("Document produced no chunks".into()));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        let index = VectorIndex::build(chunks, embeddings)?;

        info!(
            "Retrieval index ready: {} chunks, dimension {}",
            index.len(),
            index.dimension()
        );

        Ok(Self {
            embedder,
            index,
            top_k,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let query_embedding = self.embedder.embed(query).await?;
        self.index.search(&query_embedding, self.top_k)
    }

    /// Context block for `query`: the top-k chunk texts joined together.
    pub async fn context_for(&self, query: &str) -> Result<String> {
        let hits = self.search(query).await?;
        debug!(
            "Retrieved {} chunks (best score {:.3})",
            hits.len(),
            hits.first().map(|h| h.score).unwrap_or(0.0)
        );
        Ok(format_context(&hits))
    }
}
