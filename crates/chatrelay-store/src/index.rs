//! Row-normalized embedding matrix with brute-force cosine search.

use ndarray::{Array1, Array2};
use tracing::debug;

use chatrelay_core::{Error, Result};
use chatrelay_ingest::Chunk;

use crate::types::SearchHit;

/// Immutable after `build`; safe to share behind `Arc` without locking.
pub struct VectorIndex {
    /// (N, dim), each row unit length.
    matrix: Array2<f32>,
    chunks: Vec<Chunk>,
}

impl VectorIndex {
    pub fn build(chunks: Vec<Chunk>, embeddings: Vec<Array1<f32>>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(Error::Index(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dim = embeddings.first().map(|e| e.len()).unwrap_or(0);
        let mut matrix = Array2::zeros((embeddings.len(), dim));
        for (i, emb) in embeddings.iter().enumerate() {
            if emb.len() != dim {
                return Err(Error::Index(format!(
                    "Embedding {} has dimension {}, expected {}",
                    i,
                    emb.len(),
                    dim
                )));
            }
            matrix.row_mut(i).assign(emb);
        }

        // Normalize rows for cosine similarity via dot product
        for mut row in matrix.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 1e-9 {
                row /= norm;
            }
        }

        debug!("Built index with {} rows of dimension {}", chunks.len(), dim);
        Ok(Self { matrix, chunks })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.matrix.ncols()
    }

    /// Top-k chunks by cosine similarity, best first.
    pub fn search(&self, query: &Array1<f32>, top_k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension() {
            return Err(Error::Index(format!(
                "Query has dimension {}, index has {}",
                query.len(),
                self.dimension()
            )));
        }

        let q_norm = query.dot(query).sqrt();
        if q_norm < 1e-9 {
            return Ok(Vec::new());
        }
        let q = query / q_norm;

        // (N, dim) @ (dim,) -> (N,)
        let similarities = self.matrix.dot(&q);

        let mut ranked: Vec<(usize, f32)> = similarities.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);

        Ok(ranked
            .into_iter()
            .map(|(i, score)| SearchHit {
                chunk_index: self.chunks[i].index,
                text: self.chunks[i].text.clone(),
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            index,
            text: text.to_string(),
        }
    }

    fn sample() -> VectorIndex {
        VectorIndex::build(
            vec![chunk(0, "cats"), chunk(1, "dogs"), chunk(2, "rust")],
            vec![array![1.0, 0.0, 0.0], array![0.9, 0.1, 0.0], array![0.0, 0.0, 5.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let index = sample();
        let hits = index.search(&array![0.0, 0.0, 1.0], 2).unwrap();
        assert_eq!(hits[0].text, "rust");
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_top_k_larger_than_index() {
        let hits = sample().search(&array![1.0, 0.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].text, "cats");
        assert_eq!(hits[1].text, "dogs");
    }

    #[test]
    fn test_zero_query_returns_nothing() {
        assert!(sample().search(&array![0.0, 0.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = sample().search(&array![1.0, 0.0], 3).unwrap_err();
        assert!(matches!(err, Error::Index(_)));

        let err = VectorIndex::build(
            vec![chunk(0, "a"), chunk(1, "b")],
            vec![array![1.0, 0.0], array![1.0]],
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::Index(_)));
    }

    #[test]
    fn test_count_mismatch() {
        let result = VectorIndex::build(vec![chunk(0, "a")], vec![]);
        assert!(result.is_err());
    }
}
