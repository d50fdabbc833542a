//! chatrelay infer: embedding generation.
//!
//! `Embedder` abstracts over where vectors come from. `OpenAIEmbedder`
//! calls the hosted embeddings endpoint; `CachedEmbedder` wraps any
//! embedder and memoizes single-query lookups.

pub mod cache;
pub mod embedder;

pub use cache::CachedEmbedder;
pub use embedder::{Embedder, OpenAIEmbedder};
