//! chatrelay ingest: document loading and text chunking.

pub mod chunking;
pub mod document;

pub use chunking::{Chunk, FixedSizeChunker};
pub use document::load_document;
