//! chatrelay store: cosine-similarity index over document chunks.

pub mod index;
pub mod retrieval;
pub mod types;

pub use index::VectorIndex;
pub use retrieval::RetrievalIndex;
pub use types::*;
