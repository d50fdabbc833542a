//! Search result types.

/// A chunk returned by a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk_index: usize,
    pub text: String,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

/// Join hit texts into one context block, best match first.
pub fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
