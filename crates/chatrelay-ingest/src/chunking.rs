//! Fixed-size text chunking.
//!
//! Splits on the coarsest separator that works (blank line, newline,
//! space) and greedily packs pieces up to `chunk_size` characters. Pieces
//! with no usable separator are cut at character boundaries. Chunks never
//! overlap.

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// One indexed fragment of the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

pub struct FixedSizeChunker {
    pub chunk_size: usize,
    separators: Vec<&'static str>,
}

impl FixedSizeChunker {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            separators: vec!["\n\n", "\n", " "],
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        self.split_text(text, &self.separators)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { index, text })
            .collect()
    }

    fn split_text(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return non_empty(text).into_iter().collect();
        }

        let Some((separator, remaining)) = separators.split_first() else {
            return self.hard_split(text);
        };

        let mut chunks = Vec::new();
        let mut current = String::new();
        let sep_len = char_len(separator);

        for piece in text.split(separator) {
            let piece_len = char_len(piece);

            if piece_len > self.chunk_size {
                chunks.extend(non_empty(&current));
                current.clear();
                chunks.extend(self.split_text(piece, remaining));
            } else if !current.is_empty() && char_len(&current) + sep_len + piece_len > self.chunk_size {
                chunks.extend(non_empty(&current));
                current = piece.to_string();
            } else {
                if !current.is_empty() {
                    current.push_str(separator);
                }
                current.push_str(piece);
            }
        }

        chunks.extend(non_empty(&current));
        chunks
    }

    fn hard_split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(self.chunk_size)
            .filter_map(|c| non_empty(&c.iter().collect::<String>()))
            .collect()
    }
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
