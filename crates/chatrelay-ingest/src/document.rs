//! Source document loading.

use std::path::Path;

use tracing::info;

use chatrelay_core::{Error, Result};

/// Read the retrieval source as UTF-8 text. An empty document is an error:
/// there would be nothing to index.
pub fn load_document(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Err(Error::Index(format!("Document {} is empty", path.display())));
    }
    info!("Loaded document {} ({} bytes)", path.display(), text.len());
    Ok(text)
}
