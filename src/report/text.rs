// src/report/text.rs
use std::fs;
use std::path::Path;

use crate::report::models::{Document, RawPage};
use crate::utils::error::ExtractError;

/// Reads the page-text file of one document (JSON Lines, one `RawPage` per line).
/// Lines that are blank or fail to parse are skipped with a warning.
pub fn load_pure_text(key: &str, path: &Path) -> Result<Vec<RawPage>, ExtractError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ExtractError::TextUnavailable(key.to_string(), e))?;

    let mut pages = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RawPage>(line) {
            Ok(page) => pages.push(page),
            Err(e) => {
                tracing::warn!("Skipping malformed text record {}:{} ({})", path.display(), line_no + 1, e);
            }
        }
    }
    tracing::debug!("Loaded {} text records for {}", pages.len(), key);
    Ok(pages)
}

/// Loads a document, degrading to a zero-page document when the text is unavailable.
pub fn load_document(key: &str, path: &Path) -> Document {
    match load_pure_text(key, path) {
        Ok(pages) => Document::from_raw_pages(key, pages),
        Err(e) => {
            tracing::warn!("{}; treating {} as an empty document", e, key);
            Document::from_raw_pages(key, Vec::new())
        }
    }
}
