// src/extractors/candidates.rs
use std::ops::Range;
use std::path::Path;

use crate::extractors::anchor::AnchorMatch;
use crate::report::models::TableCandidate;
use crate::report::tables::TableExtractor;

/// Pages `[anchor - prefix, anchor + post]`, clipped to `[0, max_page]`.
pub fn page_window(anchor_page: u32, max_page: u32, prefix_pages: u32, post_pages: u32) -> Range<u32> {
    let start = anchor_page.saturating_sub(prefix_pages);
    let end = (anchor_page + post_pages + 1).min(max_page + 1);
    start..end
}

/// Pulls the raw tables around an anchor and keeps those mentioning at least
/// one row keyword. Extraction failures are logged and yield no candidates.
pub fn fetch_candidates(
    extractor: &dyn TableExtractor,
    doc_key: &str,
    pdf_path: &Path,
    anchor: AnchorMatch,
    prefix_pages: u32,
    post_pages: u32,
    required_post_keywords: &[&str],
) -> Vec<TableCandidate> {
    let (Some(anchor_page), Some(max_page)) = (anchor.page, anchor.max_page) else {
        return Vec::new();
    };

    let pages = page_window(anchor_page, max_page, prefix_pages, post_pages);
    let near_tables = match extractor.extract_tables(pdf_path, pages.clone()) {
        Ok(tables) => tables,
        Err(e) => {
            tracing::warn!("Parse error for {} ({}): {}", doc_key, pdf_path.display(), e);
            Vec::new()
        }
    };

    let total = near_tables.len();
    let tables: Vec<TableCandidate> = near_tables
        .into_iter()
        .filter(|table| {
            let text = table.flattened_text();
            required_post_keywords.iter().any(|k| text.contains(k))
        })
        .collect();
    tracing::debug!(
        "{}: {} of {} tables on pages {:?} mention a row keyword",
        doc_key,
        tables.len(),
        total,
        pages
    );
    tables
}
