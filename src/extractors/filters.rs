// src/extractors/filters.rs
use std::collections::BTreeSet;

use crate::report::models::TableCandidate;

// Legend and disclosure blocks ("…指…" definitions) repeat this marker.
const LEGEND_MARKER: char = '指';
const LEGEND_MARKER_LIMIT: usize = 5;

/// Drops tables holding an invalid keyword or looking like a legend block.
/// If nothing survives, the input is returned unchanged.
pub fn filter_tables(tables: &[TableCandidate], invalid_keywords: &[&str]) -> Vec<TableCandidate> {
    let filtered: Vec<TableCandidate> = tables
        .iter()
        .filter(|table| {
            let text = table.flattened_text();
            if let Some(keyword) = invalid_keywords.iter().find(|k| text.contains(*k)) {
                tracing::trace!("Drop table on page {} for invalid keyword {}", table.page, keyword);
                return false;
            }
            text.matches(LEGEND_MARKER).count() < LEGEND_MARKER_LIMIT
        })
        .cloned()
        .collect();

    if filtered.is_empty() {
        return tables.to_vec();
    }
    filtered
}

/// Orders by page, then top of page first. Stable.
pub fn sort_tables(tables: &[TableCandidate]) -> Vec<TableCandidate> {
    let mut sorted = tables.to_vec();
    // Origin is bottom-left, so a larger y is higher on the page.
    sorted.sort_by(|a, b| a.page.cmp(&b.page).then_with(|| b.y.total_cmp(&a.y)));
    sorted
}

/// Drops a table whose page is more than one past its immediate predecessor's.
/// Expects sorted input; indices are judged against the input, not the output.
pub fn remove_tables_over_pages(tables: &[TableCandidate]) -> Vec<TableCandidate> {
    let idx_to_remove: BTreeSet<usize> = tables
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1].page > pair[0].page + 1)
        .map(|(i, _)| i + 1)
        .collect();

    retain_indices(tables, &idx_to_remove)
}

pub(crate) fn retain_indices(tables: &[TableCandidate], idx_to_remove: &BTreeSet<usize>) -> Vec<TableCandidate> {
    tables
        .iter()
        .enumerate()
        .filter(|(i, _)| !idx_to_remove.contains(i))
        .map(|(_, t)| t.clone())
        .collect()
}
