// src/extractors/dedup.rs

// --- Imports ---
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extractors::filters::retain_indices;
use crate::extractors::statement::OverlapPolicy;
use crate::report::models::TableCandidate;

// --- Regex Patterns for Row Names (Lazy Static) ---
// Leading enumeration: 一、 1. 1、 （1） (一) ⑴ and friends
static ENUMERATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[（(][0-9一二三四五六七八九十]+[)）]|[0-9一二三四五六七八九十]+[、.．])")
        .expect("Failed to compile ENUMERATION_RE")
});

// "其中：", "加：", "减：" style prefixes
static QUALIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:其中|加|减)[:：]").expect("Failed to compile QUALIFIER_RE")
});

static TRAILING_COLON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[:：]+$").expect("Failed to compile TRAILING_COLON_RE")
});

/// Normalizes a first-column label so the same row matches across tables.
pub fn clean_row_name(name: &str) -> String {
    let name: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    let name = ENUMERATION_RE.replace(&name, "");
    let name = QUALIFIER_RE.replace(&name, "");
    TRAILING_COLON_RE.replace(&name, "").into_owned()
}

/// Cleaned, non-empty first-column labels of a table.
pub fn row_names(table: &TableCandidate) -> BTreeSet<String> {
    table
        .first_column()
        .map(clean_row_name)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Removes later tables repeating the row structure of an earlier one.
///
/// For every pair `i < j`, names shared by both tables count as overlap unless
/// they contain one of the policy's exempt words. Reaching `max_overlap_words`
/// marks `j`. Marks from all pairs are unioned before filtering. Expects sorted input.
pub fn remove_overlap_tables(tables: &[TableCandidate], policy: &OverlapPolicy) -> Vec<TableCandidate> {
    let table_row_names: Vec<BTreeSet<String>> = tables.iter().map(row_names).collect();

    let mut idx_to_remove = BTreeSet::new();
    for i in 0..tables.len() {
        for j in (i + 1)..tables.len() {
            let overlap_words: Vec<&String> = table_row_names[i]
                .intersection(&table_row_names[j])
                .filter(|name| !policy.valid_overlap_words.iter().any(|w| name.contains(w)))
                .collect();
            if overlap_words.len() >= policy.max_overlap_words {
                tracing::trace!("Drop table on page {} overlapping {:?}", tables[j].page, overlap_words);
                idx_to_remove.insert(j);
            }
        }
    }

    retain_indices(tables, &idx_to_remove)
}

/// Within a page only one table should survive: of every same-page pair, the
/// one hitting fewer keywords is dropped. Ties keep both.
pub fn remove_tables_same_page_by_keywords(tables: &[TableCandidate], keywords: &[&str]) -> Vec<TableCandidate> {
    let table_keyword_counts: Vec<usize> = tables
        .iter()
        .map(|table| {
            let text = table.flattened_text();
            keywords.iter().filter(|k| text.contains(*k)).count()
        })
        .collect();

    let mut idx_to_remove = BTreeSet::new();
    for i in 0..tables.len() {
        for j in (i + 1)..tables.len() {
            if tables[i].page != tables[j].page {
                continue;
            }
            match table_keyword_counts[i].cmp(&table_keyword_counts[j]) {
                std::cmp::Ordering::Greater => {
                    idx_to_remove.insert(j);
                }
                std::cmp::Ordering::Less => {
                    idx_to_remove.insert(i);
                }
                std::cmp::Ordering::Equal => {}
            }
        }
    }

    retain_indices(tables, &idx_to_remove)
}
