// src/report/models.rs
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One record of the page-text file written by the text extraction step.
/// Several records may share a page; they are concatenated in file order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPage {
    pub page: u32,
    pub text: String,
}

/// A single page: 1-based number and its non-empty lines with all whitespace removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: u32,
    pub lines: Vec<String>,
}

/// A line of the flattened document, tagged with the page it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLine<'a> {
    pub page: u32,
    pub text: &'a str,
}

/// An annual report's text, page by page. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub key: String,
    pub pages: Vec<Page>,
}

impl Document {
    /// Builds a document from raw page records, collapsing whitespace and
    /// dropping empty lines. Consecutive records for the same page are merged.
    pub fn from_raw_pages(key: &str, raw_pages: Vec<RawPage>) -> Self {
        let mut pages: Vec<Page> = Vec::new();
        for raw in raw_pages {
            let lines = raw
                .text
                .split('\n')
                .map(strip_whitespace)
                .filter(|line| !line.is_empty());

            if let Some(last) = pages.last_mut().filter(|last| last.number == raw.page) {
                last.lines.extend(lines);
            } else {
                pages.push(Page {
                    number: raw.page,
                    lines: lines.collect(),
                });
            }
        }
        Self {
            key: key.to_string(),
            pages,
        }
    }

    /// Highest page number in the document, `None` for a zero-page document.
    pub fn max_page(&self) -> Option<u32> {
        self.pages.iter().map(|p| p.number).max()
    }

    /// All lines in document order.
    pub fn text_lines(&self) -> Vec<TextLine<'_>> {
        self.pages
            .iter()
            .flat_map(|page| {
                page.lines.iter().map(move |line| TextLine {
                    page: page.number,
                    text: line.as_str(),
                })
            })
            .collect()
    }
}

/// A raw table produced by the external table extractor.
///
/// `y` is the bounding-box coordinate used for ordering; the origin is the
/// bottom-left corner of the page, so larger values sit higher on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCandidate {
    pub page: u32,
    pub y: f64,
    pub cells: Vec<Vec<String>>,
}

impl TableCandidate {
    pub fn new(page: u32, y: f64, cells: Vec<Vec<String>>) -> Self {
        Self { page, y, cells }
    }

    /// Rows joined by `\n`, cells by `|`, whitespace inside cells removed.
    /// Every keyword check runs against this text.
    pub fn flattened_text(&self) -> String {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| strip_whitespace(cell))
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// First cell of every row (rows without cells are skipped).
    pub fn first_column(&self) -> impl Iterator<Item = &str> {
        self.cells
            .iter()
            .filter_map(|row| row.first().map(String::as_str))
    }
}

/// Entry of `pdf_info.json`. Anything besides `pdf_path` is carried through
/// untouched into the merged aggregate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentInfo {
    pub pdf_path: PathBuf,
    #[serde(flatten)]
    #[allow(dead_code)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

pub(crate) fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
