// src/report/tables.rs
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::report::models::TableCandidate;
use crate::utils::error::ExtractError;

/// Source of raw table candidates for a page range of a PDF.
///
/// The extraction itself (ruling lines, cell geometry) happens outside this
/// crate; implementations only have to hand back candidates in extraction order.
pub trait TableExtractor: Send + Sync {
    fn extract_tables(
        &self,
        pdf_path: &Path,
        pages: Range<u32>,
    ) -> Result<Vec<TableCandidate>, ExtractError>;
}

// --- Sidecar format ---
// Either an explicit `y` or a `bbox` of [x0, y0, x1, y1] (y0 is used).
#[derive(Debug, Deserialize)]
struct SidecarTable {
    page: u32,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    bbox: Option<[f64; 4]>,
    cells: Vec<Vec<String>>,
}

impl From<SidecarTable> for TableCandidate {
    fn from(raw: SidecarTable) -> Self {
        let y = raw.y.or(raw.bbox.map(|b| b[1])).unwrap_or(0.0);
        TableCandidate::new(raw.page, y, raw.cells)
    }
}

/// Reads tables pre-extracted into `<pdf_path>.tables.json`.
#[derive(Debug, Default, Clone)]
pub struct SidecarTableExtractor;

impl SidecarTableExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn sidecar_path(pdf_path: &Path) -> PathBuf {
        let mut name = pdf_path.as_os_str().to_os_string();
        name.push(".tables.json");
        PathBuf::from(name)
    }
}

impl TableExtractor for SidecarTableExtractor {
    fn extract_tables(
        &self,
        pdf_path: &Path,
        pages: Range<u32>,
    ) -> Result<Vec<TableCandidate>, ExtractError> {
        let sidecar = Self::sidecar_path(pdf_path);
        let content = fs::read_to_string(&sidecar).map_err(|e| ExtractError::TableExtraction {
            path: sidecar.display().to_string(),
            reason: e.to_string(),
        })?;
        let raw: Vec<SidecarTable> = serde_json::from_str(&content)
            .map_err(|e| ExtractError::MalformedSidecar(sidecar.display().to_string(), e))?;

        let tables: Vec<TableCandidate> = raw
            .into_iter()
            .filter(|t| pages.contains(&t.page))
            .map(TableCandidate::from)
            .collect();
        tracing::debug!(
            "Sidecar {} yielded {} tables for pages {:?}",
            sidecar.display(),
            tables.len(),
            pages
        );
        Ok(tables)
    }
}
