// src/config.rs
use std::path::{Path, PathBuf};

use crate::extractors::statement::StatementKind;

pub const DATA_DIR_ENV: &str = "FINSTATE_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "./data";
const PDF_TEXT_DIR: &str = "pdf_docs";
const PDF_INFO_FILE: &str = "pdf_info.json";
const PURE_TEXT_FILE: &str = "pure_content.txt";

/// Picks the data directory: CLI flag, then `FINSTATE_DATA_DIR`, then `./data`.
pub fn resolve_data_dir(cli_value: Option<PathBuf>) -> PathBuf {
    cli_value
        .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// File locations under the data directory.
#[derive(Debug, Clone)]
pub struct DataLayout {
    data_dir: PathBuf,
}

impl DataLayout {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self { data_dir: data_dir.as_ref().to_path_buf() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn pdf_info_path(&self) -> PathBuf {
        self.data_dir.join(PDF_INFO_FILE)
    }

    pub fn document_dir(&self, key: &str) -> PathBuf {
        self.data_dir.join(PDF_TEXT_DIR).join(key)
    }

    pub fn pure_text_path(&self, key: &str) -> PathBuf {
        self.document_dir(key).join(PURE_TEXT_FILE)
    }

    pub fn table_path(&self, key: &str, kind: StatementKind) -> PathBuf {
        self.document_dir(key).join(format!("{}.txt", kind.key()))
    }

    pub fn debug_path(&self, key: &str, kind: StatementKind) -> PathBuf {
        self.document_dir(key).join(format!("{}.debug.txt", kind.key()))
    }

    pub fn merged_path(&self, kind: StatementKind) -> PathBuf {
        self.data_dir.join(format!("{}.json", kind.key()))
    }

    pub fn merge_meta_path(&self, kind: StatementKind) -> PathBuf {
        self.data_dir.join(format!("{}_meta.json", kind.key()))
    }

    /// Relative PDF paths in the index are taken relative to the data directory.
    pub fn resolve_pdf_path(&self, pdf_path: &Path) -> PathBuf {
        if pdf_path.is_absolute() {
            pdf_path.to_path_buf()
        } else {
            self.data_dir.join(pdf_path)
        }
    }
}
