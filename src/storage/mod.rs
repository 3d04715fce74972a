// src/storage/mod.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::DataLayout;
use crate::extractors::statement::StatementKind;
use crate::report::models::{DocumentInfo, TableCandidate};
use crate::utils::error::StorageError;

/// Renders tables as `page|<n>` headers followed by `|`-joined rows.
/// Newlines inside cells are dropped.
pub fn render_tables(tables: &[TableCandidate]) -> String {
    let mut text = String::new();
    for table in tables {
        text.push_str(&format!("page|{}\n", table.page));
        for row in &table.cells {
            let row: Vec<String> = row.iter().map(|cell| cell.replace(['\n', '\r'], "")).collect();
            text.push_str(&row.join("|"));
            text.push('\n');
        }
    }
    text
}

/// Outcome of folding one statement's outputs into the corpus aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeSummary {
    pub statement: String,
    pub documents: usize,
    pub merged: usize,
}

pub struct StorageManager {
    layout: DataLayout,
}

impl StorageManager {
    /// Creates a StorageManager over the given data layout, creating the data directory if needed
    pub fn new(layout: DataLayout) -> Result<Self, StorageError> {
        if !layout.data_dir().exists() {
            fs::create_dir_all(layout.data_dir()).map_err(StorageError::IoError)?;
        }
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Reads `pdf_info.json`, keyed by document id.
    pub fn load_document_index(&self) -> Result<BTreeMap<String, DocumentInfo>, StorageError> {
        let raw = self.load_raw_index()?;
        let mut index = BTreeMap::new();
        for (key, value) in raw {
            match serde_json::from_value::<DocumentInfo>(value) {
                Ok(info) => {
                    index.insert(key, info);
                }
                Err(e) => tracing::warn!("Skipping index entry {}: {}", key, e),
            }
        }
        Ok(index)
    }

    fn load_raw_index(&self) -> Result<Map<String, Value>, StorageError> {
        let path = self.layout.pdf_info_path();
        if !path.exists() {
            return Err(StorageError::IndexNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    /// Writes the serialized tables of one document; an empty list still writes an empty file.
    pub fn save_tables(&self, key: &str, kind: StatementKind, tables: &[TableCandidate]) -> Result<PathBuf, StorageError> {
        let file_path = self.layout.table_path(key, kind);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, render_tables(tables))?;
        tracing::debug!("Saved {} tables to {}", tables.len(), file_path.display());
        Ok(file_path)
    }

    /// Folds every document's output for `kind` into `<kind>.json`.
    ///
    /// Documents without an output file, or with an empty one, are left out.
    /// The others keep their index metadata plus the output lines under the statement key.
    pub fn merge_statement(&self, kind: StatementKind) -> Result<MergeSummary, StorageError> {
        let mut pdf_info = self.load_raw_index()?;
        let documents = pdf_info.len();

        let keys: Vec<String> = pdf_info.keys().cloned().collect();
        for key in keys {
            let table_path = self.layout.table_path(&key, kind);
            if !table_path.exists() {
                pdf_info.remove(&key);
                continue;
            }
            let content = fs::read_to_string(&table_path)?;
            let lines: Vec<Value> = content
                .split_inclusive('\n')
                .map(|line| Value::String(line.to_string()))
                .collect();
            if lines.is_empty() {
                tracing::debug!("No {} tables for {}, leaving it out", kind, key);
                pdf_info.remove(&key);
                continue;
            }
            match pdf_info.get_mut(&key) {
                Some(Value::Object(entry)) => {
                    entry.insert(kind.key().to_string(), Value::Array(lines));
                }
                _ => {
                    tracing::warn!("Index entry {} is not an object, leaving it out", key);
                    pdf_info.remove(&key);
                }
            }
        }

        let merged = pdf_info.len();
        let merged_path = self.layout.merged_path(kind);
        fs::write(&merged_path, to_indented_json(&Value::Object(pdf_info))?)?;
        tracing::info!("Merged {} of {} documents into {}", merged, documents, merged_path.display());

        let summary = MergeSummary {
            statement: kind.key().to_string(),
            documents,
            merged,
        };
        self.save_merge_metadata(&summary)?;
        Ok(summary)
    }

    /// Saves metadata about a merge in JSON format
    fn save_merge_metadata(&self, summary: &MergeSummary) -> Result<PathBuf, StorageError> {
        let kind = StatementKind::from_key(&summary.statement)
            .ok_or_else(|| StorageError::SerializationError(format!("unknown statement {}", summary.statement)))?;
        let file_path = self.layout.merge_meta_path(kind);

        let metadata = serde_json::json!({
            "statement": summary.statement,
            "documents": summary.documents,
            "merged": summary.merged,
            "merge_timestamp": chrono::Utc::now().to_rfc3339(),
        });
        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str)?;

        tracing::info!("Saved merge metadata to {}", file_path.display());
        Ok(file_path)
    }

    /// Deletes every document's output file for `kind`. Returns how many were removed.
    pub fn clean_statement(&self, kind: StatementKind) -> Result<usize, StorageError> {
        let mut removed = 0;
        for key in self.load_raw_index()?.keys() {
            let table_path = self.layout.table_path(key, kind);
            if table_path.exists() {
                tracing::info!("Remove {}", table_path.display());
                fs::remove_file(&table_path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

// 4-space indentation, UTF-8 kept as-is.
fn to_indented_json(value: &Value) -> Result<Vec<u8>, StorageError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    Ok(out)
}
