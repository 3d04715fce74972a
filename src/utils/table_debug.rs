// src/utils/table_debug.rs
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::report::models::TableCandidate;

/// Per-stage snapshots of the candidate list, written out with `--debug`.
#[derive(Debug, Default)]
pub struct StageTrace {
    enabled: bool,
    stages: Vec<(String, Vec<String>)>,
}

impl StageTrace {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, stages: Vec::new() }
    }

    pub fn record(&mut self, stage: &str, tables: &[TableCandidate]) {
        tracing::debug!("Stage {}: {} tables", stage, tables.len());
        if !self.enabled {
            return;
        }
        let summaries = tables.iter().map(summarize).collect();
        self.stages.push((stage.to_string(), summaries));
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (stage, tables) in &self.stages {
            let _ = writeln!(out, "== {} ({})", stage, tables.len());
            for line in tables {
                let _ = writeln!(out, "  {}", line);
            }
        }
        out
    }

    /// Writes the rendered trace; a no-op when tracing is disabled.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())?;
        tracing::info!("Saved stage trace to {}", path.display());
        Ok(())
    }
}

// page, y, row count and the first row
fn summarize(table: &TableCandidate) -> String {
    let first_row = table
        .cells
        .first()
        .map(|row| row.join("|").replace('\n', ""))
        .unwrap_or_default();
    format!("page {} y {:.1} rows {} | {}", table.page, table.y, table.cells.len(), first_row)
}
