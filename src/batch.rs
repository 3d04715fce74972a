// src/batch.rs
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::extractors::pipeline::extract_statement_tables;
use crate::extractors::statement::StatementKind;
use crate::report::models::DocumentInfo;
use crate::report::tables::TableExtractor;
use crate::report::text::load_document;
use crate::storage::{MergeSummary, StorageManager};
use crate::utils::error::AppError;
use crate::utils::table_debug::StageTrace;

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub workers: usize,
    pub debug: bool,
}

/// Counts for one statement over the whole corpus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub documents: usize,
    pub anchored: usize,
    pub written: usize,
    pub failed: usize,
    pub merged: Option<MergeSummary>,
}

#[derive(Debug)]
struct DocumentOutcome {
    anchored: bool,
}

/// Extracts one statement for every indexed document, then merges the outputs.
///
/// Documents run concurrently on the blocking pool, at most `workers` at a time.
/// A failing document is logged and counted; it never stops the batch.
pub async fn run_statement(
    kind: StatementKind,
    storage: Arc<StorageManager>,
    extractor: Arc<dyn TableExtractor>,
    options: BatchOptions,
) -> Result<BatchSummary, AppError> {
    let index = storage.load_document_index()?;
    tracing::info!("Extracting {} for {} documents with {} workers", kind, index.len(), options.workers);

    let semaphore = Arc::new(Semaphore::new(options.workers.max(1)));
    let mut tasks = JoinSet::new();
    for (key, info) in index {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| AppError::Config(format!("worker pool closed: {}", e)))?;
        let storage = Arc::clone(&storage);
        let extractor = Arc::clone(&extractor);
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let result = process_document(kind, &storage, extractor.as_ref(), &key, &info, options.debug);
            (key, result)
        });
    }

    let mut summary = BatchSummary::default();
    while let Some(joined) = tasks.join_next().await {
        summary.documents += 1;
        match joined {
            Ok((_, Ok(outcome))) => {
                summary.written += 1;
                if outcome.anchored {
                    summary.anchored += 1;
                }
            }
            Ok((key, Err(e))) => {
                tracing::error!("Failed to extract {} for {}: {}", kind, key, e);
                summary.failed += 1;
            }
            Err(e) => {
                tracing::error!("Worker task for {} panicked: {}", kind, e);
                summary.failed += 1;
            }
        }
    }

    // Merge only after every worker has finished.
    let merge_storage = Arc::clone(&storage);
    let merged = tokio::task::spawn_blocking(move || merge_storage.merge_statement(kind)).await??;
    summary.merged = Some(merged);

    tracing::info!(
        "{} finished. Documents: {}, anchored: {}, written: {}, failures: {}",
        kind,
        summary.documents,
        summary.anchored,
        summary.written,
        summary.failed
    );
    Ok(summary)
}

fn process_document(
    kind: StatementKind,
    storage: &StorageManager,
    extractor: &dyn TableExtractor,
    key: &str,
    info: &DocumentInfo,
    debug: bool,
) -> Result<DocumentOutcome, AppError> {
    let layout = storage.layout();
    let document = load_document(key, &layout.pure_text_path(key));
    let pdf_path = layout.resolve_pdf_path(&info.pdf_path);

    let mut trace = StageTrace::new(debug);
    let result = extract_statement_tables(&document, &pdf_path, kind.spec(), extractor, &mut trace);
    storage.save_tables(key, kind, &result.tables)?;

    if trace.is_enabled() {
        if let Err(e) = trace.save(&layout.debug_path(key, kind)) {
            tracing::warn!("Failed to save stage trace for {}: {}", key, e);
        }
    }
    Ok(DocumentOutcome { anchored: result.anchor_page.is_some() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataLayout;
    use crate::report::models::TableCandidate;
    use crate::report::tables::SidecarTableExtractor;
    use std::fs;
    use std::path::Path;

    fn write_text(layout: &DataLayout, key: &str, records: &[(u32, &str)]) {
        let path = layout.pure_text_path(key);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let lines: Vec<String> = records
            .iter()
            .map(|(page, text)| serde_json::json!({"page": page, "text": text}).to_string())
            .collect();
        fs::write(path, lines.join("\n")).unwrap();
    }

    fn write_sidecar(pdf: &Path, content: &str) {
        fs::write(SidecarTableExtractor::sidecar_path(pdf), content).unwrap();
    }

    #[test]
    fn test_parse_failure_leaves_document_out_of_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        fs::write(
            layout.pdf_info_path(),
            r#"{"good": {"pdf_path": "good.pdf"}, "bad": {"pdf_path": "bad.pdf"}}"#,
        )
        .unwrap();

        let page_42 = "一、公司信息\n公司简介\n股票简称 某某\n股票代码 600000\n法定代表人 张三";
        for key in ["good", "bad"] {
            write_text(&layout, key, &[(41, "重要提示"), (42, page_42), (43, "联系人")]);
        }
        write_sidecar(
            &dir.path().join("good.pdf"),
            r#"[{"page": 42, "y": 600.0, "cells": [["股票简称", "某某"], ["股票代码", "600000"]]}]"#,
        );
        write_sidecar(&dir.path().join("bad.pdf"), "%PDF-garbage");

        let storage = Arc::new(StorageManager::new(layout.clone()).unwrap());
        let extractor: Arc<dyn TableExtractor> = Arc::new(SidecarTableExtractor::new());
        let options = BatchOptions { workers: 2, debug: true };
        let summary = tokio_test::block_on(run_statement(StatementKind::BasicInfo, storage, extractor, options)).unwrap();

        assert_eq!(summary.documents, 2);
        assert_eq!(summary.anchored, 2);
        assert_eq!(summary.written, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.merged.as_ref().map(|m| m.merged), Some(1));

        assert_eq!(fs::read_to_string(layout.table_path("bad", StatementKind::BasicInfo)).unwrap(), "");
        assert_eq!(
            fs::read_to_string(layout.table_path("good", StatementKind::BasicInfo)).unwrap(),
            "page|42\n股票简称|某某\n股票代码|600000\n"
        );
        assert!(layout.debug_path("good", StatementKind::BasicInfo).exists());

        let merged: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(layout.merged_path(StatementKind::BasicInfo)).unwrap()).unwrap();
        assert!(merged.get("good").is_some());
        assert!(merged.get("bad").is_none());
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        fs::write(layout.pdf_info_path(), r#"{"doc": {"pdf_path": "doc.pdf"}}"#).unwrap();
        write_text(&layout, "doc", &[(7, "研发投入\n研发人员数量（人） 120"), (9, "第五节 环境和社会责任")]);
        let tables = vec![
            TableCandidate::new(8, 100.0, vec![vec!["研发人员数量".into(), "120".into()]]),
            TableCandidate::new(7, 200.0, vec![vec!["研发人员数量占比".into(), "10%".into()]]),
        ];
        let sidecar: Vec<_> = tables
            .iter()
            .map(|t| serde_json::json!({"page": t.page, "y": t.y, "cells": t.cells}))
            .collect();
        write_sidecar(&dir.path().join("doc.pdf"), &serde_json::to_string(&sidecar).unwrap());

        let storage = Arc::new(StorageManager::new(layout.clone()).unwrap());
        let extractor: Arc<dyn TableExtractor> = Arc::new(SidecarTableExtractor::new());
        let options = BatchOptions { workers: 1, debug: false };

        let mut outputs = Vec::new();
        for _ in 0..2 {
            tokio_test::block_on(run_statement(
                StatementKind::RndHeadcount,
                Arc::clone(&storage),
                Arc::clone(&extractor),
                options,
            ))
            .unwrap();
            outputs.push(fs::read(layout.table_path("doc", StatementKind::RndHeadcount)).unwrap());
        }
        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(
            String::from_utf8(outputs[0].clone()).unwrap(),
            "page|7\n研发人员数量占比|10%\npage|8\n研发人员数量|120\n"
        );
    }
}
