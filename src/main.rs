// src/main.rs
mod batch;
mod config;
mod extractors;
mod report;
mod storage;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use batch::BatchOptions;
use config::DataLayout;
use extractors::StatementKind;
use report::{SidecarTableExtractor, TableExtractor};
use storage::StorageManager;
use utils::AppError;

/// Command Line Interface for the annual report table extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data directory holding pdf_info.json and pdf_docs/ (falls back to FINSTATE_DATA_DIR, then ./data)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Statement types to extract (default: all, in fixed order)
    #[arg(short, long, value_enum)]
    statement: Vec<StatementKind>,

    /// Maximum number of documents processed concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Remove existing per-document outputs before extracting
    #[arg(long)]
    clean: bool,

    /// Skip extraction and only rebuild the merged aggregates
    #[arg(long)]
    merge_only: bool,

    /// Debug mode - save per-stage candidate dumps next to each output
    #[arg(long)]
    debug: bool,

    /// Also append logs to <LOG_DIR>/<YYYYMMDD>.extract.log
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.log_dir.as_deref())?;
    tracing::info!("Starting processing for args: {:?}", args);

    // 3. Resolve configuration
    let data_dir = config::resolve_data_dir(args.data_dir.clone());
    if !data_dir.is_dir() {
        return Err(AppError::Config(format!("Data directory {} does not exist", data_dir.display())));
    }
    let statements = if args.statement.is_empty() {
        StatementKind::ALL.to_vec()
    } else {
        args.statement.clone()
    };
    let workers = args.workers.unwrap_or_else(|| {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
    });
    if workers == 0 {
        return Err(AppError::Config("--workers must be at least 1".to_string()));
    }

    // 4. Initialize storage and the table source
    let storage = Arc::new(StorageManager::new(DataLayout::new(&data_dir))?);
    let extractor: Arc<dyn TableExtractor> = Arc::new(SidecarTableExtractor::new());
    let options = BatchOptions { workers, debug: args.debug };

    // 5. One independent pass per statement type
    let mut failure_count = 0;
    for kind in statements {
        if args.merge_only {
            let merged = storage.merge_statement(kind)?;
            tracing::info!("Merged {}: {} of {} documents", kind, merged.merged, merged.documents);
            continue;
        }

        if args.clean {
            let removed = storage.clean_statement(kind)?;
            tracing::info!("Removed {} existing {} outputs", removed, kind);
        }

        let summary = batch::run_statement(kind, Arc::clone(&storage), Arc::clone(&extractor), options).await?;
        if let Some(merged) = &summary.merged {
            tracing::info!("{}: {} of {} documents in the aggregate", merged.statement, merged.merged, merged.documents);
        }
        failure_count += summary.failed;
    }

    tracing::info!("Processing finished. Failures: {}", failure_count);
    Ok(())
}
