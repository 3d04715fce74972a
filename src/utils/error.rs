// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Could not read page text for document {0}: {1}")]
    TextUnavailable(String, #[source] std::io::Error),

    #[error("Table extraction failed for {path}: {reason}")]
    TableExtraction { path: String, reason: String },

    #[error("Malformed table sidecar {0}: {1}")]
    MalformedSidecar(String, #[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Document index not found: {0}")]
    IndexNotFound(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
