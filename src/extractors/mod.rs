// src/extractors/mod.rs
pub mod anchor;
pub mod candidates;
pub mod dedup;
pub mod filters;
pub mod pipeline;
pub mod statement;

// Re-export key extraction types for convenience
pub use statement::StatementKind;
