// src/report/mod.rs
pub mod models;
pub mod tables;
pub mod text;

pub use tables::{SidecarTableExtractor, TableExtractor};
