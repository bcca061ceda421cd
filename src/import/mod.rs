//! Bulk employee import: spreadsheet rows → preview (no writes) → confirm.
//!
//! A preview is stored in the [`cache::PreviewCache`] under a random token and
//! replayed row by row on confirm through the same create/edit orchestration a
//! single request uses.

pub mod cache;
pub mod pipeline;
pub mod sheet;

use std::path::PathBuf;

use thiserror::Error;

pub use pipeline::{confirm_import, preview_import, ImportPreview, ImportSummary, PreviewRow, RowAction};
pub use sheet::{read_workbook, SheetRow};

/// Errors from reading a workbook. Row-level problems are never errors here;
/// they surface as `RowAction::Error` rows in the preview.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to open workbook {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("Workbook has no sheets")]
    NoSheet,

    #[error("Failed to read sheet {sheet}: {message}")]
    Sheet { sheet: String, message: String },

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
}
