//! Error types for editor commands.

use crate::shapes::{ShapeId, ShapeType};
use thiserror::Error;

/// Errors reported by explicit editor commands.
///
/// Interactive gestures never surface these; they cancel and return to idle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("Shape not found: {0}")]
    InvalidReference(ShapeId),
    #[error("Unknown port '{port}' on shape {shape_id}")]
    UnknownPort { shape_id: ShapeId, port: String },
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
    #[error("Nothing to undo")]
    HistoryUnderflow,
    #[error("Nothing to redo")]
    HistoryOverflow,
    #[error("Shape type {0:?} cannot be added without references")]
    UnsupportedShapeType(ShapeType),
    #[error("Export format not supported: {0}")]
    UnsupportedExport(String),
    #[error("Export failed: {0}")]
    Export(String),
}

/// Result type for editor commands.
pub type EditorResult<T> = Result<T, EditorError>;

impl From<serde_json::Error> for EditorError {
    fn from(err: serde_json::Error) -> Self {
        EditorError::MalformedDocument(err.to_string())
    }
}
