//! Error types for the export pipeline.
//!
//! Normalization and composition never fail: malformed response text degrades
//! to plain paragraphs. Only the rendering engine and the export orchestrator
//! driving it produce errors.

use thiserror::Error;

/// Result alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Failures raised by a rendering engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine configuration is out of range (quality, scale, margins).
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// The composed document could not be laid out.
    #[error("Layout failed: {0}")]
    Layout(String),

    /// The engine refused the document content.
    #[error("Document rejected by rendering engine: {0}")]
    Rejected(String),

    /// A stamp targeted a page that does not exist.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// Serialising the paginated artifact failed.
    #[error("Serialisation failed: {0}")]
    Serialize(String),
}

/// Failures surfaced to the caller of an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Export was requested before any survey response was received.
    #[error("No survey response available; collect the survey answers first")]
    MissingInput,

    /// The rendering engine rejected or failed on the document.
    #[error("Rendering failed: {0}")]
    Render(#[from] EngineError),

    /// The rendered artifact refused a page-number stamp.
    #[error("Page stamping failed: {0}")]
    Stamp(EngineError),

    /// The orchestrator already failed and must be reset before retrying.
    #[error("Export pipeline is in the failed state; reset it before retrying")]
    AlreadyFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EngineError::PageOutOfRange { page: 7, total: 4 };
        assert_eq!(
            err.to_string(),
            "Page 7 is out of range (document has 4 pages)"
        );

        let err = ExportError::MissingInput;
        assert!(err.to_string().starts_with("No survey response"));
    }

    #[test]
    fn engine_error_converts_to_render() {
        let err: ExportError = EngineError::Rejected("unsupported".into()).into();
        assert!(matches!(err, ExportError::Render(EngineError::Rejected(_))));
    }
}
