//! Error types for the page renderer.

use journal_core::JournalError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while drawing or exporting a page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An image could not be read or decoded.
    #[error("Resource error: {0}")]
    Resource(String),

    /// A font could not be loaded.
    #[error("Font error: {0}")]
    Font(String),

    /// The SVG intermediate could not be rasterized.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// Encoding or persisting an export failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Page state error.
    #[error(transparent)]
    Core(#[from] JournalError),
}
