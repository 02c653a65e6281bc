//! Error types for page operations.

use thiserror::Error;

/// Result type for page operations.
pub type JournalResult<T> = Result<T, JournalError>;

/// Errors that can occur in page operations.
///
/// None of these are fatal: callers degrade to "keep the document editable".
#[derive(Debug, Error)]
pub enum JournalError {
    /// Sticker not found in the transform store.
    #[error("Sticker not found: {0}")]
    StickerNotFound(String),

    /// No free placement exists for the given image index.
    #[error("No placement for image {0}")]
    PlacementNotFound(usize),

    /// Invalid geometry (non-finite or non-positive dimensions).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Snapshot serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    ResourceLoad(String),

    /// The document is not editable.
    #[error("Document is read-only")]
    ReadOnly,
}
