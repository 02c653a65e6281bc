//! Contracts between the page and the app hosting it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::StickerId;
use crate::geometry::Size;

/// One sticker upload: raw image bytes plus an optional target box.
#[derive(Debug, Clone, PartialEq)]
pub struct StickerUpload {
    /// Encoded image (PNG, JPEG, ...).
    pub bytes: Vec<u8>,
    /// Box the sticker is fitted into; a default square when absent.
    pub target_size: Option<Size>,
}

impl StickerUpload {
    /// Upload with the default target size.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            target_size: None,
        }
    }
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReceipt {
    /// Where the sink stored the file.
    pub location: String,
    /// Raster width in pixels.
    pub width_px: u32,
    /// Raster height in pixels.
    pub height_px: u32,
    /// Size of the document in bytes.
    pub byte_len: usize,
}

/// Imperative control surface offered to the host.
pub trait PageCommands {
    /// Error returned by fallible commands.
    type Error: std::error::Error;

    /// Decode `bytes` and add a sticker centred on the page, on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a decodable image.
    fn add_sticker(
        &mut self,
        bytes: &[u8],
        target_size: Option<Size>,
    ) -> Result<StickerId, Self::Error>;

    /// Add several stickers; each upload succeeds or fails independently.
    fn add_stickers(&mut self, batch: &[StickerUpload]) -> Vec<Result<StickerId, Self::Error>> {
        batch
            .iter()
            .map(|upload| self.add_sticker(&upload.bytes, upload.target_size))
            .collect()
    }

    /// Export the page at print resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering, encoding or persisting fails. The page
    /// stays editable and unchanged.
    fn export(&mut self) -> Result<ExportReceipt, Self::Error>;

    /// Remove every sticker, returning how many were removed.
    fn clear_stickers(&mut self) -> usize;
}

/// Receives finished export files.
pub trait ExportSink {
    /// Persist `bytes` under `file_name`, returning where they went.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the bytes could not be stored.
    fn persist(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<String>;
}

/// Errors from a prompt suggestion service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SuggestError {
    /// The service could not be reached.
    #[error("Suggestion service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with nothing usable.
    #[error("No suggestions returned")]
    Empty,
}

/// Follow-up writing prompts for the current text. Implemented by the host.
pub trait PromptSuggester {
    /// Suggest prompts for `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if no suggestions could be produced.
    fn suggest(&self, text: &str) -> Result<Vec<String>, SuggestError>;
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Something failed; the page is still usable.
    Error,
}

/// A dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text shown to the user.
    pub message: String,
}

impl Notice {
    /// An error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// An informational notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("bad image")]
    struct BadImage;

    #[derive(Default)]
    struct Recorder {
        added: Vec<usize>,
    }

    impl PageCommands for Recorder {
        type Error = BadImage;

        fn add_sticker(&mut self, bytes: &[u8], _: Option<Size>) -> Result<StickerId, BadImage> {
            if bytes.is_empty() {
                return Err(BadImage);
            }
            self.added.push(bytes.len());
            Ok(StickerId::new())
        }

        fn export(&mut self) -> Result<ExportReceipt, BadImage> {
            Err(BadImage)
        }

        fn clear_stickers(&mut self) -> usize {
            std::mem::take(&mut self.added).len()
        }
    }

    #[test]
    fn test_add_stickers_is_per_item() {
        let mut recorder = Recorder::default();
        let batch = vec![
            StickerUpload::new(vec![1, 2, 3]),
            StickerUpload::new(Vec::new()),
            StickerUpload::new(vec![4]),
        ];
        let results = recorder.add_stickers(&batch);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        assert_eq!(recorder.clear_stickers(), 2);
    }

    #[test]
    fn test_notice_constructors() {
        assert_eq!(Notice::error("x").level, NoticeLevel::Error);
        assert_eq!(Notice::info("y").message, "y");
    }
}
