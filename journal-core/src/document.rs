//! The document being composed: date, location, text and photos.
//!
//! The surrounding app owns and mutates this; the core only reads it.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How text and photos are arranged on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Three text regions beside three photo frames.
    #[default]
    FixedGrid,
    /// Same as `FixedGrid` with every region reflected left/right.
    MirroredGrid,
    /// One text column flowing around freely placed photos.
    Freeflow,
}

impl LayoutMode {
    /// Whether this mode uses the fixed three-region grid.
    #[must_use]
    pub fn is_grid(self) -> bool {
        matches!(self, Self::FixedGrid | Self::MirroredGrid)
    }
}

/// Main and shadow text colours as hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextColors {
    /// Colour of the text itself.
    pub main: String,
    /// Colour of the offset duplicate drawn beneath header text.
    pub shadow: String,
}

impl Default for TextColors {
    fn default() -> Self {
        Self {
            main: "#3b2f2f".to_string(),
            shadow: "#d9c7b0".to_string(),
        }
    }
}

/// Where an image comes from: a data URI or a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageSource(String);

impl ImageSource {
    /// Wrap a source string.
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self(src.into())
    }

    /// The raw source string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is an inline `data:` URI.
    #[must_use]
    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// This source with a relative file path resolved under `base`.
    ///
    /// Data URIs, absolute paths and empty sources are returned unchanged.
    #[must_use]
    pub fn relative_to(&self, base: &Path) -> Self {
        if self.is_data_uri() {
            return self.clone();
        }
        let raw = self.0.strip_prefix("file://").unwrap_or(&self.0);
        let path = Path::new(raw);
        if raw.is_empty() || path.is_absolute() {
            return self.clone();
        }
        Self(base.join(path).to_string_lossy().into_owned())
    }

    /// Stable arena key for this source.
    #[must_use]
    pub fn key(&self) -> ImageKey {
        ImageKey::for_source(&self.0)
    }
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_data_uri() {
            // data URIs can be megabytes long
            let head: String = self.0.chars().take(32).collect();
            write!(f, "{head}…")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Stable identifier of a decoded image in the renderer's arena.
///
/// Derived from the source string with FNV-1a so it survives reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageKey(u64);

impl ImageKey {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    /// Key for the given source string.
    #[must_use]
    pub fn for_source(src: &str) -> Self {
        let hash = src.bytes().fold(Self::FNV_OFFSET, |acc, b| {
            (acc ^ u64::from(b)).wrapping_mul(Self::FNV_PRIME)
        });
        Self(hash)
    }
}

impl std::fmt::Display for ImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "img-{:016x}", self.0)
    }
}

/// Everything the user entered for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentState {
    /// Page date, if set.
    pub date: Option<NaiveDate>,
    /// Free-form location label.
    pub location: String,
    /// Text segments, concatenated in order into one body text.
    pub segments: Vec<String>,
    /// Photo sources in the order they were added.
    pub images: Vec<ImageSource>,
    /// Layout mode.
    pub layout: LayoutMode,
    /// Text colours.
    pub colors: TextColors,
}

impl DocumentState {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The body text: non-empty trimmed segments joined by single spaces.
    #[must_use]
    pub fn combined_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Date formatted for the page header, e.g. "March 4, 2024".
    #[must_use]
    pub fn formatted_date(&self) -> Option<String> {
        self.date.map(|d| d.format("%B %-d, %Y").to_string())
    }
}
