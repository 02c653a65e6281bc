//! Glyph metrics for text fitting.
//!
//! Layout must measure with the face the composer draws with; see
//! [`Composer::metrics`](crate::Composer::metrics).

use ab_glyph::{Font, FontArc, FontVec, GlyphId, PxScale, ScaleFont};
use journal_core::{AdvanceMeasure, TextMeasure};

use crate::error::{RenderError, RenderResult};

/// Kerned advance widths from a loaded font.
#[derive(Clone)]
pub struct GlyphMeasure {
    font: FontArc,
}

impl std::fmt::Debug for GlyphMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphMeasure")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl GlyphMeasure {
    /// Parse a TrueType/OpenType font.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a font.
    pub fn from_bytes(data: Vec<u8>) -> RenderResult<Self> {
        let font = FontArc::try_from_vec(data).map_err(|e| RenderError::Font(e.to_string()))?;
        Ok(Self { font })
    }

    /// Parse face `index` of a font file or collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the data holds no such face.
    pub fn from_face(data: &[u8], index: u32) -> RenderResult<Self> {
        let font = FontVec::try_from_vec_and_index(data.to_vec(), index)
            .map_err(|e| RenderError::Font(e.to_string()))?;
        Ok(Self {
            font: FontArc::new(font),
        })
    }
}

impl TextMeasure for GlyphMeasure {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(font_size));
        let mut width = 0.0;
        let mut prev: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = prev {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        width
    }
}

/// Metrics used for layout: the configured font, or a fixed advance.
#[derive(Debug, Clone)]
pub enum PageMetrics {
    /// Glyph-accurate metrics.
    Glyph(GlyphMeasure),
    /// Font-less estimate.
    Fallback(AdvanceMeasure),
}

impl PageMetrics {
    /// Whether glyph metrics are unavailable.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

impl Default for PageMetrics {
    fn default() -> Self {
        Self::Fallback(AdvanceMeasure::default())
    }
}

impl TextMeasure for PageMetrics {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        match self {
            Self::Glyph(m) => m.measure(text, font_size),
            Self::Fallback(m) => m.measure(text, font_size),
        }
    }
}
