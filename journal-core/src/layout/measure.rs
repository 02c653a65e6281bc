//! Text measurement seam.
//!
//! Layout never touches fonts directly. The renderer supplies glyph-accurate
//! metrics; [`AdvanceMeasure`] is the font-less fallback.

/// Measures the advance width of a run of text.
pub trait TextMeasure {
    /// Width in pixels of `text` set at `font_size`.
    fn measure(&self, text: &str, font_size: f32) -> f32;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, f32) -> f32,
{
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        self(text, font_size)
    }
}

/// Fixed per-character advance, a stand-in when no font could be loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvanceMeasure {
    /// Advance of one character as a fraction of the font size.
    pub advance_ratio: f32,
}

impl AdvanceMeasure {
    /// Average advance of a proportional serif face.
    pub const SYSTEM_FALLBACK: Self = Self {
        advance_ratio: 0.5,
    };
}

impl Default for AdvanceMeasure {
    fn default() -> Self {
        Self::SYSTEM_FALLBACK
    }
}

impl TextMeasure for AdvanceMeasure {
    #[allow(clippy::cast_precision_loss)]
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * self.advance_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_measure_scales_with_size() {
        let m = AdvanceMeasure::default();
        assert!((m.measure("abcd", 10.0) - 20.0).abs() < f32::EPSILON);
        assert!((m.measure("abcd", 20.0) - 40.0).abs() < f32::EPSILON);
        assert!(m.measure("", 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_closure_measure() {
        let m = |t: &str, s: f32| t.len() as f32 * s;
        assert!((TextMeasure::measure(&m, "ab", 3.0) - 6.0).abs() < f32::EPSILON);
    }
}
