//! Page template: ruled lines, text regions, photo frames and header anchors.
//!
//! The template is static data. Per-mode geometry (mirroring, the freeflow
//! column) is derived on demand and never stored back into the document.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::document::{ImageSource, LayoutMode};
use crate::geometry::{Point, Rect, Size};

/// Spacing used when fewer than two slots are defined.
const DEFAULT_LINE_SPACING: f32 = 48.0;

/// Baseline Y coordinates of the ruled lines printed on the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineSlots(Vec<f32>);

impl LineSlots {
    /// Create from explicit baselines (expected ascending).
    #[must_use]
    pub fn new(ys: Vec<f32>) -> Self {
        Self(ys)
    }

    /// Evenly spaced baselines.
    #[must_use]
    pub fn uniform(first: f32, spacing: f32, count: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        Self((0..count).map(|i| first + spacing * i as f32).collect())
    }

    /// Number of defined slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no slots are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gap between the first two baselines.
    #[must_use]
    pub fn spacing(&self) -> f32 {
        match self.0.as_slice() {
            [a, b, ..] if b > a => b - a,
            _ => DEFAULT_LINE_SPACING,
        }
    }

    /// Baseline of slot `index`, extending below the last entry at
    /// [`spacing`](Self::spacing).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn y_at(&self, index: usize) -> f32 {
        if let Some(y) = self.0.get(index) {
            return *y;
        }
        match self.0.last() {
            Some(last) => last + self.spacing() * (index + 1 - self.0.len()) as f32,
            None => DEFAULT_LINE_SPACING * (index + 1) as f32,
        }
    }
}

/// One text region: a rectangle plus the ruled lines it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    /// Bounds of the region.
    pub rect: Rect,
    /// Contiguous slot indices assigned to this region.
    pub slots: Range<usize>,
}

impl TextRegion {
    /// Width available for text once padding is removed.
    #[must_use]
    pub fn usable_width(&self, padding: f32) -> f32 {
        (self.rect.width - 2.0 * padding).max(0.0)
    }

    /// Left edge of text inside the region.
    #[must_use]
    pub fn text_left(&self, padding: f32) -> f32 {
        self.rect.x + padding
    }
}

/// Anchor and size for a single line of header text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeaderText {
    /// Baseline start point.
    pub anchor: Point,
    /// Font size in pixels.
    pub font_size: f32,
}

/// Horizontal extent and bottom limit of the freeflow text column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextColumn {
    /// Left edge of the column.
    pub left: f32,
    /// Right edge of the column.
    pub right: f32,
    /// No baseline may be placed below this Y.
    pub bottom: f32,
}

impl TextColumn {
    /// Column width.
    #[must_use]
    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }
}

/// The fixed page template the document is drawn over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTemplate {
    /// Page size in pixels.
    pub size: Size,
    /// Ruled lines.
    pub line_slots: LineSlots,
    /// Text regions in snake order, as laid out in `FixedGrid` mode.
    pub regions: Vec<TextRegion>,
    /// Photo frames for the first images in grid modes.
    pub photo_slots: Vec<Rect>,
    /// Date header placement.
    pub date: HeaderText,
    /// Location header placement.
    pub location: HeaderText,
    /// Tap target for the location label.
    pub location_area: Rect,
    /// Background artwork; `None` draws the fallback fill only.
    pub background: Option<ImageSource>,
    /// Flat fill used when the background is missing or fails to load.
    pub fallback_fill: String,
    /// Horizontal padding inside text regions.
    pub text_padding: f32,
    /// Freeflow text column.
    pub column: TextColumn,
}

impl PageTemplate {
    /// Text regions for the given mode, in snake order.
    ///
    /// Freeflow yields a single virtual region covering the column.
    #[must_use]
    pub fn regions(&self, mode: LayoutMode) -> Vec<TextRegion> {
        match mode {
            LayoutMode::FixedGrid => self.regions.clone(),
            LayoutMode::MirroredGrid => self
                .regions
                .iter()
                .map(|r| TextRegion {
                    rect: r.rect.mirrored(self.size.width),
                    slots: r.slots.clone(),
                })
                .collect(),
            LayoutMode::Freeflow => vec![self.freeflow_region()],
        }
    }

    /// Photo frames for the given mode; empty in freeflow.
    #[must_use]
    pub fn photo_slots(&self, mode: LayoutMode) -> Vec<Rect> {
        match mode {
            LayoutMode::FixedGrid => self.photo_slots.clone(),
            LayoutMode::MirroredGrid => self
                .photo_slots
                .iter()
                .map(|r| r.mirrored(self.size.width))
                .collect(),
            LayoutMode::Freeflow => Vec::new(),
        }
    }

    /// The single region used for freeflow font fitting.
    #[must_use]
    pub fn freeflow_region(&self) -> TextRegion {
        let spacing = self.line_slots.spacing();
        let top = self.line_slots.y_at(0) - spacing;
        TextRegion {
            // padding is applied by the fitter, so widen by it here
            rect: Rect::new(
                self.column.left - self.text_padding,
                top,
                self.column.width() + 2.0 * self.text_padding,
                (self.column.bottom - top).max(0.0),
            ),
            slots: 0..self.line_slots.len(),
        }
    }
}

impl Default for PageTemplate {
    fn default() -> Self {
        let spacing = 48.0;
        let per_region = 7;
        let band_starts = [340.0_f32, 780.0, 1220.0];
        let ys: Vec<f32> = band_starts
            .iter()
            .flat_map(|start| LineSlots::uniform(*start, spacing, per_region).0)
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let band_height = spacing * per_region as f32;
        let left = Rect::new(80.0, 0.0, 500.0, band_height);
        let right = Rect::new(620.0, 0.0, 540.0, band_height);

        let mut regions = Vec::with_capacity(3);
        let mut photo_slots = Vec::with_capacity(3);
        for (i, start) in band_starts.iter().enumerate() {
            let top = start - spacing;
            // snake: text right, left, right; photos opposite
            let (text, photo) = if i % 2 == 0 { (right, left) } else { (left, right) };
            regions.push(TextRegion {
                rect: Rect::new(text.x, top, text.width, text.height),
                slots: i * per_region..(i + 1) * per_region,
            });
            photo_slots.push(Rect::new(photo.x, top, photo.width, photo.height));
        }

        Self {
            size: Size::new(1240.0, 1754.0),
            line_slots: LineSlots::new(ys),
            regions,
            photo_slots,
            date: HeaderText {
                anchor: Point::new(80.0, 150.0),
                font_size: 44.0,
            },
            location: HeaderText {
                anchor: Point::new(80.0, 210.0),
                font_size: 32.0,
            },
            location_area: Rect::new(80.0, 176.0, 700.0, 48.0),
            background: None,
            fallback_fill: "#fbf6ee".to_string(),
            text_padding: 16.0,
            column: TextColumn {
                left: 80.0,
                right: 1160.0,
                bottom: 1654.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_has_21_slots_split_7_7_7() {
        let template = PageTemplate::default();
        assert_eq!(template.line_slots.len(), 21);
        let ranges: Vec<_> = template.regions.iter().map(|r| r.slots.clone()).collect();
        assert_eq!(ranges, vec![0..7, 7..14, 14..21]);
    }

    #[test]
    fn test_line_slots_extend_with_first_gap() {
        let slots = LineSlots::new(vec![100.0, 130.0, 170.0]);
        assert!((slots.y_at(2) - 170.0).abs() < f32::EPSILON);
        assert!((slots.y_at(3) - 200.0).abs() < f32::EPSILON);
        assert!((slots.y_at(5) - 260.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_line_slots_are_usable() {
        let slots = LineSlots::new(Vec::new());
        assert!(slots.y_at(0) > 0.0);
        assert!(slots.y_at(1) > slots.y_at(0));
    }

    #[test]
    fn test_mirrored_regions_keep_snake_order() {
        let template = PageTemplate::default();
        let fixed = template.regions(LayoutMode::FixedGrid);
        let mirrored = template.regions(LayoutMode::MirroredGrid);
        for (a, b) in fixed.iter().zip(&mirrored) {
            assert_eq!(a.slots, b.slots);
            assert!((a.rect.y - b.rect.y).abs() < f32::EPSILON);
            assert!((b.rect.x - (1240.0 - a.rect.x - a.rect.width)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_freeflow_has_single_region_and_no_photo_slots() {
        let template = PageTemplate::default();
        assert_eq!(template.regions(LayoutMode::Freeflow).len(), 1);
        assert!(template.photo_slots(LayoutMode::Freeflow).is_empty());
        let region = template.freeflow_region();
        assert!((region.usable_width(template.text_padding) - 1080.0).abs() < 1e-3);
    }
}
