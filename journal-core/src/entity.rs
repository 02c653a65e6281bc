//! Movable page objects: stickers and freeflow photo placements.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{ImageKey, ImageSource};
use crate::geometry::{normalize_degrees, Point, Rect, Size};

/// No side of a manipulated object may shrink below this.
pub const MIN_ENTITY_SIZE: f32 = 40.0;
/// No side may grow beyond this fraction of the page dimension.
pub const MAX_RELATIVE_SIZE: f32 = 0.95;
/// Longest side of a newly added sticker when no target size is given.
pub const DEFAULT_STICKER_EDGE: f32 = 220.0;
/// Width of a newly placed freeflow photo.
pub const DEFAULT_PLACEMENT_WIDTH: f32 = 360.0;

/// Unique identifier for a sticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StickerId(Uuid);

impl StickerId {
    /// Create a new unique sticker ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for StickerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StickerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything the gesture engine can manipulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityId {
    /// A decorative sticker.
    Sticker(StickerId),
    /// The freeflow placement of `DocumentState::images[index]`.
    Image(usize),
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sticker(id) => write!(f, "sticker:{id}"),
            Self::Image(index) => write!(f, "image:{index}"),
        }
    }
}

/// Size limits on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimits {
    /// Minimum side length.
    pub min: f32,
    /// Maximum width and height.
    pub max: Size,
}

impl SizeLimits {
    /// Limits for a page of the given size.
    #[must_use]
    pub fn for_page(page: Size) -> Self {
        Self {
            min: MIN_ENTITY_SIZE,
            max: page.scaled(MAX_RELATIVE_SIZE),
        }
    }

    /// Clamp a uniform scale of `base` so both sides stay within limits.
    ///
    /// When the limits cannot both hold for this aspect ratio the ceiling wins.
    #[must_use]
    pub fn clamp_scale(&self, base: Size, scale: f32) -> f32 {
        let w = base.width.max(f32::EPSILON);
        let h = base.height.max(f32::EPSILON);
        let lower = (self.min / w).max(self.min / h);
        let upper = (self.max.width / w).min(self.max.height / h);
        let scale = if scale.is_finite() { scale } else { 1.0 };
        scale.clamp(lower.min(upper), upper)
    }

    /// Clamp a size, preserving its aspect ratio.
    #[must_use]
    pub fn clamp_size(&self, size: Size) -> Size {
        size.scaled(self.clamp_scale(size, 1.0))
    }
}

/// A decorative image the user can move, resize and rotate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerEntity {
    /// Unique identifier.
    pub id: StickerId,
    /// Where the image comes from; re-resolved after reload.
    pub source: ImageSource,
    /// Top-left corner of the unrotated box.
    pub position: Point,
    /// Drawn size.
    pub size: Size,
    /// Rotation in degrees around the centre.
    pub rotation: f32,
    /// Stacking key; higher draws later.
    pub z: i64,
    /// Pixel dimensions of the original image.
    pub natural_size: Size,
}

impl StickerEntity {
    /// Create a sticker centred on the page.
    ///
    /// The natural size is fitted into `target` (or a default square) and
    /// clamped to the page limits.
    #[must_use]
    pub fn new(source: ImageSource, natural_size: Size, target: Option<Size>, page: Size) -> Self {
        let bounds = target.unwrap_or(Size::new(DEFAULT_STICKER_EDGE, DEFAULT_STICKER_EDGE));
        let size = SizeLimits::for_page(page).clamp_size(natural_size.fit_within(bounds));
        let center = Point::new(page.width / 2.0, page.height / 2.0);
        Self {
            id: StickerId::new(),
            source,
            position: Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0),
            size,
            rotation: 0.0,
            z: 0,
            natural_size,
        }
    }

    /// Arena key of the sticker's image.
    #[must_use]
    pub fn image_key(&self) -> ImageKey {
        self.source.key()
    }

    /// Unrotated bounds.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_origin(self.position, self.size)
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Rotation normalised into `[0, 360)`.
    #[must_use]
    pub fn normalized_rotation(&self) -> f32 {
        normalize_degrees(self.rotation)
    }

    /// Resize around the current centre.
    pub fn set_size_centered(&mut self, size: Size) {
        let center = self.center();
        self.size = size;
        self.position = Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0);
    }
}

/// A photo placed freely on a freeflow page. Never rotated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeImagePlacement {
    /// Index into `DocumentState::images`.
    pub image_index: usize,
    /// Top-left corner.
    pub position: Point,
    /// Drawn size; `width / height == aspect` after every resize.
    pub size: Size,
    /// Natural width / height of the source image.
    pub aspect: f32,
}

impl FreeImagePlacement {
    /// Place a photo with its top-left at `origin`, fitted to the page.
    #[must_use]
    pub fn new(image_index: usize, natural_size: Size, origin: Point, page: Size) -> Self {
        let aspect = natural_size.aspect();
        let max_width = (page.width - origin.x).max(MIN_ENTITY_SIZE);
        let max_height = (page.height - origin.y).max(MIN_ENTITY_SIZE);
        let width = DEFAULT_PLACEMENT_WIDTH
            .min(max_width)
            .min(max_height * aspect)
            .max(MIN_ENTITY_SIZE);
        Self {
            image_index,
            position: origin,
            size: Size::new(width, width / aspect),
            aspect,
        }
    }

    /// Bounds of the photo.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_origin(self.position, self.size)
    }

    /// Set the width, deriving the height from the aspect ratio.
    pub fn set_width(&mut self, width: f32) {
        self.size = Size::new(width, width / self.aspect);
    }

    /// Check a placement read from storage.
    ///
    /// A missing or degenerate aspect is recomputed from the size. Returns
    /// `None` when the geometry itself is unusable.
    #[must_use]
    pub fn validated(mut self) -> Option<Self> {
        let size_ok = self.size.width.is_finite()
            && self.size.height.is_finite()
            && self.size.width > f32::EPSILON
            && self.size.height > f32::EPSILON;
        if !size_ok || !self.position.x.is_finite() || !self.position.y.is_finite() {
            return None;
        }
        if !self.aspect.is_finite() || self.aspect <= f32::EPSILON {
            self.aspect = self.size.width / self.size.height;
        }
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: Size = Size::new(1240.0, 1754.0);

    #[test]
    fn test_new_sticker_is_centered_and_fitted() {
        let sticker = StickerEntity::new(
            ImageSource::new("star.png"),
            Size::new(800.0, 400.0),
            None,
            PAGE,
        );
        assert!((sticker.size.width - 220.0).abs() < 1e-3);
        assert!((sticker.size.height - 110.0).abs() < 1e-3);
        let c = sticker.center();
        assert!((c.x - 620.0).abs() < 1e-3);
        assert!((c.y - 877.0).abs() < 1e-3);
    }

    #[test]
    fn test_tiny_sticker_is_clamped_to_minimum() {
        let sticker = StickerEntity::new(
            ImageSource::new("dot.png"),
            Size::new(4.0, 4.0),
            Some(Size::new(4.0, 4.0)),
            PAGE,
        );
        assert!(sticker.size.width >= MIN_ENTITY_SIZE - 1e-3);
        assert!(sticker.size.height >= MIN_ENTITY_SIZE - 1e-3);
    }

    #[test]
    fn test_clamp_scale_respects_ceiling() {
        let limits = SizeLimits::for_page(PAGE);
        let scale = limits.clamp_scale(Size::new(400.0, 300.0), 100.0);
        let size = Size::new(400.0, 300.0).scaled(scale);
        assert!(size.width <= PAGE.width * MAX_RELATIVE_SIZE + 1e-3);
        assert!(size.height <= PAGE.height * MAX_RELATIVE_SIZE + 1e-3);
    }

    #[test]
    fn test_clamp_scale_handles_non_finite() {
        let limits = SizeLimits::for_page(PAGE);
        let scale = limits.clamp_scale(Size::new(100.0, 100.0), f32::NAN);
        assert!((scale - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_placement_keeps_aspect() {
        let placement =
            FreeImagePlacement::new(0, Size::new(1600.0, 900.0), Point::new(100.0, 100.0), PAGE);
        assert!((placement.size.aspect() - 16.0 / 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_aspect_is_recomputed() {
        let mut placement =
            FreeImagePlacement::new(0, Size::new(400.0, 200.0), Point::new(10.0, 10.0), PAGE);
        placement.aspect = 0.0;
        let fixed = placement.clone().validated().expect("size is usable");
        assert!((fixed.aspect - 2.0).abs() < 1e-4);

        placement.aspect = f32::NAN;
        let mut fixed = placement.clone().validated().expect("size is usable");
        fixed.set_width(300.0);
        assert!((fixed.size.height - 150.0).abs() < 1e-3);

        placement.size = Size::new(f32::INFINITY, 10.0);
        assert!(placement.validated().is_none());
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId::Image(2).to_string(), "image:2");
    }
}
