//! Page-space geometry primitives.
//!
//! All coordinates are page pixels with the origin at the top-left corner and
//! Y growing downwards. Rotations are degrees, clockwise on screen.

use serde::{Deserialize, Serialize};

/// A point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Angle in degrees of the vector from `self` to `other`.
    #[must_use]
    pub fn angle_to(self, other: Self) -> f32 {
        (other.y - self.y).atan2(other.x - self.x).to_degrees()
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width divided by height, or 1.0 for a degenerate size.
    #[must_use]
    pub fn aspect(self) -> f32 {
        if self.height > f32::EPSILON && self.width > f32::EPSILON {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Uniformly scale both sides.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    /// Largest size with this aspect ratio that fits inside `bounds`.
    #[must_use]
    pub fn fit_within(self, bounds: Self) -> Self {
        if self.width <= f32::EPSILON || self.height <= f32::EPSILON {
            return bounds;
        }
        let scale = (bounds.width / self.width).min(bounds.height / self.height);
        self.scaled(scale)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle from a top-left point and a size.
    #[must_use]
    pub const fn from_origin(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Rectangle of `size` centred on `center`.
    #[must_use]
    pub fn centered(center: Point, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Size of the rectangle.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether the point lies inside (edges inclusive).
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Whether the vertical extent overlaps `[top, bottom]`.
    #[must_use]
    pub fn overlaps_vertically(&self, top: f32, bottom: f32) -> bool {
        self.y < bottom && self.bottom() > top
    }

    /// Whether the horizontal extent overlaps `[left, right]`.
    #[must_use]
    pub fn overlaps_horizontally(&self, left: f32, right: f32) -> bool {
        self.x < right && self.right() > left
    }

    /// Reflect horizontally inside a page of the given width.
    #[must_use]
    pub fn mirrored(&self, page_width: f32) -> Self {
        Self::new(page_width - self.x - self.width, self.y, self.width, self.height)
    }
}

/// Rotate a point around a centre by the given angle in degrees.
#[must_use]
pub fn rotate_point(point: Point, center: Point, degrees: f32) -> Point {
    let (sin_a, cos_a) = degrees.to_radians().sin_cos();
    let d = point - center;
    Point::new(
        d.x * cos_a - d.y * sin_a + center.x,
        d.x * sin_a + d.y * cos_a + center.y,
    )
}

/// Normalise an angle into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(degrees: f32) -> f32 {
    let r = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_point_quarter_turn() {
        let p = rotate_point(Point::new(10.0, 0.0), Point::new(0.0, 0.0), 90.0);
        assert!(p.x.abs() < 1e-4);
        assert!((p.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_normalize_degrees() {
        assert!((normalize_degrees(370.0) - 10.0).abs() < 1e-4);
        assert!((normalize_degrees(-90.0) - 270.0).abs() < 1e-4);
        assert!(normalize_degrees(720.0).abs() < 1e-4);
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        let fitted = Size::new(400.0, 300.0).fit_within(Size::new(200.0, 200.0));
        assert!((fitted.width - 200.0).abs() < 1e-4);
        assert!((fitted.height - 150.0).abs() < 1e-4);
    }

    #[test]
    fn test_mirrored_rect() {
        let r = Rect::new(80.0, 10.0, 500.0, 20.0).mirrored(1240.0);
        assert!((r.x - 660.0).abs() < 1e-4);
    }
}
