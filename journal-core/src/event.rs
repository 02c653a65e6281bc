//! Input events for page interaction.
//!
//! Coordinates are page pixels; the host maps screen space through
//! [`PageViewport`] before forwarding events.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Kind of device behind a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    /// Mouse or trackpad.
    Mouse,
    /// Finger or stylus.
    Touch,
}

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed / finger down.
    Down,
    /// Pointer moved.
    Move,
    /// Button released / finger up.
    Up,
    /// Pointer left the drawing surface.
    Leave,
    /// The platform cancelled the interaction.
    Cancel,
}

impl PointerPhase {
    /// Whether this phase ends any gesture in progress.
    #[must_use]
    pub fn ends_gesture(self) -> bool {
        matches!(self, Self::Up | Self::Leave | Self::Cancel)
    }
}

/// A single-pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Event phase.
    pub phase: PointerPhase,
    /// X position in page coordinates.
    pub x: f32,
    /// Y position in page coordinates.
    pub y: f32,
    /// Device kind.
    pub kind: PointerKind,
    /// Timestamp in milliseconds since surface start.
    pub timestamp_ms: u64,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub fn new(phase: PointerPhase, x: f32, y: f32, kind: PointerKind, timestamp_ms: u64) -> Self {
        Self {
            phase,
            x,
            y,
            kind,
            timestamp_ms,
        }
    }

    /// Position as a point.
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Phase of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    /// Touch started (finger down).
    Start,
    /// Touch moved (finger dragging).
    Move,
    /// Touch ended (finger up).
    End,
    /// Touch cancelled (e.g., palm rejection).
    Cancel,
}

/// A single touch point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Touch identifier (for multi-touch).
    pub id: u32,
    /// X position in page coordinates.
    pub x: f32,
    /// Y position in page coordinates.
    pub y: f32,
}

impl TouchPoint {
    /// Position as a point.
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A touch event with one or more touch points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    /// Phase of this touch event.
    pub phase: TouchPhase,
    /// All current touch points.
    pub touches: Vec<TouchPoint>,
    /// Timestamp in milliseconds since surface start.
    pub timestamp_ms: u64,
}

impl TouchEvent {
    /// Create a new touch event.
    #[must_use]
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>, timestamp_ms: u64) -> Self {
        Self {
            phase,
            touches,
            timestamp_ms,
        }
    }

    /// Get the primary (first) touch point.
    #[must_use]
    pub fn primary_touch(&self) -> Option<&TouchPoint> {
        self.touches.first()
    }

    /// Check if this is a multi-touch event.
    #[must_use]
    pub fn is_multi_touch(&self) -> bool {
        self.touches.len() > 1
    }

    /// Angle in degrees of the line from the first to the second finger.
    #[must_use]
    pub fn finger_angle(&self) -> Option<f32> {
        match self.touches.as_slice() {
            [a, b, ..] => Some(a.position().angle_to(b.position())),
            _ => None,
        }
    }

    /// The primary touch expressed as a pointer event.
    #[must_use]
    pub fn as_pointer(&self) -> Option<PointerEvent> {
        let phase = match self.phase {
            TouchPhase::Start => PointerPhase::Down,
            TouchPhase::Move => PointerPhase::Move,
            TouchPhase::End => PointerPhase::Up,
            TouchPhase::Cancel => PointerPhase::Cancel,
        };
        let (x, y) = match self.primary_touch() {
            Some(t) => (t.x, t.y),
            // a lifted last finger carries no points, but still ends the gesture
            None if phase.ends_gesture() => (0.0, 0.0),
            None => return None,
        };
        Some(PointerEvent::new(phase, x, y, PointerKind::Touch, self.timestamp_ms))
    }
}

/// All input events the page can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Mouse or single-pointer event.
    Pointer(PointerEvent),
    /// Raw (possibly multi-) touch event.
    Touch(TouchEvent),
}

impl InputEvent {
    /// Timestamp of the event.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            Self::Pointer(p) => p.timestamp_ms,
            Self::Touch(t) => t.timestamp_ms,
        }
    }
}

/// Mapping from surface (screen) pixels to page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageViewport {
    /// Surface pixels per page pixel.
    pub scale: f32,
    /// Surface position of the page origin.
    pub offset: Point,
}

impl Default for PageViewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Point::default(),
        }
    }
}

impl PageViewport {
    /// Convert a surface position to page coordinates.
    #[must_use]
    pub fn to_page(&self, x: f32, y: f32) -> Point {
        let scale = if self.scale > f32::EPSILON { self.scale } else { 1.0 };
        Point::new((x - self.offset.x) / scale, (y - self.offset.y) / scale)
    }
}
