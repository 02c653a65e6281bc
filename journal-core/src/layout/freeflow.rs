//! Horizontal space left on a text line once overlapping photos are removed.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::template::TextColumn;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_RATIO: f32 = 1.4;
/// Clearance kept between text and a photo edge.
pub const IMAGE_GAP: f32 = 16.0;
/// Segments narrower than this are not worth setting text in.
pub const MIN_SEGMENT_WIDTH: f32 = 140.0;
/// Obstacles at most this wide may be bridged by joining their neighbours.
pub const JOIN_MAX_OBSTACLE: f32 = 40.0;

/// Where on a line text may be set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSpan {
    /// Left edge of the usable segment.
    pub x: f32,
    /// Usable width; zero means skip the line.
    pub width: f32,
}

impl LineSpan {
    /// A line with no usable space.
    pub const EMPTY: Self = Self { x: 0.0, width: 0.0 };

    /// Whether nothing can be set on this line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0
    }

    fn end(&self) -> f32 {
        self.x + self.width
    }
}

/// Tunables for [`FreeflowWrapper`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeflowWrapper {
    /// Clearance between text and photos.
    pub gap: f32,
    /// Minimum usable segment width.
    pub min_segment: f32,
    /// Widest obstacle that may be bridged.
    pub join_max_obstacle: f32,
    /// Line height ratio used for the vertical band.
    pub line_height_ratio: f32,
}

impl Default for FreeflowWrapper {
    fn default() -> Self {
        Self {
            gap: IMAGE_GAP,
            min_segment: MIN_SEGMENT_WIDTH,
            join_max_obstacle: JOIN_MAX_OBSTACLE,
            line_height_ratio: LINE_HEIGHT_RATIO,
        }
    }
}

impl FreeflowWrapper {
    /// Usable span for the line whose baseline sits at `baseline`.
    #[must_use]
    pub fn available_span(
        &self,
        baseline: f32,
        font_size: f32,
        obstacles: &[Rect],
        column: &TextColumn,
    ) -> LineSpan {
        let half = font_size * self.line_height_ratio / 2.0;
        let (top, bottom) = (baseline - half, baseline + half);

        let mut spans: Vec<(f32, f32)> = obstacles
            .iter()
            .filter(|r| {
                r.overlaps_vertically(top, bottom) && r.overlaps_horizontally(column.left, column.right)
            })
            .map(|r| (r.x.max(column.left), r.right().min(column.right)))
            .collect();
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut merged: Vec<(f32, f32)> = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        if merged.is_empty() {
            let whole = LineSpan {
                x: column.left,
                width: column.width(),
            };
            return if whole.width >= self.min_segment {
                whole
            } else {
                LineSpan::EMPTY
            };
        }

        // segments[i] lies left of merged[i]; the last one lies right of the last obstacle
        let mut segments = Vec::with_capacity(merged.len() + 1);
        let mut cursor = column.left;
        let mut after_obstacle = false;
        for &(start, end) in &merged {
            let seg_start = if after_obstacle { cursor + self.gap } else { cursor };
            segments.push(Self::segment(seg_start, start - self.gap));
            cursor = end;
            after_obstacle = true;
        }
        segments.push(Self::segment(cursor + self.gap, column.right));

        let qualifies = |s: &LineSpan| s.width >= self.min_segment;

        let mut best = segments
            .iter()
            .copied()
            .filter(qualifies)
            .fold(LineSpan::EMPTY, |acc, s| if s.width > acc.width { s } else { acc });

        for (i, &(start, end)) in merged.iter().enumerate() {
            let (left, right) = (segments[i], segments[i + 1]);
            if !qualifies(&left) || !qualifies(&right) || end - start > self.join_max_obstacle {
                continue;
            }
            let union = Self::segment(left.x, right.end());
            if union.width > best.width {
                best = union;
            }
        }

        best
    }

    fn segment(start: f32, end: f32) -> LineSpan {
        LineSpan {
            x: start,
            width: (end - start).max(0.0),
        }
    }
}
