//! Font-size selection and greedy line wrapping.
//!
//! Font size is chosen against a fixed reference text rather than the real
//! content, so typing never makes the page text jump in size. The real text
//! is then wrapped greedily into the template's ruled lines, region by region
//! in snake order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::template::{LineSlots, TextColumn, TextRegion};

use super::freeflow::FreeflowWrapper;
use super::measure::TextMeasure;

/// Word repeated to form the reference text.
pub const REFERENCE_WORD: &str = "memories";
/// How many times the reference word is repeated.
pub const REFERENCE_REPEAT: usize = 98;
/// Total ruled lines available for body text (7 per region).
pub const LINE_BUDGET: usize = 21;
/// Applied to the fitted size to leave breathing room.
pub const READABILITY_MARGIN: f32 = 0.92;

/// Bounds and budget for font fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Smallest allowed font size.
    pub min_font_size: u32,
    /// Largest allowed font size.
    pub max_font_size: u32,
    /// Lines the reference text must fit in.
    pub line_budget: usize,
    /// Multiplier applied after fitting.
    pub readability_margin: f32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_font_size: 18,
            max_font_size: 64,
            line_budget: LINE_BUDGET,
            readability_margin: READABILITY_MARGIN,
        }
    }
}

/// One wrapped line of body text, positioned on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Line content.
    pub text: String,
    /// Left edge.
    pub x: f32,
    /// Baseline.
    pub y: f32,
    /// Measured width.
    pub width: f32,
    /// Width the line was allowed to occupy.
    pub max_width: f32,
}

/// Result of laying out the body text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLayout {
    /// Font size all lines are set at.
    pub font_size: f32,
    /// Lines in reading order.
    pub lines: Vec<TextLine>,
    /// Words (or word fragments) that did not fit on the page.
    pub overflow_words: usize,
}

/// The reference text used for size selection.
#[must_use]
pub fn reference_text() -> String {
    vec![REFERENCE_WORD; REFERENCE_REPEAT].join(" ")
}

/// Largest size in `[min, max]` whose line count stays within `budget`.
///
/// `lines_at` must not decrease as the size grows. Returns `min` when even
/// the smallest size overflows.
pub fn select_font_size(
    min: u32,
    max: u32,
    budget: usize,
    mut lines_at: impl FnMut(u32) -> usize,
) -> u32 {
    let (mut lo, mut hi) = (min, max.max(min));
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if lines_at(mid) <= budget {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    let mut size = lo;
    while size < max && lines_at(size + 1) <= budget {
        size += 1;
    }
    size
}

/// Choose the body font size for the given regions.
///
/// Wraps the reference text at the narrowest region's usable width.
#[must_use]
pub fn fit_font_size(
    regions: &[TextRegion],
    padding: f32,
    config: &FitConfig,
    measure: &dyn TextMeasure,
) -> f32 {
    let narrowest = regions
        .iter()
        .map(|r| r.usable_width(padding))
        .fold(f32::INFINITY, f32::min);
    if !narrowest.is_finite() {
        #[allow(clippy::cast_precision_loss)]
        return config.min_font_size as f32;
    }

    let reference = reference_text();
    let words: Vec<&str> = reference.split_whitespace().collect();
    #[allow(clippy::cast_precision_loss)]
    let size = select_font_size(
        config.min_font_size,
        config.max_font_size,
        config.line_budget,
        |candidate| count_lines(&words, narrowest, candidate as f32, measure),
    );

    #[allow(clippy::cast_precision_loss)]
    let (min, max) = (config.min_font_size as f32, config.max_font_size as f32);
    #[allow(clippy::cast_precision_loss)]
    let scaled = size as f32 * config.readability_margin;
    scaled.clamp(min, max.max(min))
}

/// Lines needed to set all `words` at `width`, or `usize::MAX` if impossible.
#[must_use]
pub fn count_lines(words: &[&str], width: f32, font_size: f32, measure: &dyn TextMeasure) -> usize {
    let mut queue: VecDeque<String> = words.iter().map(|w| (*w).to_string()).collect();
    let mut lines = 0;
    while !queue.is_empty() {
        match fill_line(&mut queue, width, font_size, measure) {
            Some(_) => lines += 1,
            None => return usize::MAX,
        }
    }
    lines
}

/// Take words from the front of `queue` while the line stays within `width`.
///
/// An over-long first word is broken at a character boundary so no line ever
/// exceeds `width`. Returns `None`, consuming nothing, when not even one
/// character fits.
pub fn fill_line(
    queue: &mut VecDeque<String>,
    width: f32,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> Option<String> {
    if width <= 0.0 {
        return None;
    }

    let mut line = String::new();
    while let Some(word) = queue.front() {
        let candidate = if line.is_empty() {
            word.clone()
        } else {
            format!("{line} {word}")
        };
        if measure.measure(&candidate, font_size) <= width {
            line = candidate;
            queue.pop_front();
            continue;
        }
        if line.is_empty() {
            let (head, tail) = split_to_fit(word, width, font_size, measure)?;
            line = head;
            if let Some(front) = queue.front_mut() {
                *front = tail;
            }
        }
        break;
    }

    (!line.is_empty()).then_some(line)
}

/// Longest non-empty prefix of `word` that fits, plus the remainder.
fn split_to_fit(
    word: &str,
    width: f32,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> Option<(String, String)> {
    let mut split_at = None;
    for (idx, ch) in word.char_indices() {
        let end = idx + ch.len_utf8();
        if measure.measure(&word[..end], font_size) <= width {
            split_at = Some(end);
        } else {
            break;
        }
    }
    let end = split_at?;
    Some((word[..end].to_string(), word[end..].to_string()))
}

fn word_queue(text: &str) -> VecDeque<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Wrap `text` into the regions' ruled lines in snake order.
#[must_use]
pub fn layout_regions(
    text: &str,
    regions: &[TextRegion],
    slots: &LineSlots,
    padding: f32,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> TextLayout {
    let mut queue = word_queue(text);
    let mut lines = Vec::new();

    'regions: for region in regions {
        let width = region.usable_width(padding);
        let x = region.text_left(padding);
        for slot in region.slots.clone() {
            if queue.is_empty() {
                break 'regions;
            }
            if let Some(line) = fill_line(&mut queue, width, font_size, measure) {
                lines.push(TextLine {
                    width: measure.measure(&line, font_size),
                    text: line,
                    x,
                    y: slots.y_at(slot),
                    max_width: width,
                });
            }
        }
    }

    TextLayout {
        font_size,
        lines,
        overflow_words: queue.len(),
    }
}

/// Wrap `text` down the freeflow column, around the given photo rectangles.
///
/// Lines whose usable span is empty are skipped without consuming words.
#[must_use]
pub fn layout_freeflow(
    text: &str,
    column: &TextColumn,
    slots: &LineSlots,
    obstacles: &[Rect],
    font_size: f32,
    wrapper: &FreeflowWrapper,
    measure: &dyn TextMeasure,
) -> TextLayout {
    let mut queue = word_queue(text);
    let mut lines = Vec::new();

    let mut index = 0;
    loop {
        let y = slots.y_at(index);
        if queue.is_empty() || y > column.bottom {
            break;
        }
        let span = wrapper.available_span(y, font_size, obstacles, column);
        if !span.is_empty() {
            if let Some(line) = fill_line(&mut queue, span.width, font_size, measure) {
                lines.push(TextLine {
                    width: measure.measure(&line, font_size),
                    text: line,
                    x: span.x,
                    y,
                    max_width: span.width,
                });
            }
        }
        index += 1;
    }

    TextLayout {
        font_size,
        lines,
        overflow_words: queue.len(),
    }
}
