//! One pure pass from page state to a drawable frame plan.
//!
//! [`compute_frame`] is the only place layout is derived. It is re-run on
//! every change; nothing it produces is stored.

use serde::{Deserialize, Serialize};

use crate::document::{DocumentState, ImageKey, ImageSource, LayoutMode};
use crate::entity::EntityId;
use crate::gesture::{affordance_handles, AffordanceHandle};
use crate::geometry::{normalize_degrees, Point, Rect, Size};
use crate::layout::{
    fit_font_size, layout_freeflow, layout_regions, FitConfig, FreeflowWrapper, TextLayout,
    TextMeasure,
};
use crate::store::{EntityFrame, TransformStore};
use crate::template::PageTemplate;

/// Offset of the header text shadow, in page pixels.
pub const SHADOW_OFFSET: f32 = 2.0;

/// Image resampling quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderQuality {
    /// Single-pass resampling for interactive frames.
    Draft,
    /// Two-pass resampling.
    #[default]
    High,
}

/// Interaction state that affects what is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionFlags {
    /// Whether the page accepts edits.
    pub editable: bool,
    /// Rendering for export: never draw affordances.
    pub export_mode: bool,
    /// Image resampling quality.
    pub quality: RenderQuality,
    /// Selected entity, if any.
    pub selected: Option<EntityId>,
}

/// Everything a frame depends on.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    /// Document content.
    pub document: &'a DocumentState,
    /// Sticker and photo geometry.
    pub store: &'a TransformStore,
    /// Page template.
    pub template: &'a PageTemplate,
    /// Interaction flags.
    pub flags: InteractionFlags,
    /// Font fitting bounds.
    pub fit: &'a FitConfig,
    /// Freeflow wrap tunables.
    pub wrapper: &'a FreeflowWrapper,
}

/// How an image fills its rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFit {
    /// Fill the rectangle exactly.
    Stretch,
    /// Largest centred rectangle with the image's aspect ratio.
    Contain,
}

/// Duplicate drawn beneath text at a fixed offset.
#[derive(Debug, Clone, PartialEq)]
pub struct TextShadow {
    /// Offset from the main text.
    pub offset: Point,
    /// Shadow colour.
    pub color: String,
}

/// A single drawing instruction, executed in order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Clear the surface.
    Clear {
        /// Page size.
        size: Size,
    },
    /// Template image, or the flat fallback fill if it cannot be drawn.
    Background {
        /// Template image.
        source: Option<ImageSource>,
        /// Fill colour used when the image is missing.
        fallback: String,
        /// Covered area.
        rect: Rect,
    },
    /// A run of text on a baseline.
    Text {
        /// Content.
        text: String,
        /// Left end of the baseline.
        position: Point,
        /// Font size in pixels.
        font_size: f32,
        /// Fill colour.
        color: String,
        /// Optional offset shadow.
        shadow: Option<TextShadow>,
    },
    /// A photo or sticker.
    Image {
        /// Arena key.
        key: ImageKey,
        /// Source, for resolving on a cache miss.
        source: ImageSource,
        /// Unrotated destination.
        rect: Rect,
        /// Rotation around the centre, in `[0, 360)`.
        rotation: f32,
        /// Fill rule.
        fit: ImageFit,
    },
    /// Selection outline and handles.
    Affordances {
        /// Selected entity.
        id: EntityId,
        /// Its bounds and rotation.
        frame: EntityFrame,
        /// Handles to draw.
        handles: Vec<AffordanceHandle>,
    },
}

/// What a tap on a click area edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum ClickTarget {
    /// Body text region (freeflow has a single one).
    TextRegion(usize),
    /// Photo by document index.
    Image(usize),
    /// The location line.
    Location,
}

/// Host-facing tappable rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickArea {
    /// What the area edits.
    pub target: ClickTarget,
    /// Page-space bounds.
    pub rect: Rect,
}

/// A fully specified frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    /// Page size.
    pub size: Size,
    /// Body text layout.
    pub layout: TextLayout,
    /// Drawing instructions in paint order.
    pub ops: Vec<DrawOp>,
    /// Tappable areas for the host.
    pub click_areas: Vec<ClickArea>,
    /// Resampling quality for images.
    pub quality: RenderQuality,
}

/// Derive the frame for the given inputs.
#[must_use]
pub fn compute_frame(inputs: &FrameInputs<'_>, measure: &dyn TextMeasure) -> FramePlan {
    let FrameInputs {
        document,
        store,
        template,
        flags,
        fit,
        wrapper,
    } = *inputs;
    let mode = document.layout;
    let regions = template.regions(mode);
    let text = document.combined_text();

    let font_size = fit_font_size(&regions, template.text_padding, fit, measure);
    let layout = match mode {
        LayoutMode::FixedGrid | LayoutMode::MirroredGrid => layout_regions(
            &text,
            &regions,
            &template.line_slots,
            template.text_padding,
            font_size,
            measure,
        ),
        LayoutMode::Freeflow => {
            let obstacles: Vec<Rect> = store
                .placements()
                .iter()
                .filter(|p| p.image_index < document.images.len())
                .map(|p| p.rect())
                .collect();
            layout_freeflow(
                &text,
                &template.column,
                &template.line_slots,
                &obstacles,
                font_size,
                wrapper,
                measure,
            )
        }
    };

    let mut ops = vec![
        DrawOp::Clear {
            size: template.size,
        },
        DrawOp::Background {
            source: template.background.clone(),
            fallback: template.fallback_fill.clone(),
            rect: Rect::from_origin(Point::default(), template.size),
        },
    ];

    let shadow = TextShadow {
        offset: Point::new(SHADOW_OFFSET, SHADOW_OFFSET),
        color: document.colors.shadow.clone(),
    };
    if let Some(date) = document.formatted_date() {
        ops.push(DrawOp::Text {
            text: date,
            position: template.date.anchor,
            font_size: template.date.font_size,
            color: document.colors.main.clone(),
            shadow: Some(shadow.clone()),
        });
    }
    let location = document.location.trim();
    if !location.is_empty() {
        ops.push(DrawOp::Text {
            text: location.to_string(),
            position: template.location.anchor,
            font_size: template.location.font_size,
            color: document.colors.main.clone(),
            shadow: Some(shadow),
        });
    }

    ops.extend(layout.lines.iter().map(|line| DrawOp::Text {
        text: line.text.clone(),
        position: Point::new(line.x, line.y),
        font_size: layout.font_size,
        color: document.colors.main.clone(),
        shadow: None,
    }));

    let mut click_areas: Vec<ClickArea> = regions
        .iter()
        .enumerate()
        .map(|(i, region)| ClickArea {
            target: ClickTarget::TextRegion(i),
            rect: region.rect,
        })
        .collect();

    match mode {
        LayoutMode::FixedGrid | LayoutMode::MirroredGrid => {
            for (index, (source, slot)) in document
                .images
                .iter()
                .zip(template.photo_slots(mode))
                .enumerate()
            {
                ops.push(DrawOp::Image {
                    key: source.key(),
                    source: source.clone(),
                    rect: slot,
                    rotation: 0.0,
                    fit: ImageFit::Contain,
                });
                click_areas.push(ClickArea {
                    target: ClickTarget::Image(index),
                    rect: slot,
                });
            }
        }
        LayoutMode::Freeflow => {
            for placement in store.placements() {
                let Some(source) = document.images.get(placement.image_index) else {
                    continue;
                };
                ops.push(DrawOp::Image {
                    key: source.key(),
                    source: source.clone(),
                    rect: placement.rect(),
                    rotation: 0.0,
                    fit: ImageFit::Stretch,
                });
                click_areas.push(ClickArea {
                    target: ClickTarget::Image(placement.image_index),
                    rect: placement.rect(),
                });
            }
        }
    }

    ops.extend(store.stickers_by_z().into_iter().map(|sticker| DrawOp::Image {
        key: sticker.image_key(),
        source: sticker.source.clone(),
        rect: sticker.rect(),
        rotation: sticker.normalized_rotation(),
        fit: ImageFit::Stretch,
    }));

    click_areas.push(ClickArea {
        target: ClickTarget::Location,
        rect: template.location_area,
    });

    if flags.editable && !flags.export_mode {
        if let Some(id) = flags.selected {
            if let Some(frame) = store.frame(id) {
                let frame = EntityFrame {
                    rotation: normalize_degrees(frame.rotation),
                    ..frame
                };
                ops.push(DrawOp::Affordances {
                    id,
                    frame,
                    handles: affordance_handles(id, &frame),
                });
            }
        }
    }

    tracing::trace!(
        ?mode,
        font_size,
        lines = layout.lines.len(),
        overflow = layout.overflow_words,
        ops = ops.len(),
        "frame computed"
    );

    FramePlan {
        size: template.size,
        layout,
        ops,
        click_areas,
        quality: flags.quality,
    }
}
