//! Executes a [`FramePlan`] onto a pixel surface.
//!
//! The plan is written out as an SVG document, with raster images resampled
//! to their destination pixel size and embedded as PNG data URIs, then
//! rasterized with resvg. The same plan, arena contents and scale always
//! produce the same SVG text and the same pixels.

use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

use journal_core::gesture::{Affordance, AffordanceHandle, HANDLE_RADIUS};
use journal_core::{DrawOp, FramePlan, ImageFit, ImageSource, Point, Rect, RenderQuality};
use usvg::fontdb::{Database, Family, Query, ID};

use crate::arena::ImageArena;
use crate::error::{RenderError, RenderResult};
use crate::glyph::{GlyphMeasure, PageMetrics};
use crate::image::{contain_rect, encode_data_uri, encode_png, pixel_size, resample};

const OUTLINE_COLOR: &str = "#2f6fde";
const DELETE_COLOR: &str = "#d64545";
const ROTATE_COLOR: &str = "#2f9e6b";
const HANDLE_DRAW_RADIUS: f32 = HANDLE_RADIUS * 0.75;

/// Turns frame plans into pixmaps.
pub struct Composer {
    font_family: String,
    fontdb: Arc<usvg::fontdb::Database>,
    clear_color: String,
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("font_family", &self.font_family)
            .field("faces", &self.fontdb.len())
            .field("clear_color", &self.clear_color)
            .finish()
    }
}

impl Composer {
    /// Composer drawing text in `font_family`, resolved from system fonts.
    #[must_use]
    pub fn new(font_family: impl Into<String>) -> Self {
        let mut fontdb = Database::new();
        fontdb.load_system_fonts();
        Self::with_database(font_family, fontdb)
    }

    /// Composer drawing text in `font_family`, resolved from `fontdb` only.
    #[must_use]
    pub fn with_database(font_family: impl Into<String>, fontdb: Database) -> Self {
        Self {
            font_family: font_family.into(),
            fontdb: Arc::new(fontdb),
            clear_color: "#ffffff".to_string(),
        }
    }

    /// Load the font file at `path` and draw text with its first face.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds no usable face.
    pub fn with_font_file(mut self, path: &Path) -> RenderResult<Self> {
        let fontdb = Arc::make_mut(&mut self.fontdb);
        let before: Vec<ID> = fontdb.faces().map(|face| face.id).collect();
        fontdb
            .load_font_file(path)
            .map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
        let family = fontdb
            .faces()
            .filter(|face| !before.contains(&face.id))
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .ok_or_else(|| RenderError::Font(format!("{}: no font faces", path.display())))?;
        tracing::debug!(path = %path.display(), %family, "font file loaded");
        self.font_family = family;
        Ok(self)
    }

    /// Family text is drawn in.
    #[must_use]
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// The face resvg picks for body text, if any face matches.
    #[must_use]
    pub fn text_face(&self) -> Option<ID> {
        // resvg falls back to the generic serif family
        let families = [family_of(&self.font_family), Family::Serif];
        self.fontdb.query(&Query {
            families: &families,
            ..Query::default()
        })
    }

    /// Layout metrics from the face text is drawn with.
    ///
    /// When no face resolves nothing is drawn either, and layout falls back
    /// to fixed advances.
    #[must_use]
    pub fn metrics(&self) -> PageMetrics {
        let measured = self.text_face().and_then(|id| {
            self.fontdb
                .with_face_data(id, GlyphMeasure::from_face)
        });
        match measured {
            Some(Ok(measure)) => PageMetrics::Glyph(measure),
            Some(Err(err)) => {
                tracing::warn!(%err, family = %self.font_family, "face unreadable, using fallback metrics");
                PageMetrics::default()
            }
            None => {
                tracing::warn!(family = %self.font_family, "no font face resolves, using fallback metrics");
                PageMetrics::default()
            }
        }
    }

    /// Colour the surface is cleared to.
    #[must_use]
    pub fn with_clear_color(mut self, color: impl Into<String>) -> Self {
        self.clear_color = color.into();
        self
    }

    /// Write `plan` as an SVG document sized `plan.size × scale` pixels.
    ///
    /// Images that cannot be resolved are skipped; a background that cannot
    /// be resolved becomes its fallback fill.
    ///
    /// # Errors
    ///
    /// Returns an error if `scale` is not a positive finite number or an
    /// image cannot be re-encoded.
    #[allow(clippy::cast_precision_loss)]
    pub fn compose_svg(
        &self,
        plan: &FramePlan,
        arena: &mut ImageArena,
        scale: f32,
    ) -> RenderResult<String> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(RenderError::Raster(format!("invalid pixel scale {scale}")));
        }
        let page = Rect::from_origin(Point::default(), plan.size);
        let (out_w, out_h) = pixel_size(&page, scale);

        let mut svg = String::with_capacity(16 * 1024);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {} {}\">",
            plan.size.width, plan.size.height,
        );

        for op in &plan.ops {
            match op {
                DrawOp::Clear { size } => {
                    tracing::trace!(op = "clear", "draw");
                    let _ = write!(
                        svg,
                        "<rect width=\"{}\" height=\"{}\" fill=\"{}\"/>",
                        size.width,
                        size.height,
                        escape_xml(&self.clear_color),
                    );
                }
                DrawOp::Background {
                    source,
                    fallback,
                    rect,
                } => {
                    tracing::trace!(op = "background", "draw");
                    let drawn = match source {
                        Some(source) => write_image(
                            &mut svg,
                            arena,
                            source,
                            *rect,
                            0.0,
                            ImageFit::Stretch,
                            plan.quality,
                            scale,
                        )?,
                        None => false,
                    };
                    if !drawn {
                        let _ = write!(
                            svg,
                            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
                            rect.x,
                            rect.y,
                            rect.width,
                            rect.height,
                            escape_xml(fallback),
                        );
                    }
                }
                DrawOp::Text {
                    text,
                    position,
                    font_size,
                    color,
                    shadow,
                } => {
                    tracing::trace!(op = "text", len = text.len(), "draw");
                    if let Some(shadow) = shadow {
                        self.write_text(
                            &mut svg,
                            text,
                            position.x + shadow.offset.x,
                            position.y + shadow.offset.y,
                            *font_size,
                            &shadow.color,
                        );
                    }
                    self.write_text(&mut svg, text, position.x, position.y, *font_size, color);
                }
                DrawOp::Image {
                    key,
                    source,
                    rect,
                    rotation,
                    fit,
                } => {
                    tracing::trace!(op = "image", %key, "draw");
                    let _ = write_image(
                        &mut svg,
                        arena,
                        source,
                        *rect,
                        *rotation,
                        *fit,
                        plan.quality,
                        scale,
                    )?;
                }
                DrawOp::Affordances { id, frame, handles } => {
                    tracing::trace!(op = "affordances", %id, "draw");
                    write_affordances(&mut svg, frame.rect, frame.rotation, handles, scale);
                }
            }
        }

        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Compose and rasterize `plan`.
    ///
    /// # Errors
    ///
    /// Returns an error if composition fails or the SVG cannot be rasterized.
    pub fn render(
        &self,
        plan: &FramePlan,
        arena: &mut ImageArena,
        scale: f32,
    ) -> RenderResult<tiny_skia::Pixmap> {
        let svg = self.compose_svg(plan, arena, scale)?;
        self.rasterize(&svg)
    }

    /// Rasterize an SVG document at its declared pixel size.
    ///
    /// # Errors
    ///
    /// Returns an error if the SVG is malformed or the surface cannot be
    /// allocated.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rasterize(&self, svg: &str) -> RenderResult<tiny_skia::Pixmap> {
        let mut opt = usvg::Options::default();
        opt.font_family.clone_from(&self.font_family);
        opt.fontdb = Arc::clone(&self.fontdb);

        let tree = usvg::Tree::from_str(svg, &opt)
            .map_err(|e| RenderError::Raster(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width().round() as u32;
        let px_h = tree.size().height().round() as u32;
        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Raster(format!("cannot allocate {px_w}x{px_h} surface")))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        tracing::debug!(width = px_w, height = px_h, "frame rasterized");
        Ok(pixmap)
    }

    fn write_text(&self, svg: &mut String, text: &str, x: f32, y: f32, size: f32, color: &str) {
        let _ = write!(
            svg,
            "<text x=\"{x}\" y=\"{y}\" font-size=\"{size}\" fill=\"{}\" font-family=\"{}\" xml:space=\"preserve\">{}</text>",
            escape_xml(color),
            escape_xml(&css_family(&self.font_family)),
            escape_xml(text),
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn write_image(
    svg: &mut String,
    arena: &mut ImageArena,
    source: &ImageSource,
    rect: Rect,
    rotation: f32,
    fit: ImageFit,
    quality: RenderQuality,
    scale: f32,
) -> RenderResult<bool> {
    let Some(image) = arena.resolve(source) else {
        return Ok(false);
    };
    let dest = match fit {
        ImageFit::Stretch => rect,
        ImageFit::Contain => contain_rect(image.natural_size(), rect),
    };
    let (px_w, px_h) = pixel_size(&dest, scale);
    let pixels = resample(image, px_w, px_h, quality)?;
    let href = encode_data_uri(&encode_png(&pixels)?);

    let _ = write!(
        svg,
        "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" xlink:href=\"{href}\"",
        dest.x, dest.y, dest.width, dest.height,
    );
    if rotation.abs() > f32::EPSILON {
        let c = dest.center();
        let _ = write!(svg, " transform=\"rotate({rotation} {} {})\"", c.x, c.y);
    }
    svg.push_str("/>");
    Ok(true)
}

fn write_affordances(
    svg: &mut String,
    rect: Rect,
    rotation: f32,
    handles: &[AffordanceHandle],
    scale: f32,
) {
    let stroke = 2.0 / scale.max(1.0);
    let c = rect.center();
    let _ = write!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{OUTLINE_COLOR}\" stroke-width=\"{stroke}\" stroke-dasharray=\"8 6\" transform=\"rotate({rotation} {} {})\"/>",
        rect.x, rect.y, rect.width, rect.height, c.x, c.y,
    );
    for handle in handles {
        let color = match handle.kind {
            Affordance::Delete => DELETE_COLOR,
            Affordance::Rotate => ROTATE_COLOR,
            Affordance::Resize => OUTLINE_COLOR,
        };
        let _ = write!(
            svg,
            "<circle cx=\"{}\" cy=\"{}\" r=\"{HANDLE_DRAW_RADIUS}\" fill=\"#ffffff\" stroke=\"{color}\" stroke-width=\"{}\"/>",
            handle.center.x,
            handle.center.y,
            stroke * 1.5,
        );
        if handle.kind == Affordance::Delete {
            let d = HANDLE_DRAW_RADIUS * 0.45;
            let (x, y) = (handle.center.x, handle.center.y);
            let _ = write!(
                svg,
                "<path d=\"M{} {} L{} {} M{} {} L{} {}\" stroke=\"{color}\" stroke-width=\"{}\"/>",
                x - d,
                y - d,
                x + d,
                y + d,
                x + d,
                y - d,
                x - d,
                y + d,
                stroke * 1.5,
            );
        }
    }
}

/// Escape special XML characters.
fn family_of(name: &str) -> Family<'_> {
    match name.trim() {
        n if n.eq_ignore_ascii_case("serif") => Family::Serif,
        n if n.eq_ignore_ascii_case("sans-serif") => Family::SansSerif,
        n if n.eq_ignore_ascii_case("cursive") => Family::Cursive,
        n if n.eq_ignore_ascii_case("fantasy") => Family::Fantasy,
        n if n.eq_ignore_ascii_case("monospace") => Family::Monospace,
        n => Family::Name(n),
    }
}

/// `font-family` value naming exactly one family.
fn css_family(name: &str) -> String {
    match family_of(name) {
        Family::Name(n) => format!("'{}'", n.replace('\'', "")),
        _ => name.trim().to_string(),
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
