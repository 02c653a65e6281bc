//! # Journal Renderer
//!
//! Draws journal pages and exports them for print.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │ PageSession  │──▶│  FramePlan   │──▶│  SVG + PNG   │──▶│  Pixmap  │
//! │ (core state) │   │ (draw ops)   │   │  data URIs   │   │ (resvg)  │
//! └──────────────┘   └──────────────┘   └──────────────┘   └────┬─────┘
//!                                                                │ export
//!                                                           PNG ─▶ PDF
//! ```
//!
//! [`PageStudio`] bundles a session with everything needed to draw it and
//! implements the host-facing [`PageCommands`] port.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod arena;
pub mod composer;
pub mod error;
pub mod export;
pub mod glyph;
pub mod image;

pub use arena::{ArenaConfig, ArenaStats, ImageArena};
pub use composer::Composer;
pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportedPage, FileSink, PageExporter};
pub use glyph::{GlyphMeasure, PageMetrics};

use std::path::PathBuf;

use journal_core::{
    DocumentState, ExportReceipt, ExportSink, FramePlan, ImageSource, InputEvent, JournalError,
    PageCommands, PageSession, Redraw, RenderQuality, Size, StickerEntity, StickerId,
};
use serde::{Deserialize, Serialize};

/// Configuration for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Interactive frame rate; sets the move-coalescing interval.
    pub target_fps: u32,
    /// Raster pixels per page pixel when exporting.
    pub export_multiplier: f32,
    /// Print resolution of the exported raster.
    pub dpi: f32,
    /// Font file used for metrics and drawing; overrides `font_family`.
    pub font_path: Option<PathBuf>,
    /// Font family used for drawing and metrics when no file is given.
    pub font_family: String,
    /// Colour the surface is cleared to before the background.
    pub clear_color: String,
    /// Two-pass image resampling on screen.
    pub high_quality: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            export_multiplier: 3.0,
            dpi: 450.0,
            font_path: None,
            font_family: "serif".to_string(),
            clear_color: "#ffffff".to_string(),
            high_quality: true,
        }
    }
}

impl RendererConfig {
    /// Move-coalescing interval derived from the frame rate.
    #[must_use]
    pub fn frame_interval_ms(&self) -> u64 {
        1000 / u64::from(self.target_fps.max(1))
    }

    /// Export settings derived from this configuration.
    #[must_use]
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            multiplier: self.export_multiplier,
            dpi: self.dpi,
            ..ExportConfig::default()
        }
    }
}

/// A page with its image arena, fonts and export sink.
pub struct PageStudio<S> {
    session: PageSession,
    arena: ImageArena,
    composer: Composer,
    metrics: PageMetrics,
    config: RendererConfig,
    sink: S,
}

impl<S: std::fmt::Debug> std::fmt::Debug for PageStudio<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageStudio")
            .field("session", &self.session)
            .field("arena", &self.arena)
            .field("composer", &self.composer)
            .field("metrics", &self.metrics)
            .field("config", &self.config)
            .field("sink", &self.sink)
            .finish()
    }
}

impl<S: ExportSink> PageStudio<S> {
    /// Wrap `session`, loading fonts from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured font file cannot be loaded.
    pub fn new(session: PageSession, config: RendererConfig, sink: S) -> RenderResult<Self> {
        let mut composer = Composer::new(config.font_family.clone())
            .with_clear_color(config.clear_color.clone());
        if let Some(path) = &config.font_path {
            composer = composer.with_font_file(path)?;
        }
        Ok(Self::with_composer(session, config, sink, composer))
    }

    /// Wrap `session` with an explicit composer. Layout measures with the
    /// face the composer draws with.
    #[must_use]
    pub fn with_composer(
        session: PageSession,
        config: RendererConfig,
        sink: S,
        composer: Composer,
    ) -> Self {
        let metrics = composer.metrics();
        tracing::debug!(
            family = composer.font_family(),
            fallback = metrics.is_fallback(),
            "text metrics ready"
        );
        let mut session = session.with_frame_interval(config.frame_interval_ms());
        let quality = if config.high_quality {
            RenderQuality::High
        } else {
            RenderQuality::Draft
        };
        let _ = session.set_quality(quality);
        let mut studio = Self {
            session,
            arena: ImageArena::new(),
            composer,
            metrics,
            config,
            sink,
        };
        let _ = studio.resolve_placements();
        studio
    }

    /// Page state.
    #[must_use]
    pub fn session(&self) -> &PageSession {
        &self.session
    }

    /// Mutable page state.
    pub fn session_mut(&mut self) -> &mut PageSession {
        &mut self.session
    }

    /// Decoded images.
    pub fn arena_mut(&mut self) -> &mut ImageArena {
        &mut self.arena
    }

    /// Layout metrics in use.
    #[must_use]
    pub fn metrics(&self) -> &PageMetrics {
        &self.metrics
    }

    /// Renderer configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Export sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Replace the document and place any new freeflow photos.
    pub fn set_document(&mut self, document: DocumentState) -> Redraw {
        self.session
            .set_document(document)
            .or(self.resolve_placements())
    }

    /// Feed an input event to the session.
    pub fn handle_input(&mut self, event: &InputEvent) -> Redraw {
        self.session.handle_input(event)
    }

    /// Apply the queued move, if any.
    pub fn flush_frame(&mut self, now_ms: u64) -> Redraw {
        self.session.flush_frame(now_ms)
    }

    /// Give every unplaced freeflow photo its default placement.
    ///
    /// Photos that cannot be decoded stay unplaced until their image is
    /// inserted into the arena.
    pub fn resolve_placements(&mut self) -> Redraw {
        let missing: Vec<(usize, ImageSource)> = self
            .session
            .missing_placements()
            .into_iter()
            .filter_map(|i| {
                self.session
                    .document()
                    .images
                    .get(i)
                    .map(|source| (i, source.clone()))
            })
            .collect();

        let mut redraw = Redraw::Skip;
        for (index, source) in missing {
            if let Some(natural) = self.arena.natural_size(&source) {
                redraw = redraw.or(self.session.place_image(index, natural));
            }
        }
        redraw
    }

    /// Compute the on-screen frame.
    #[must_use]
    pub fn plan(&self) -> FramePlan {
        self.session.plan(&self.metrics)
    }

    /// On-screen frame as an SVG document.
    ///
    /// # Errors
    ///
    /// Returns an error if composition fails.
    pub fn compose_svg(&mut self, scale: f32) -> RenderResult<String> {
        let _ = self.resolve_placements();
        let plan = self.session.plan(&self.metrics);
        self.composer.compose_svg(&plan, &mut self.arena, scale)
    }

    /// Rasterize the on-screen frame.
    ///
    /// # Errors
    ///
    /// Returns an error if composition or rasterization fails.
    pub fn render(&mut self, scale: f32) -> RenderResult<tiny_skia::Pixmap> {
        let _ = self.resolve_placements();
        let plan = self.session.plan(&self.metrics);
        self.composer.render(&plan, &mut self.arena, scale)
    }

    /// Rasterize the on-screen frame as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn render_png(&mut self, scale: f32) -> RenderResult<Vec<u8>> {
        self.render(scale)?
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Render the export PDF without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn export_bytes(&mut self) -> RenderResult<ExportedPage> {
        let _ = self.resolve_placements();
        let config = self.config.export_config();
        PageExporter::new(&config, &self.composer, &self.metrics)
            .render(&mut self.session, &mut self.arena)
    }

    /// Cancel pending work before the surface goes away.
    pub fn teardown(&mut self) {
        self.session.teardown();
    }
}

impl<S: ExportSink> PageCommands for PageStudio<S> {
    type Error = RenderError;

    fn add_sticker(
        &mut self,
        bytes: &[u8],
        target_size: Option<Size>,
    ) -> Result<StickerId, RenderError> {
        if !self.session.is_editable() {
            return Err(JournalError::ReadOnly.into());
        }
        let decoded = crate::image::decode_bytes(bytes)?;
        let natural = decoded.natural_size();
        let source = ImageSource::new(crate::image::encode_data_uri(bytes));
        self.arena.insert(source.key(), decoded);

        let page = self.session.template().size;
        let sticker = StickerEntity::new(source, natural, target_size, page);
        let size = sticker.size;
        let id = self.session.add_sticker(sticker);
        tracing::debug!(%id, ?natural, ?size, "sticker added");
        Ok(id)
    }

    fn export(&mut self) -> Result<ExportReceipt, RenderError> {
        let _ = self.resolve_placements();
        let config = self.config.export_config();
        PageExporter::new(&config, &self.composer, &self.metrics).export(
            &mut self.session,
            &mut self.arena,
            &self.sink,
        )
    }

    fn clear_stickers(&mut self) -> usize {
        let removed = self.session.clear_stickers();
        tracing::debug!(removed, "stickers cleared");
        removed
    }
}

/// Renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RendererConfig::default();
        assert_eq!(config.frame_interval_ms(), 16);
        let export = config.export_config();
        assert!((export.multiplier - 3.0).abs() < f32::EPSILON);
        assert!((export.dpi - 450.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: RendererConfig =
            serde_json::from_str(r#"{"target_fps": 30, "high_quality": false}"#).expect("json");
        assert_eq!(config.frame_interval_ms(), 33);
        assert!(!config.high_quality);
        assert_eq!(config.font_family, "serif");
    }

    #[test]
    fn test_zero_fps_does_not_divide_by_zero() {
        let config = RendererConfig {
            target_fps: 0,
            ..RendererConfig::default()
        };
        assert_eq!(config.frame_interval_ms(), 1000);
    }
}
