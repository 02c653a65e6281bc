//! Print export.
//!
//! Renders the page without affordances at a resolution multiplier, encodes
//! the raster losslessly as PNG and wraps it in a single-page PDF sized so
//! the raster prints at the configured DPI.

use std::path::PathBuf;

use journal_core::{
    DocumentState, EntityId, ExportReceipt, ExportSink, Notice, PageSession, RenderQuality,
    TextMeasure,
};

use crate::arena::ImageArena;
use crate::composer::Composer;
use crate::error::{RenderError, RenderResult};

/// Millimetres per inch.
const MM_PER_INCH: f32 = 25.4;

/// Export settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Raster pixels per page pixel.
    pub multiplier: f32,
    /// Print resolution of the raster, in pixels per inch.
    pub dpi: f32,
    /// PDF document title.
    pub title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            multiplier: 3.0,
            dpi: 450.0,
            title: "Journal page".to_string(),
        }
    }
}

/// A finished export before it is handed to a sink.
#[derive(Debug, Clone)]
pub struct ExportedPage {
    /// Suggested file name.
    pub file_name: String,
    /// PDF bytes.
    pub pdf: Vec<u8>,
    /// Raster width in pixels.
    pub width_px: u32,
    /// Raster height in pixels.
    pub height_px: u32,
}

/// Puts the session into export state and restores it on every path.
struct ExportGuard<'a> {
    session: &'a mut PageSession,
    selected: Option<EntityId>,
    quality: RenderQuality,
}

impl<'a> ExportGuard<'a> {
    fn enter(session: &'a mut PageSession) -> Self {
        let selected = session.selected();
        let quality = session.quality();
        let _ = session.set_quality(RenderQuality::High);
        let _ = session.select(None);
        Self {
            session,
            selected,
            quality,
        }
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        let _ = self.session.set_quality(self.quality);
        let _ = self.session.select(self.selected);
    }
}

/// Renders a session to PDF.
pub struct PageExporter<'a> {
    config: &'a ExportConfig,
    composer: &'a Composer,
    measure: &'a dyn TextMeasure,
}

impl std::fmt::Debug for PageExporter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageExporter")
            .field("config", self.config)
            .field("composer", self.composer)
            .finish_non_exhaustive()
    }
}

impl<'a> PageExporter<'a> {
    /// Exporter drawing with `composer` and laying out with `measure`.
    #[must_use]
    pub fn new(
        config: &'a ExportConfig,
        composer: &'a Composer,
        measure: &'a dyn TextMeasure,
    ) -> Self {
        Self {
            config,
            composer,
            measure,
        }
    }

    /// Render the page to PDF bytes without persisting them.
    ///
    /// Selection and quality are restored before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn render(
        &self,
        session: &mut PageSession,
        arena: &mut ImageArena,
    ) -> RenderResult<ExportedPage> {
        let guard = ExportGuard::enter(session);
        let plan = guard.session.export_plan(self.measure);
        let pixmap = self.composer.render(&plan, arena, self.config.multiplier)?;
        let png = pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?;
        let (width_px, height_px) = (pixmap.width(), pixmap.height());
        let pdf = png_to_pdf(&png, width_px, height_px, self.config)?;
        Ok(ExportedPage {
            file_name: export_file_name(guard.session.document()),
            pdf,
            width_px,
            height_px,
        })
    }

    /// Render the page and hand the PDF to `sink`.
    ///
    /// On failure the session gets an error notice and stays editable and
    /// otherwise unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if any step fails.
    pub fn export(
        &self,
        session: &mut PageSession,
        arena: &mut ImageArena,
        sink: &dyn ExportSink,
    ) -> RenderResult<ExportReceipt> {
        let result = self.render(session, arena).and_then(|page| {
            let location = sink.persist(&page.file_name, &page.pdf)?;
            Ok(ExportReceipt {
                location,
                width_px: page.width_px,
                height_px: page.height_px,
                byte_len: page.pdf.len(),
            })
        });

        match result {
            Ok(receipt) => {
                tracing::info!(
                    location = %receipt.location,
                    width = receipt.width_px,
                    height = receipt.height_px,
                    bytes = receipt.byte_len,
                    "page exported"
                );
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(%err, "export failed");
                let _ = session.set_notice(Notice::error(format!(
                    "Could not save your page: {err}"
                )));
                Err(match err {
                    RenderError::Export(message) => RenderError::Export(message),
                    other => RenderError::Export(other.to_string()),
                })
            }
        }
    }
}

/// `journal-<date>.pdf`, or `journal-undated.pdf` without a date.
#[must_use]
pub fn export_file_name(document: &DocumentState) -> String {
    match document.date {
        Some(date) => format!("journal-{}.pdf", date.format("%Y-%m-%d")),
        None => "journal-undated.pdf".to_string(),
    }
}

/// Wrap a PNG raster in a one-page PDF whose size in millimetres is
/// `pixels / dpi × 25.4`.
///
/// # Errors
///
/// Returns an error if the PNG cannot be decoded or the PDF cannot be
/// written.
#[allow(clippy::cast_precision_loss)]
pub fn png_to_pdf(
    png: &[u8],
    width_px: u32,
    height_px: u32,
    config: &ExportConfig,
) -> RenderResult<Vec<u8>> {
    if !config.dpi.is_finite() || config.dpi <= 0.0 {
        return Err(RenderError::Export(format!("invalid dpi {}", config.dpi)));
    }
    let page_width_mm = width_px as f32 / config.dpi * MM_PER_INCH;
    let page_height_mm = height_px as f32 / config.dpi * MM_PER_INCH;

    let (doc, page, layer) = printpdf::PdfDocument::new(
        config.title.as_str(),
        printpdf::Mm(page_width_mm),
        printpdf::Mm(page_height_mm),
        "Page",
    );
    let current_layer = doc.get_page(page).get_layer(layer);

    let dynamic_image = printpdf::image_crate::load_from_memory(png)
        .map_err(|e| RenderError::Export(format!("Failed to decode PNG for PDF: {e}")))?;
    let pdf_image = printpdf::Image::from_dynamic_image(&dynamic_image);

    // One raster pixel per dot at `dpi`.
    let transform = printpdf::ImageTransform {
        translate_x: Some(printpdf::Mm(0.0)),
        translate_y: Some(printpdf::Mm(0.0)),
        dpi: Some(config.dpi),
        ..Default::default()
    };
    pdf_image.add_to_layer(current_layer, transform);

    doc.save_to_bytes()
        .map_err(|e| RenderError::Export(format!("PDF save failed: {e}")))
}

/// Writes exports into a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Sink writing into `dir`, created on first use.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for FileSink {
    fn persist(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<String> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)?;
        Ok(path.display().to_string())
    }
}
