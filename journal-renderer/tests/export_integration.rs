//! Integration tests for print export (journal-renderer).
//!
//! Covers the PDF produced for a real session, the file sink, and the
//! guarantees that hold when the sink fails.

use chrono::NaiveDate;
use journal_core::{
    DocumentState, EntityId, ExportSink, NoticeLevel, PageCommands, PageSession, PageTemplate,
    RenderQuality, Size,
};
use journal_renderer::{FileSink, PageStudio, RenderError, RendererConfig};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let pixels = image::RgbaImage::from_pixel(width, height, image::Rgba([220, 90, 30, 255]));
    journal_renderer::image::encode_png(&pixels).expect("png")
}

fn small_session() -> PageSession {
    let template = PageTemplate {
        size: Size::new(200.0, 120.0),
        ..PageTemplate::default()
    };
    let document = DocumentState {
        date: NaiveDate::from_ymd_opt(2024, 6, 3),
        location: "Porto".to_string(),
        ..DocumentState::default()
    };
    PageSession::new(document, template)
}

#[derive(Debug)]
struct FailingSink;

impl ExportSink for FailingSink {
    fn persist(&self, _: &str, _: &[u8]) -> std::io::Result<String> {
        Err(std::io::Error::other("disk full"))
    }
}

// ==========================================================================
// Successful export
// ==========================================================================

#[test]
fn test_export_writes_dated_pdf() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut studio = PageStudio::new(
        small_session(),
        RendererConfig::default(),
        FileSink::new(dir.path()),
    )
    .expect("studio");
    studio
        .add_sticker(&png_bytes(20, 10), Some(Size::new(80.0, 80.0)))
        .expect("sticker");

    let receipt = studio.export().expect("export");

    assert!(receipt.location.ends_with("journal-2024-06-03.pdf"));
    assert_eq!((receipt.width_px, receipt.height_px), (600, 360));
    let written = std::fs::read(dir.path().join("journal-2024-06-03.pdf")).expect("read");
    assert_eq!(written.len(), receipt.byte_len);
    assert_eq!(&written[0..5], b"%PDF-");
    assert!(studio.session().notice().is_none());
}

#[test]
fn test_export_multiplier_scales_raster() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = RendererConfig {
        export_multiplier: 2.0,
        ..RendererConfig::default()
    };
    let mut studio =
        PageStudio::new(small_session(), config, FileSink::new(dir.path())).expect("studio");
    let page = studio.export_bytes().expect("export");
    assert_eq!((page.width_px, page.height_px), (400, 240));
    assert_eq!(&page.pdf[0..5], b"%PDF-");
}

#[test]
fn test_export_restores_selection_and_quality() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut studio = PageStudio::new(
        small_session(),
        RendererConfig::default(),
        FileSink::new(dir.path()),
    )
    .expect("studio");
    let id = studio.add_sticker(&png_bytes(8, 8), None).expect("sticker");
    let _ = studio.session_mut().set_quality(RenderQuality::Draft);

    studio.export().expect("export");

    assert_eq!(studio.session().selected(), Some(EntityId::Sticker(id)));
    assert_eq!(studio.session().quality(), RenderQuality::Draft);
}

// ==========================================================================
// Failing sink
// ==========================================================================

#[test]
fn test_failed_export_sets_notice_and_keeps_state() {
    let mut studio = PageStudio::new(small_session(), RendererConfig::default(), FailingSink)
        .expect("studio");
    let id = studio.add_sticker(&png_bytes(8, 8), None).expect("sticker");
    let _ = studio.session_mut().set_quality(RenderQuality::Draft);
    let before = studio.session().snapshot();

    let err = studio.export().expect_err("sink fails");

    assert!(matches!(err, RenderError::Export(_)));
    let notice = studio.session().notice().expect("notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("disk full"));
    assert_eq!(studio.session().selected(), Some(EntityId::Sticker(id)));
    assert_eq!(studio.session().quality(), RenderQuality::Draft);
    assert!(studio.session().is_editable());
    assert_eq!(studio.session().snapshot(), before);

    let _ = studio.session_mut().dismiss_notice();
    assert!(studio.session().notice().is_none());
}
