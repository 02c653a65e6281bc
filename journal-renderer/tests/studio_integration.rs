//! Integration tests for the page studio: sticker commands, freeflow photo
//! placement and deterministic rendering.

use journal_core::{
    DocumentState, EntityId, ImageSource, LayoutMode, PageCommands, PageSession, PageSnapshot,
    PageTemplate, Size, StickerEntity, StickerUpload, MIN_ENTITY_SIZE,
};
use journal_renderer::{FileSink, PageStudio, RenderError, RendererConfig};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let pixels = image::RgbaImage::from_pixel(width, height, image::Rgba([40, 160, 90, 255]));
    journal_renderer::image::encode_png(&pixels).expect("png")
}

fn data_uri(width: u32, height: u32) -> ImageSource {
    ImageSource::new(journal_renderer::image::encode_data_uri(&png_bytes(width, height)))
}

fn small_template() -> PageTemplate {
    PageTemplate {
        size: Size::new(240.0, 160.0),
        ..PageTemplate::default()
    }
}

fn studio(document: DocumentState, template: PageTemplate) -> PageStudio<FileSink> {
    PageStudio::new(
        PageSession::new(document, template),
        RendererConfig::default(),
        FileSink::new(std::env::temp_dir()),
    )
    .expect("studio")
}

#[test]
fn test_add_stickers_batch_is_per_item() {
    let mut studio = studio(DocumentState::default(), small_template());
    let batch = vec![
        StickerUpload::new(png_bytes(30, 15)),
        StickerUpload::new(b"not an image".to_vec()),
        StickerUpload {
            bytes: png_bytes(10, 10),
            target_size: Some(Size::new(1.0, 1.0)),
        },
    ];

    let results = studio.add_stickers(&batch);

    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(RenderError::Resource(_))));
    let last = results[2].as_ref().expect("third sticker");
    assert_eq!(studio.session().store().stickers().len(), 2);
    assert_eq!(studio.session().selected(), Some(EntityId::Sticker(*last)));

    let tiny = studio.session().store().sticker(*last).expect("sticker");
    assert!(tiny.size.width >= MIN_ENTITY_SIZE);
    assert!(tiny.size.height >= MIN_ENTITY_SIZE);
    assert!(tiny.source.is_data_uri());

    assert_eq!(studio.clear_stickers(), 2);
    assert!(studio.session().selected().is_none());
}

#[test]
fn test_sticker_keeps_natural_aspect() {
    let mut studio = studio(DocumentState::default(), small_template());
    let id = studio
        .add_sticker(&png_bytes(40, 20), Some(Size::new(100.0, 100.0)))
        .expect("sticker");
    let sticker = studio.session().store().sticker(id).expect("sticker");
    assert_eq!(sticker.natural_size, Size::new(40.0, 20.0));
    assert!((sticker.size.aspect() - 2.0).abs() < 1e-3);
}

#[test]
fn test_read_only_page_rejects_stickers() {
    let mut studio = studio(DocumentState::default(), small_template());
    let _ = studio.session_mut().set_editable(false);
    let result = studio.add_sticker(&png_bytes(8, 8), None);
    assert!(matches!(result, Err(RenderError::Core(_))));
    assert!(studio.session().store().stickers().is_empty());
}

#[test]
fn test_freeflow_photos_are_placed_from_natural_size() {
    let document = DocumentState {
        images: vec![data_uri(30, 20), ImageSource::new("file:///missing.png")],
        layout: LayoutMode::Freeflow,
        ..DocumentState::default()
    };
    let studio = studio(document, PageTemplate::default());

    let placement = studio.session().store().placement(0).expect("placed");
    assert!((placement.aspect - 1.5).abs() < 1e-3);
    assert!((placement.size.width / placement.size.height - 1.5).abs() < 1e-3);
    assert!(studio.session().store().placement(1).is_none());
    assert_eq!(studio.session().missing_placements(), vec![1]);
}

#[test]
fn test_render_is_idempotent() {
    let template = small_template();
    let mut sticker = StickerEntity::new(
        data_uri(12, 12),
        Size::new(12.0, 12.0),
        Some(Size::new(60.0, 60.0)),
        template.size,
    );
    sticker.rotation = 385.0;
    let snapshot = PageSnapshot {
        document: DocumentState {
            location: "Kyoto".to_string(),
            segments: vec!["Temple gardens in the rain.".to_string()],
            ..DocumentState::default()
        },
        stickers: vec![sticker],
        placements: Vec::new(),
    };
    let mut studio = PageStudio::new(
        PageSession::from_snapshot(snapshot, template),
        RendererConfig::default(),
        FileSink::new(std::env::temp_dir()),
    )
    .expect("studio");

    let svg_a = studio.compose_svg(1.0).expect("svg");
    let svg_b = studio.compose_svg(1.0).expect("svg");
    assert_eq!(svg_a, svg_b);
    assert!(svg_a.contains("rotate(25 120 80)"));

    let first = studio.render(1.0).expect("render");
    let second = studio.render(1.0).expect("render");
    assert_eq!((first.width(), first.height()), (240, 160));
    assert_eq!(first.data(), second.data());
}

#[test]
fn test_unusable_font_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bogus = dir.path().join("hand.ttf");
    std::fs::write(&bogus, b"definitely not a font").expect("write");

    for font_path in [bogus, dir.path().join("missing.ttf")] {
        let config = RendererConfig {
            font_path: Some(font_path),
            ..RendererConfig::default()
        };
        let result = PageStudio::new(
            PageSession::new(DocumentState::default(), small_template()),
            config,
            FileSink::new(dir.path()),
        );
        assert!(matches!(result, Err(RenderError::Font(_))));
    }
}

#[test]
fn test_preview_png_has_magic_bytes() {
    let mut studio = studio(DocumentState::default(), small_template());
    let png = studio.render_png(0.5).expect("png");
    assert_eq!(&png[0..4], &[137, 80, 78, 71]);
}
