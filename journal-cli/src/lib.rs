//! # Journal CLI
//!
//! Command-line host for Journal Studio pages.
//!
//! ## Usage
//!
//! ```bash
//! # PNG preview of a saved page
//! journal page.json preview --out page.png --scale 0.5
//!
//! # Print-ready PDF into ./exports
//! journal page.json export --dir exports
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap, with env fallbacks
//! - `RendererConfig` - Built from the arguments
//! - `PageStudio` - Renders and exports the loaded page

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use journal_core::{PageSession, PageSnapshot, PageTemplate};
use journal_renderer::{FileSink, PageStudio, RenderError, RendererConfig};
use thiserror::Error;

/// Command-line arguments for `journal`.
#[derive(Debug, Clone, Parser)]
#[command(name = "journal")]
#[command(about = "Preview and export Journal Studio pages")]
#[command(version)]
pub struct CliArgs {
    /// Saved page (JSON snapshot)
    pub snapshot: PathBuf,

    /// Page template (JSON); the built-in template when absent
    #[arg(long, env = "JOURNAL_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// Font file used for metrics and drawing
    #[arg(long, env = "JOURNAL_FONT")]
    pub font: Option<PathBuf>,

    /// Font family used for drawing
    #[arg(long, env = "JOURNAL_FONT_FAMILY", default_value = "serif")]
    pub font_family: String,

    /// Raster pixels per page pixel when exporting
    #[arg(long, env = "JOURNAL_EXPORT_MULTIPLIER", default_value_t = 3.0)]
    pub export_multiplier: f32,

    /// Print resolution of the exported raster
    #[arg(long, env = "JOURNAL_DPI", default_value_t = 450.0)]
    pub dpi: f32,

    /// Interactive frame rate
    #[arg(long, env = "JOURNAL_TARGET_FPS", default_value_t = 60)]
    pub fps: u32,

    /// Single-pass image resampling for previews
    #[arg(long)]
    pub draft: bool,

    /// What to produce
    #[command(subcommand)]
    pub command: Command,
}

/// Output to produce.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render a PNG preview.
    Preview {
        /// Output file
        #[arg(long, short, default_value = "preview.png")]
        out: PathBuf,

        /// Pixels per page pixel
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
    },
    /// Export the print PDF.
    Export {
        /// Directory the PDF is written into
        #[arg(long, env = "JOURNAL_EXPORT_DIR", default_value = ".")]
        dir: PathBuf,
    },
}

impl From<&CliArgs> for RendererConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            target_fps: args.fps,
            export_multiplier: args.export_multiplier,
            dpi: args.dpi,
            font_path: args.font.clone(),
            font_family: args.font_family.clone(),
            high_quality: !args.draft,
            ..RendererConfig::default()
        }
    }
}

/// Errors loading page files.
#[derive(Debug, Error)]
pub enum CliError {
    /// File could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// File is not valid JSON for the expected type.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The renderer could not be set up.
    #[error(transparent)]
    Render(#[from] RenderError),
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Directory relative image paths in `path` are resolved against.
fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

/// Load a saved page.
///
/// Relative image paths are resolved against the snapshot's directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_snapshot(path: &Path) -> Result<PageSnapshot, CliError> {
    let mut snapshot: PageSnapshot = read_json(path)?;
    let base = base_dir(path);
    for image in &mut snapshot.document.images {
        *image = image.relative_to(base);
    }
    for sticker in &mut snapshot.stickers {
        sticker.source = sticker.source.relative_to(base);
    }
    Ok(snapshot)
}

/// Load a template, or the built-in one when `path` is `None`.
///
/// A relative background path is resolved against the template's directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_template(path: Option<&Path>) -> Result<PageTemplate, CliError> {
    let Some(path) = path else {
        return Ok(PageTemplate::default());
    };
    let mut template: PageTemplate = read_json(path)?;
    if let Some(background) = &mut template.background {
        *background = background.relative_to(base_dir(path));
    }
    Ok(template)
}

/// Open the page named by `args`, exporting into `export_dir`.
///
/// # Errors
///
/// Returns an error if the snapshot, template or font cannot be loaded.
pub fn open_studio(args: &CliArgs, export_dir: &Path) -> Result<PageStudio<FileSink>, CliError> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let template = load_template(args.template.as_deref())?;
    tracing::debug!(
        stickers = snapshot.stickers.len(),
        images = snapshot.document.images.len(),
        layout = ?snapshot.document.layout,
        "page loaded"
    );
    let session = PageSession::from_snapshot(snapshot, template);
    Ok(PageStudio::new(
        session,
        RendererConfig::from(args),
        FileSink::new(export_dir),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use journal_core::{ImageSource, StickerEntity};

    #[test]
    fn test_parse_preview_defaults() {
        let args = CliArgs::try_parse_from(["journal", "page.json", "preview"]).expect("parse");
        assert_eq!(args.snapshot, PathBuf::from("page.json"));
        match args.command {
            Command::Preview { ref out, scale } => {
                assert_eq!(out, &PathBuf::from("preview.png"));
                assert!((scale - 1.0).abs() < f32::EPSILON);
            }
            Command::Export { .. } => panic!("expected preview"),
        }
        let config = RendererConfig::from(&args);
        assert_eq!(config.target_fps, 60);
        assert!(config.high_quality);
    }

    #[test]
    fn test_args_map_to_config() {
        let args = CliArgs::try_parse_from([
            "journal",
            "page.json",
            "--export-multiplier",
            "2",
            "--dpi",
            "300",
            "--draft",
            "--font-family",
            "Lora",
            "export",
            "--dir",
            "out",
        ])
        .expect("parse");
        let config = RendererConfig::from(&args);
        assert!((config.export_multiplier - 2.0).abs() < f32::EPSILON);
        assert!((config.dpi - 300.0).abs() < f32::EPSILON);
        assert!(!config.high_quality);
        assert_eq!(config.font_family, "Lora");
        assert!(matches!(args.command, Command::Export { ref dir } if dir == &PathBuf::from("out")));
    }

    #[test]
    fn test_load_snapshot_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("page.json");
        std::fs::write(&path, "{ not json").expect("write");
        let err = load_snapshot(&path).expect_err("invalid");
        assert!(matches!(err, CliError::Parse { .. }));
        assert!(err.to_string().contains("page.json"));

        let missing = load_snapshot(&dir.path().join("missing.json")).expect_err("missing");
        assert!(matches!(missing, CliError::Read { .. }));
    }

    #[test]
    fn test_relative_images_resolve_next_to_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("page.json");
        let page = journal_core::Size::new(1240.0, 1754.0);
        let snapshot = PageSnapshot {
            document: journal_core::DocumentState {
                images: vec![ImageSource::new("photos/pier.jpg"), ImageSource::new("/abs/x.png")],
                ..journal_core::DocumentState::default()
            },
            stickers: vec![StickerEntity::new(
                ImageSource::new("stickers/gull.png"),
                journal_core::Size::new(10.0, 10.0),
                None,
                page,
            )],
            placements: Vec::new(),
        };
        std::fs::write(&path, snapshot.to_json().expect("json")).expect("write");

        let loaded = load_snapshot(&path).expect("load");
        let expected = dir.path().join("photos/pier.jpg");
        assert_eq!(loaded.document.images[0].as_str(), expected.to_string_lossy());
        assert_eq!(loaded.document.images[1].as_str(), "/abs/x.png");
        let sticker = dir.path().join("stickers/gull.png");
        assert_eq!(loaded.stickers[0].source.as_str(), sticker.to_string_lossy());
    }

    #[test]
    fn test_snapshot_round_trips_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("page.json");
        let snapshot = PageSnapshot::default();
        std::fs::write(&path, snapshot.to_json().expect("json")).expect("write");
        assert_eq!(load_snapshot(&path).expect("load"), snapshot);
        assert_eq!(load_template(None).expect("template"), PageTemplate::default());
    }
}
