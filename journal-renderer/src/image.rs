//! Image decoding, resampling and data URI handling.
//!
//! Photos and stickers arrive as data URIs, file paths or raw upload bytes.
//! Everything is decoded to straight RGBA once and resampled per frame to
//! the destination pixel size.

use std::io::Cursor;

use base64::Engine;
use image::{imageops::FilterType, ImageEncoder, RgbaImage};
use journal_core::{ImageSource, Rect, RenderQuality, Size};

use crate::error::{RenderError, RenderResult};

/// A decoded image in straight RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba: Vec<u8>,
    /// Format the bytes were encoded in.
    pub format: ImageFormat,
}

impl DecodedImage {
    /// Pixel dimensions as a page size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn natural_size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }

    /// Bytes held by the pixel buffer.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.rgba.len()
    }

    fn to_buffer(&self) -> RenderResult<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
            .ok_or_else(|| RenderError::Resource("pixel buffer has the wrong length".to_string()))
    }
}

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF (first frame only).
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            "image/gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }
        Self::Unknown
    }

    /// MIME type used when building data URIs.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// Decode an image from raw bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not a decodable image.
pub fn decode_bytes(data: &[u8]) -> RenderResult<DecodedImage> {
    let format = ImageFormat::from_magic_bytes(data);
    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        rgba: rgba.into_raw(),
        format,
    })
}

/// Split a data URI into its MIME type and payload bytes.
///
/// Accepts both `;base64` and percent-encoded payloads.
///
/// # Errors
///
/// Returns an error if the URI is malformed.
pub fn parse_data_uri(uri: &str) -> RenderResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let mime = metadata.split(';').next().unwrap_or_default().to_string();
    let bytes = if metadata.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(payload)?
    };
    Ok((mime, bytes))
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Wrap encoded image bytes in a base64 data URI.
#[must_use]
pub fn encode_data_uri(bytes: &[u8]) -> String {
    let mime = ImageFormat::from_magic_bytes(bytes).mime();
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{payload}")
}

/// Read and decode whatever an [`ImageSource`] points at.
///
/// # Errors
///
/// Returns an error if the source cannot be read or decoded.
pub fn load_source(source: &ImageSource) -> RenderResult<DecodedImage> {
    if source.is_data_uri() {
        let (_, bytes) = parse_data_uri(source.as_str())?;
        return decode_bytes(&bytes);
    }
    let path = source
        .as_str()
        .strip_prefix("file://")
        .unwrap_or(source.as_str());
    let bytes = std::fs::read(path)
        .map_err(|e| RenderError::Resource(format!("Failed to read {path}: {e}")))?;
    decode_bytes(&bytes)
}

/// Largest rectangle with `natural`'s aspect ratio centred inside `dest`.
#[must_use]
pub fn contain_rect(natural: Size, dest: Rect) -> Rect {
    let fitted = natural.fit_within(dest.size());
    Rect::centered(dest.center(), fitted)
}

/// Largest intermediate buffer, in pixels, for two-pass resampling.
pub const MAX_INTERMEDIATE_PIXELS: u64 = 4096 * 4096;

/// Filter passes for one resample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResamplePlan {
    /// Source already has the destination size.
    Copy,
    /// One pass straight to the destination.
    Single(FilterType),
    /// Catmull-Rom into an intermediate of the given size, then Lanczos3.
    TwoPass(u32, u32),
}

/// Choose the passes for resampling `from` to `to`.
///
/// High quality upsamples into a 2× intermediate with Catmull-Rom and then
/// downsamples with Lanczos3. Pure downscales, and upscales whose
/// intermediate would exceed [`MAX_INTERMEDIATE_PIXELS`], take a single
/// Lanczos3 pass. Draft is a single triangle pass.
#[must_use]
pub fn resample_plan(from: (u32, u32), to: (u32, u32), quality: RenderQuality) -> ResamplePlan {
    if from == to {
        return ResamplePlan::Copy;
    }
    if quality == RenderQuality::Draft {
        return ResamplePlan::Single(FilterType::Triangle);
    }
    let (mid_w, mid_h) = (to.0.saturating_mul(2), to.1.saturating_mul(2));
    let upscales = to.0 > from.0 || to.1 > from.1;
    if !upscales || u64::from(mid_w) * u64::from(mid_h) > MAX_INTERMEDIATE_PIXELS {
        return ResamplePlan::Single(FilterType::Lanczos3);
    }
    ResamplePlan::TwoPass(mid_w, mid_h)
}

/// Resample `image` to exactly `width` × `height` pixels, following
/// [`resample_plan`].
///
/// # Errors
///
/// Returns an error if the pixel buffer is inconsistent.
pub fn resample(
    image: &DecodedImage,
    width: u32,
    height: u32,
    quality: RenderQuality,
) -> RenderResult<RgbaImage> {
    let source = image.to_buffer()?;
    let (width, height) = (width.max(1), height.max(1));
    Ok(
        match resample_plan((image.width, image.height), (width, height), quality) {
            ResamplePlan::Copy => source,
            ResamplePlan::Single(filter) => {
                image::imageops::resize(&source, width, height, filter)
            }
            ResamplePlan::TwoPass(mid_w, mid_h) => {
                let intermediate =
                    image::imageops::resize(&source, mid_w, mid_h, FilterType::CatmullRom);
                image::imageops::resize(&intermediate, width, height, FilterType::Lanczos3)
            }
        },
    )
}

/// Encode RGBA pixels as PNG.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_png(image: &RgbaImage) -> RenderResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

/// Destination pixel size for a page rectangle at `scale`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn pixel_size(rect: &Rect, scale: f32) -> (u32, u32) {
    let w = (rect.width * scale).round().max(1.0) as u32;
    let h = (rect.height * scale).round().max(1.0) as u32;
    (w, h)
}
