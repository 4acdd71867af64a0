//! Thumbnails, dimensions, EXIF and content sniffing for uploaded images.
//!
//! Everything here works on in-memory bytes and is synchronous; callers on an
//! async runtime should run it on a blocking thread.

use std::collections::BTreeMap;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default bounding box for generated thumbnails.
pub const THUMBNAIL_BOX: (u32, u32) = (400, 400);

/// JPEG quality used for thumbnails.
pub const THUMBNAIL_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("failed to encode thumbnail: {0}")]
    Encode(String),
}

/// Camera metadata pulled from an image's primary EXIF directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExifData {
    #[schema(example = "Canon")]
    pub camera_make: Option<String>,
    #[schema(example = "EOS R5")]
    pub camera_model: Option<String>,
    #[schema(example = "2024:05:01 14:03:22")]
    pub datetime_original: Option<String>,
    /// Every primary-IFD tag, keyed by tag name.
    pub tags: BTreeMap<String, String>,
}

/// Determine the MIME type from the leading bytes of a file.
///
/// Returns `None` when the content is not a recognised image format.
pub fn detect_mime(bytes: &[u8]) -> Option<&'static str> {
    if let Some(mime) = detect_heif(bytes) {
        return Some(mime);
    }
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

/// ISO-BMFF `ftyp` brands used by HEIC/HEIF stills.
fn detect_heif(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 12 || &bytes[4..8] != b"ftyp" {
        return None;
    }
    match &bytes[8..12] {
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" => Some("image/heic"),
        b"mif1" | b"msf1" | b"heif" => Some("image/heif"),
        _ => None,
    }
}

/// Pixel dimensions read from the image header, or `None` if it can't be parsed.
pub fn dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Best-effort EXIF extraction.
///
/// `None` means the image carries no readable EXIF block. A block that is
/// present but lacks a given tag yields `Some` with that field unset.
pub fn extract_exif(bytes: &[u8]) -> Option<ExifData> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;

    let text = |tag: exif::Tag| {
        exif.get_field(tag, exif::In::PRIMARY)
            .map(|f| clean_value(&f.display_value().to_string()))
            .filter(|s| !s.is_empty())
    };

    let tags = exif
        .fields()
        .filter(|f| f.ifd_num == exif::In::PRIMARY)
        .map(|f| (f.tag.to_string(), clean_value(&f.display_value().to_string())))
        .collect();

    Some(ExifData {
        camera_make: text(exif::Tag::Make),
        camera_model: text(exif::Tag::Model),
        datetime_original: text(exif::Tag::DateTimeOriginal),
        tags,
    })
}

fn clean_value(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

/// Build a JPEG thumbnail that fits within `max_width` x `max_height`.
///
/// Transparent pixels are composited onto white. Images already inside the
/// box keep their size.
pub fn generate_thumbnail(
    bytes: &[u8],
    max_width: u32,
    max_height: u32,
) -> Result<Vec<u8>, ImagingError> {
    let img = image::load_from_memory(bytes).map_err(|e| ImagingError::Decode(e.to_string()))?;

    let flattened = DynamicImage::ImageRgb8(flatten_onto_white(&img));
    let resized = if flattened.width() > max_width || flattened.height() > max_height {
        flattened.resize(max_width, max_height, FilterType::Lanczos3)
    } else {
        flattened
    };

    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, THUMBNAIL_QUALITY);
    resized
        .write_with_encoder(encoder)
        .map_err(|e| ImagingError::Encode(e.to_string()))?;

    Ok(buf.into_inner())
}

fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
        let [r, g, b, a] = src.0;
        let alpha = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        dst.0 = [blend(r), blend(g), blend(b)];
    }
    out
}
