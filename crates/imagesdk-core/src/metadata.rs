//! Image metadata snapshots and EXIF density lookup.

use std::io::Cursor;

use exif::{In, Reader, Tag, Value};
use image::ColorType;
use serde::{Deserialize, Serialize};

/// Density reported when the source carries no resolution tags.
pub const DEFAULT_DENSITY: f64 = 72.0;

/// EXIF `ResolutionUnit` value for centimetres.
const UNIT_CENTIMETRE: u32 = 3;
const CM_PER_INCH: f64 = 2.54;

/// Point-in-time description of an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub width: u32,
    pub height: u32,
    /// Number of bands (1-4).
    pub channels: u32,
    /// Loader-style format tag, e.g. `jpegload` or `pngload_buffer`.
    pub format: String,
    /// Interpretation name, e.g. `srgb` or `b-w`.
    pub colorspace: String,
    /// Horizontal density in pixels per inch.
    pub density_x: f64,
    /// Vertical density in pixels per inch.
    pub density_y: f64,
    /// Size of the source file in bytes; 0 for in-memory sources.
    pub file_size: u64,
}

impl ImageMeta {
    /// The record reported for a null or unknown handle.
    pub fn zeroed() -> Self {
        Self {
            width: 0,
            height: 0,
            channels: 0,
            format: String::new(),
            colorspace: String::new(),
            density_x: 0.0,
            density_y: 0.0,
            file_size: 0,
        }
    }
}

/// Colorspace name for a pixel layout.
pub fn colorspace_name(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 | ColorType::La8 => "b-w",
        ColorType::L16 | ColorType::La16 => "grey16",
        ColorType::Rgb8 | ColorType::Rgba8 => "srgb",
        ColorType::Rgb16 | ColorType::Rgba16 => "rgb16",
        ColorType::Rgb32F | ColorType::Rgba32F => "scrgb",
        _ => "unknown",
    }
}

/// Read the EXIF resolution of an encoded image, in pixels per inch.
///
/// Returns `None` if the container has no EXIF block or no usable
/// `XResolution`. A missing `YResolution` mirrors the horizontal value.
pub fn read_density(bytes: &[u8]) -> Option<(f64, f64)> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;

    let x = rational_field(&exif, Tag::XResolution)?;
    let y = rational_field(&exif, Tag::YResolution).unwrap_or(x);

    let unit = exif
        .get_field(Tag::ResolutionUnit, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(2);

    if unit == UNIT_CENTIMETRE {
        Some((x * CM_PER_INCH, y * CM_PER_INCH))
    } else {
        Some((x, y))
    }
}

fn rational_field(exif: &exif::Exif, tag: Tag) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let value = match &field.value {
        Value::Rational(values) => values.first()?.to_f64(),
        other => other.get_uint(0)? as f64,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}
