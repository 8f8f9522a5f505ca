//! What is remembered about where an image came from.

use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::metadata::{read_density, DEFAULT_DENSITY};

/// Container formats the loader accepts.
pub const SUPPORTED_FORMATS: [ImageFormat; 6] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Tiff,
    ImageFormat::Bmp,
];

/// Facts captured at load time. They are not updated by transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Loader-style format tag.
    pub format: String,
    /// (x, y) density in pixels per inch.
    pub density: (f64, f64),
    /// Source file length; 0 for in-memory sources.
    pub file_size: u64,
}

impl SourceInfo {
    /// Build source info, reading density from the encoded bytes.
    pub fn new(format: String, encoded: &[u8], file_size: u64) -> Self {
        Self {
            format,
            density: read_density(encoded).unwrap_or((DEFAULT_DENSITY, DEFAULT_DENSITY)),
            file_size,
        }
    }

    /// Source info for pixels that were not loaded from an encoded source.
    pub fn unknown() -> Self {
        Self {
            format: String::new(),
            density: (DEFAULT_DENSITY, DEFAULT_DENSITY),
            file_size: 0,
        }
    }
}

/// Loader-style tag for a format: `pngload`, or `pngload_buffer` for
/// in-memory sources.
pub fn format_tag(format: ImageFormat, from_buffer: bool) -> String {
    let name = match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Bmp => "bmp",
        _ => "unknown",
    };
    if from_buffer {
        format!("{name}load_buffer")
    } else {
        format!("{name}load")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tags() {
        assert_eq!(format_tag(ImageFormat::Jpeg, false), "jpegload");
        assert_eq!(format_tag(ImageFormat::Png, true), "pngload_buffer");
        assert_eq!(format_tag(ImageFormat::WebP, false), "webpload");
    }

    #[test]
    fn test_density_defaults_without_exif() {
        let info = SourceInfo::new("pngload".to_string(), b"no exif here", 12);
        assert_eq!(info.density, (72.0, 72.0));
        assert_eq!(info.file_size, 12);
    }
}
