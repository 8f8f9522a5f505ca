//! Loading images from files and memory.
//!
//! The container format is sniffed from the content, never from the file
//! extension. Decoding runs under the configured [`Config`] limits, and the
//! source's EXIF density is captured alongside the pixels.
//!
//! Pixels are kept exactly as stored; EXIF orientation is not applied.

mod source;

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};

use crate::config::Config;
use crate::error::{ImageError, Result};
use crate::owned::Image;

pub use source::{format_tag, SourceInfo, SUPPORTED_FORMATS};

/// Load an image from a file.
///
/// # Errors
///
/// - `InvalidPath` for an empty path
/// - `LoadFailed` if the file cannot be read or its payload is corrupt
/// - `InvalidFormat` if the content is not a supported format
/// - `OutOfMemory` if the image exceeds the configured limits
pub fn load_path(path: impl AsRef<Path>, config: &Config) -> Result<Image> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ImageError::InvalidPath("path is empty".to_string()));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| ImageError::LoadFailed(format!("{}: {}", path.display(), e)))?;
    if bytes.is_empty() {
        return Err(ImageError::LoadFailed(format!("{}: file is empty", path.display())));
    }

    let (pixels, format) = decode(&bytes, config)?;
    let source = SourceInfo::new(format_tag(format, false), &bytes, bytes.len() as u64);
    tracing::debug!(
        path = %path.display(),
        format = %source.format,
        width = pixels.width(),
        height = pixels.height(),
        "loaded image from file"
    );
    Ok(Image::new(pixels, source))
}

/// Load an image from an in-memory encoded buffer.
///
/// Error cases match [`load_path`]; an empty buffer is a `LoadFailed`.
pub fn load_bytes(bytes: &[u8], config: &Config) -> Result<Image> {
    if bytes.is_empty() {
        return Err(ImageError::LoadFailed("buffer is empty".to_string()));
    }

    let (pixels, format) = decode(bytes, config)?;
    let source = SourceInfo::new(format_tag(format, true), bytes, 0);
    tracing::debug!(
        len = bytes.len(),
        format = %source.format,
        width = pixels.width(),
        height = pixels.height(),
        "loaded image from buffer"
    );
    Ok(Image::new(pixels, source))
}

/// Sniff and decode `bytes` under the configured limits.
fn decode(bytes: &[u8], config: &Config) -> Result<(DynamicImage, ImageFormat)> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::LoadFailed(e.to_string()))?;

    let format = match reader.format() {
        Some(format) if SUPPORTED_FORMATS.contains(&format) => format,
        _ => return Err(ImageError::InvalidFormat),
    };

    reader.limits(config.limits());
    let pixels = reader.decode().map_err(decode_error)?;
    Ok((pixels, format))
}

/// Decoder errors on a recognised container mean a corrupt payload.
fn decode_error(err: image::ImageError) -> ImageError {
    match err {
        image::ImageError::Decoding(e) => ImageError::LoadFailed(e.to_string()),
        other => ImageError::from(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([10, 20, 30, 255]),
        ));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_load_bytes_png() {
        let image = load_bytes(&png_bytes(8, 4), &Config::default()).unwrap();
        assert_eq!(image.dimensions(), (8, 4));
        let meta = image.metadata();
        assert_eq!(meta.format, "pngload_buffer");
        assert_eq!(meta.channels, 4);
        assert_eq!(meta.file_size, 0);
    }

    #[test]
    fn test_load_bytes_jpeg() {
        let image = load_bytes(&jpeg_bytes(5, 7), &Config::default()).unwrap();
        assert_eq!(image.dimensions(), (5, 7));
        assert_eq!(image.metadata().format, "jpegload_buffer");
    }

    #[test]
    fn test_load_path_reports_file_size() {
        let bytes = png_bytes(3, 3);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let image = load_path(file.path(), &Config::default()).unwrap();
        let meta = image.metadata();
        assert_eq!(meta.format, "pngload");
        assert_eq!(meta.file_size, bytes.len() as u64);
        assert_eq!(meta.density_x, crate::metadata::DEFAULT_DENSITY);
    }

    #[test]
    fn test_load_path_ignores_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actually_png.jpg");
        std::fs::write(&path, png_bytes(2, 2)).unwrap();

        let image = load_path(&path, &Config::default()).unwrap();
        assert_eq!(image.metadata().format, "pngload");
    }

    #[test]
    fn test_empty_path() {
        assert!(matches!(
            load_path("", &Config::default()),
            Err(ImageError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_path(dir.path().join("missing.png"), &Config::default()),
            Err(ImageError::LoadFailed(_))
        ));
    }

    #[test]
    fn test_empty_bytes() {
        assert!(matches!(
            load_bytes(&[], &Config::default()),
            Err(ImageError::LoadFailed(_))
        ));
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            load_bytes(b"definitely not an image", &Config::default()),
            Err(ImageError::InvalidFormat)
        ));
    }

    #[test]
    fn test_truncated_png() {
        let bytes = png_bytes(16, 16);
        let truncated = &bytes[..bytes.len() / 2];
        let result = load_bytes(truncated, &Config::default());
        assert!(matches!(result, Err(ImageError::LoadFailed(_))), "{:?}", result.err());
    }

    #[test]
    fn test_dimension_limit_is_memory_failure() {
        let mut config = Config::default();
        config.max_image_width = Some(4);
        let result = load_bytes(&png_bytes(8, 2), &config);
        assert!(matches!(result, Err(ImageError::OutOfMemory(_))));
    }
}
