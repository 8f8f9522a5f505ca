//! PNG encoding.
//!
//! The `image` codec writes the stream. Interlaced output is produced by
//! re-encoding that stream with oxipng, which only changes the layout: bit
//! depth and color type are left as written.

use std::borrow::Cow;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, DynamicImage, ImageEncoder};
use oxipng::{Interlacing, Options};

use super::{reserve_output, EncodedBuffer};
use crate::error::{ImageError, Result};
use crate::options::PngOptions;

/// Map a 0-9 compression level onto the delegate's presets.
pub fn compression_type(level: u8) -> CompressionType {
    match level {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// oxipng preset for a 0-9 compression level.
fn oxipng_preset(level: u8) -> u8 {
    match level {
        0..=2 => 0,
        3..=6 => 2,
        _ => 4,
    }
}

/// Encode an image to PNG bytes.
///
/// The band layout is kept. 8- and 16-bit data is written as is; float data
/// is converted to 16-bit. With `interlace` the output uses Adam7.
///
/// # Errors
///
/// Returns `OutOfMemory` if the output buffer cannot be reserved and
/// `EncodeFailed` if the encoder rejects the image.
pub fn encode_png(image: &DynamicImage, options: &PngOptions) -> Result<EncodedBuffer> {
    let level = options.effective_compression();

    let source = png_compatible(image);
    let (width, height) = (source.width(), source.height());

    let mut out = reserve_output(source.as_bytes().len() / 2 + 1024)?;
    let encoder =
        PngEncoder::new_with_quality(&mut out, compression_type(level), FilterType::Adaptive);
    encoder
        .write_image(source.as_bytes(), width, height, source.color().into())
        .map_err(|e| ImageError::EncodeFailed(format!("png: {e}")))?;

    if options.interlace {
        out = interlace_adam7(&out, level)?;
    }

    tracing::debug!(
        level,
        interlaced = options.interlace,
        width,
        height,
        len = out.len(),
        "encoded png"
    );
    Ok(EncodedBuffer(out))
}

/// Rewrite a PNG stream with Adam7 interlacing.
fn interlace_adam7(png: &[u8], level: u8) -> Result<Vec<u8>> {
    let mut opts = Options::from_preset(oxipng_preset(level));
    opts.interlace = Some(Interlacing::Adam7);
    // Keep the result even when it is larger than the input
    opts.force = true;
    opts.bit_depth_reduction = false;
    opts.color_type_reduction = false;
    opts.palette_reduction = false;
    opts.grayscale_reduction = false;

    oxipng::optimize_from_memory(png, &opts)
        .map_err(|e| ImageError::EncodeFailed(format!("png interlace: {e}")))
}

/// Borrow the image if PNG can store it directly, otherwise convert.
fn png_compatible(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image.color() {
        ColorType::L8
        | ColorType::La8
        | ColorType::Rgb8
        | ColorType::Rgba8
        | ColorType::L16
        | ColorType::La16
        | ColorType::Rgb16
        | ColorType::Rgba16 => Cow::Borrowed(image),
        ColorType::Rgb32F => Cow::Owned(DynamicImage::ImageRgb16(image.to_rgb16())),
        _ => Cow::Owned(DynamicImage::ImageRgba16(image.to_rgba16())),
    }
}
