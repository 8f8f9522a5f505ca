//! JPEG encoding.
//!
//! JPEG has no alpha channel: grey images are written as 8-bit luma, every
//! other layout as 8-bit RGB. Baseline output comes from the `image` codec;
//! progressive output from mozjpeg.

use std::panic::{self, AssertUnwindSafe};

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ExtendedColorType, ImageEncoder};
use mozjpeg::{ColorSpace, Compress};

use super::{reserve_output, EncodedBuffer};
use crate::error::{ImageError, Result};
use crate::options::JpegOptions;

/// Encode an image to JPEG bytes.
///
/// Quality outside 1-100 falls back to the default of 75. With `interlace`
/// the output is a progressive JPEG, otherwise baseline.
///
/// # Quality Guidelines
///
/// * 90-100: High quality, suitable for archival or further editing
/// * 60-80: Medium quality, acceptable for web/social media
/// * Below 60: Low quality, visible artifacts
///
/// # Errors
///
/// Returns `OutOfMemory` if the output buffer cannot be reserved and
/// `EncodeFailed` if the encoder rejects the image.
pub fn encode_jpeg(image: &DynamicImage, options: &JpegOptions) -> Result<EncodedBuffer> {
    let quality = options.effective_quality();
    let (width, height) = (image.width(), image.height());
    let grey = matches!(
        image.color(),
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16
    );
    let channels = if grey { 1 } else { 3 };
    let raw_len = width as usize * height as usize * channels;

    // JPEG output is rarely larger than a quarter of the raw samples
    let out = reserve_output(raw_len / 4 + 1024)?;
    let samples = if grey {
        image.to_luma8().into_raw()
    } else {
        image.to_rgb8().into_raw()
    };

    let out = if options.interlace {
        let color_space = if grey {
            ColorSpace::JCS_GRAYSCALE
        } else {
            ColorSpace::JCS_RGB
        };
        encode_progressive(&samples, width, height, color_space, quality, out)?
    } else {
        let layout = if grey {
            ExtendedColorType::L8
        } else {
            ExtendedColorType::Rgb8
        };
        encode_baseline(&samples, width, height, layout, quality, out)?
    };

    tracing::debug!(
        quality,
        progressive = options.interlace,
        width,
        height,
        len = out.len(),
        "encoded jpeg"
    );
    Ok(EncodedBuffer(out))
}

fn encode_baseline(
    samples: &[u8],
    width: u32,
    height: u32,
    layout: ExtendedColorType,
    quality: u8,
    mut out: Vec<u8>,
) -> Result<Vec<u8>> {
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(samples, width, height, layout)
        .map_err(|e| ImageError::EncodeFailed(format!("jpeg: {e}")))?;
    Ok(out)
}

/// Multi-scan JPEG through mozjpeg.
///
/// libjpeg reports fatal errors by unwinding, so the whole compression runs
/// under `catch_unwind`.
fn encode_progressive(
    samples: &[u8],
    width: u32,
    height: u32,
    color_space: ColorSpace,
    quality: u8,
    out: Vec<u8>,
) -> Result<Vec<u8>> {
    let encoded = panic::catch_unwind(AssertUnwindSafe(|| -> std::io::Result<Vec<u8>> {
        let mut comp = Compress::new(color_space);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_progressive_mode();

        let mut started = comp.start_compress(out)?;
        started.write_scanlines(samples)?;
        started.finish()
    }));

    match encoded {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => Err(ImageError::EncodeFailed(format!("progressive jpeg: {e}"))),
        Err(_) => Err(ImageError::EncodeFailed(
            "progressive jpeg: encoder aborted".to_string(),
        )),
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use image::GenericImageView;
    use proptest::prelude::*;

    proptest! {
        /// Property: decoding the output gives back the same dimensions.
        #[test]
        fn prop_jpeg_keeps_dimensions(
            (width, height) in (1u32..=48, 1u32..=48),
            quality in -10i32..=120,
        ) {
            let img = DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
            let jpeg = encode_jpeg(&img, &JpegOptions::new(quality, false)).unwrap();
            let decoded = image::load_from_memory(&jpeg).unwrap();
            prop_assert_eq!(decoded.dimensions(), (width, height));
        }
    }
}
