//! Alpha-band operations: overall opacity and watermark compositing.
//!
//! Blending itself is done by `imageops::overlay`; this module only prepares
//! the alpha band of its inputs.

use image::imageops::overlay;
use image::{DynamicImage, ImageBuffer, Pixel};

use crate::error::Result;
use crate::options::clamp_opacity;
use crate::pixel::{bytes_per_channel, map_buffer, with_alpha, Sample};

/// Multiply the alpha band of an image by `opacity`.
///
/// An opaque alpha band is added first when the image has none, so the
/// result always carries alpha. Colour bands are copied unchanged.
pub fn set_opacity(image: &DynamicImage, opacity: f64) -> Result<DynamicImage> {
    let factor = clamp_opacity(opacity);
    let with_band = with_alpha(image);
    Ok(scale_alpha(&with_band, factor))
}

/// Composite `mark` over `base` with its top-left corner at (x, y).
///
/// The watermark's alpha is scaled by the clamped `opacity` before blending.
/// Offsets may be negative and the mark may hang off any edge; only the
/// overlapping region is blended. The result is RGBA at the base image's
/// bit depth.
pub fn composite_watermark(
    base: &DynamicImage,
    mark: &DynamicImage,
    x: i32,
    y: i32,
    opacity: f64,
) -> Result<DynamicImage> {
    let factor = clamp_opacity(opacity);
    let mut top = with_alpha(mark);
    if factor < 1.0 {
        top = scale_alpha(&top, factor);
    }

    let (x, y) = (x as i64, y as i64);
    let composited = match bytes_per_channel(base.color()) {
        1 => {
            let mut bottom = base.to_rgba8();
            overlay(&mut bottom, &top.to_rgba8(), x, y);
            DynamicImage::ImageRgba8(bottom)
        }
        2 => {
            let mut bottom = base.to_rgba16();
            overlay(&mut bottom, &top.to_rgba16(), x, y);
            DynamicImage::ImageRgba16(bottom)
        }
        _ => {
            let mut bottom = base.to_rgba32f();
            overlay(&mut bottom, &top.to_rgba32f(), x, y);
            DynamicImage::ImageRgba32F(bottom)
        }
    };
    Ok(composited)
}

/// Scale the last band of an image that has alpha. Images without alpha are
/// returned unchanged.
fn scale_alpha(image: &DynamicImage, factor: f64) -> DynamicImage {
    let has_alpha = image.color().has_alpha();
    map_buffer!(image, |buf| scale_alpha_buffer(buf, factor, has_alpha))
}

fn scale_alpha_buffer<P>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    factor: f64,
    has_alpha: bool,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
    P::Subpixel: Sample,
{
    let mut out = src.clone();
    if !has_alpha {
        return out;
    }
    let channels = P::CHANNEL_COUNT as usize;
    for pixel in out.chunks_exact_mut(channels) {
        if let Some(alpha) = pixel.last_mut() {
            *alpha = <P::Subpixel as Sample>::from_f64(Sample::to_f64(*alpha) * factor);
        }
    }
    out
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: alpha becomes round(alpha * p), colour bands are untouched.
        #[test]
        fn prop_opacity_formula(
            r in any::<u8>(),
            g in any::<u8>(),
            b in any::<u8>(),
            a in any::<u8>(),
            p in 0.0f64..=1.0,
        ) {
            let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(1, 1, image::Rgba([r, g, b, a])));
            let out = set_opacity(&img, p).unwrap().to_rgba8();
            let px = out.get_pixel(0, 0).0;
            prop_assert_eq!(&px[..3], &[r, g, b]);
            prop_assert_eq!(px[3], (a as f64 * p).round() as u8);
        }

        /// Property: compositing never changes the base dimensions.
        #[test]
        fn prop_watermark_keeps_size(
            (bw, bh) in (1u32..=16, 1u32..=16),
            (mw, mh) in (1u32..=16, 1u32..=16),
            x in -20i32..=20,
            y in -20i32..=20,
            opacity in -1.0f64..=2.0,
        ) {
            let base = DynamicImage::ImageRgb8(image::RgbImage::new(bw, bh));
            let mark = DynamicImage::ImageRgb8(image::RgbImage::new(mw, mh));
            let out = composite_watermark(&base, &mark, x, y, opacity).unwrap();
            prop_assert_eq!((out.width(), out.height()), (bw, bh));
        }
    }
}
