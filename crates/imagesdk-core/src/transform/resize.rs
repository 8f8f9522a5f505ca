//! Resizing by per-axis scale factors.
//!
//! Scale factors are derived from the requested target size; resampling is
//! delegated to the `image` crate's Lanczos3 filter.

use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::{ImageError, Result};
use crate::options::ResizeOptions;
use crate::pixel::{check_alloc, pixel_bytes};

/// Filter used for every resize.
pub const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Bytes per pixel of the RGBA f32 buffer the separable filter goes through.
const INTERMEDIATE_BYTES_PER_PIXEL: u64 = 16;

/// Compute the horizontal and vertical scale factors for a resize.
///
/// With `maintain_aspect`, a single uniform factor is used: the smaller of the
/// two per-axis ratios when both targets are given, otherwise the ratio of
/// whichever target is set. Without it, each axis scales independently and an
/// unset axis borrows the other axis's factor.
///
/// # Errors
///
/// Returns `ImageError::InvalidDimensions` if neither target is positive or the
/// source is empty.
pub fn scale_factors(
    src_width: u32,
    src_height: u32,
    options: &ResizeOptions,
) -> Result<(f64, f64)> {
    if options.width <= 0 && options.height <= 0 {
        return Err(ImageError::InvalidDimensions {
            width: options.width as i64,
            height: options.height as i64,
        });
    }
    if src_width == 0 || src_height == 0 {
        return Err(ImageError::InvalidDimensions {
            width: src_width as i64,
            height: src_height as i64,
        });
    }

    let ratio_x = options.width as f64 / src_width as f64;
    let ratio_y = options.height as f64 / src_height as f64;

    if options.maintain_aspect {
        let scale = if options.width > 0 && options.height > 0 {
            ratio_x.min(ratio_y)
        } else if options.width > 0 {
            ratio_x
        } else {
            ratio_y
        };
        return Ok((scale, scale));
    }

    let mut scale_x = if options.width > 0 { ratio_x } else { 1.0 };
    let mut scale_y = if options.height > 0 { ratio_y } else { 1.0 };
    if options.width <= 0 {
        scale_x = scale_y;
    } else if options.height <= 0 {
        scale_y = scale_x;
    }
    Ok((scale_x, scale_y))
}

/// Output dimensions for the given scale factors, never below 1x1.
pub fn scaled_dimensions(src_width: u32, src_height: u32, scale_x: f64, scale_y: f64) -> (u32, u32) {
    let width = (src_width as f64 * scale_x).round().clamp(1.0, u32::MAX as f64) as u32;
    let height = (src_height as f64 * scale_y).round().clamp(1.0, u32::MAX as f64) as u32;
    (width, height)
}

/// Bytes the resampler allocates to produce a `width` x `height` result.
///
/// Counts the output buffer plus the vertical pass, which is `src_width`
/// wide and `height` tall.
pub fn resize_alloc_bytes(image: &DynamicImage, width: u32, height: u32) -> Result<u64> {
    let output = pixel_bytes(width, height, image.color().bytes_per_pixel() as u64)?;
    let intermediate = pixel_bytes(image.width(), height, INTERMEDIATE_BYTES_PER_PIXEL)?;
    output.checked_add(intermediate).ok_or_else(|| {
        ImageError::OutOfMemory(format!("resize to {width}x{height} overflows"))
    })
}

/// Resize an image according to `options`.
///
/// Returns a new image; the source is never modified. If the computed size
/// equals the source size the pixels are copied unchanged.
///
/// # Errors
///
/// Returns `ImageError::OutOfMemory` when the buffers for the result would
/// overflow, exceed `max_alloc`, or cannot be reserved.
pub fn resize(
    image: &DynamicImage,
    options: &ResizeOptions,
    max_alloc: Option<u64>,
) -> Result<DynamicImage> {
    let (src_width, src_height) = (image.width(), image.height());
    let (scale_x, scale_y) = scale_factors(src_width, src_height, options)?;
    let (width, height) = scaled_dimensions(src_width, src_height, scale_x, scale_y);

    // Fast path: if dimensions match, just clone
    if width == src_width && height == src_height {
        return Ok(image.clone());
    }

    check_alloc(resize_alloc_bytes(image, width, height)?, max_alloc)?;
    Ok(image.resize_exact(width, height, RESIZE_FILTER))
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: with one side set, the other side follows the same ratio.
        #[test]
        fn prop_aspect_single_side_keeps_ratio(
            (src_w, src_h) in (10u32..=2000, 10u32..=2000),
            target in 1i32..=1000,
            use_width in any::<bool>(),
        ) {
            let opts = if use_width {
                ResizeOptions::new(target, 0, true)
            } else {
                ResizeOptions::new(0, target, true)
            };
            let (sx, sy) = scale_factors(src_w, src_h, &opts).unwrap();
            let (w, h) = scaled_dimensions(src_w, src_h, sx, sy);

            if use_width {
                prop_assert_eq!(w, target as u32);
                let expected = src_h as f64 * target as f64 / src_w as f64;
                prop_assert!((h as f64 - expected.max(1.0)).abs() <= 1.0);
            } else {
                prop_assert_eq!(h, target as u32);
                let expected = src_w as f64 * target as f64 / src_h as f64;
                prop_assert!((w as f64 - expected.max(1.0)).abs() <= 1.0);
            }
        }

        /// Property: with both sides set, the result fits inside the box.
        #[test]
        fn prop_aspect_fits_box(
            (src_w, src_h) in (10u32..=2000, 10u32..=2000),
            (box_w, box_h) in (1i32..=1000, 1i32..=1000),
        ) {
            let opts = ResizeOptions::new(box_w, box_h, true);
            let (sx, sy) = scale_factors(src_w, src_h, &opts).unwrap();
            let (w, h) = scaled_dimensions(src_w, src_h, sx, sy);
            prop_assert!(w <= box_w as u32 || w == 1);
            prop_assert!(h <= box_h as u32 || h == 1);
        }

        /// Property: factors are always positive and finite for valid input.
        #[test]
        fn prop_factors_positive(
            (src_w, src_h) in (1u32..=5000, 1u32..=5000),
            width in -10i32..=1000,
            height in -10i32..=1000,
            maintain in any::<bool>(),
        ) {
            prop_assume!(width > 0 || height > 0);
            let (sx, sy) = scale_factors(src_w, src_h, &ResizeOptions::new(width, height, maintain)).unwrap();
            prop_assert!(sx.is_finite() && sx > 0.0);
            prop_assert!(sy.is_finite() && sy > 0.0);
        }
    }
}
