//! Cropping to a pixel rectangle.
//!
//! # Coordinate System
//!
//! - (0, 0) = top-left corner
//! - The rectangle is half-open: a crop whose right edge equals the image
//!   width is valid, one pixel more is not.

use image::DynamicImage;

use crate::error::{ImageError, Result};
use crate::options::CropOptions;

/// Check a crop rectangle against an image of `image_width` x `image_height`.
///
/// Checks run in this order: dimensions, position, bounds. Bounds are
/// computed in `i64` so `x + width` cannot overflow.
pub fn validate_crop(options: &CropOptions, image_width: u32, image_height: u32) -> Result<()> {
    if options.width <= 0 || options.height <= 0 {
        return Err(ImageError::InvalidDimensions {
            width: options.width as i64,
            height: options.height as i64,
        });
    }
    if options.x < 0 || options.y < 0 {
        return Err(ImageError::InvalidPosition {
            x: options.x as i64,
            y: options.y as i64,
        });
    }

    let right = options.x as i64 + options.width as i64;
    let bottom = options.y as i64 + options.height as i64;
    if right > image_width as i64 || bottom > image_height as i64 {
        return Err(ImageError::InvalidBounds {
            x: options.x as i64,
            y: options.y as i64,
            width: options.width as i64,
            height: options.height as i64,
            image_width,
            image_height,
        });
    }
    Ok(())
}

/// Crop an image to the rectangle described by `options`.
///
/// # Errors
///
/// - `InvalidDimensions` if width or height is not positive
/// - `InvalidPosition` if x or y is negative
/// - `InvalidBounds` if the rectangle extends past the image
pub fn apply_crop(image: &DynamicImage, options: &CropOptions) -> Result<DynamicImage> {
    validate_crop(options, image.width(), image.height())?;

    // Fast path: full crop returns a clone
    if options.x == 0
        && options.y == 0
        && options.width as u32 == image.width()
        && options.height as u32 == image.height()
    {
        return Ok(image.clone());
    }

    Ok(image.crop_imm(
        options.x as u32,
        options.y as u32,
        options.width as u32,
        options.height as u32,
    ))
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: a rectangle inside the image always crops to its own size.
        #[test]
        fn prop_in_bounds_crop_has_requested_size(
            (width, height) in (1u32..=64, 1u32..=64),
            fx in 0.0f64..1.0,
            fy in 0.0f64..1.0,
            fw in 0.0f64..=1.0,
            fh in 0.0f64..=1.0,
        ) {
            let x = (fx * width as f64) as u32;
            let y = (fy * height as f64) as u32;
            let w = ((fw * (width - x) as f64) as u32).max(1);
            let h = ((fh * (height - y) as f64) as u32).max(1);

            let img = DynamicImage::ImageLuma8(image::GrayImage::new(width, height));
            let result = apply_crop(&img, &CropOptions::new(x as i32, y as i32, w as i32, h as i32)).unwrap();
            prop_assert_eq!(result.width(), w);
            prop_assert_eq!(result.height(), h);
        }

        /// Property: validation agrees with the bounds formula.
        #[test]
        fn prop_validation_matches_formula(
            (width, height) in (1u32..=64, 1u32..=64),
            x in 0i32..=80,
            y in 0i32..=80,
            w in 1i32..=80,
            h in 1i32..=80,
        ) {
            let fits = x as i64 + w as i64 <= width as i64 && y as i64 + h as i64 <= height as i64;
            let result = validate_crop(&CropOptions::new(x, y, w, h), width, height);
            prop_assert_eq!(result.is_ok(), fits);
        }
    }
}
