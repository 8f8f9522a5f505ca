//! Image rotation by an arbitrary angle.
//!
//! Multiples of 90 degrees are delegated to the `image` crate's lossless
//! rotations. Any other angle expands the canvas to the rotated bounding box
//! and warps the source into it with `imageproc`, sampling bilinearly.
//! Output pixels that map outside the source take the background color.
//!
//! The projection moves the source center to the origin, rotates clockwise
//! (y axis pointing down) and moves the origin to the canvas center:
//! ```text
//! P = translate(dst_cx, dst_cy) * rotate(θ) * translate(-src_cx, -src_cy)
//! ```
//! Float images are warped at 16 bits per channel, so values outside
//! `[0, 1]` are clamped.

use image::{ColorType, DynamicImage, ImageBuffer, Pixel, Primitive};
use imageproc::definitions::Clamp;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

use crate::error::{ImageError, Result};
use crate::pixel::{check_alloc, pixel_bytes, Sample};

const ANGLE_EPSILON: f64 = 0.001;

/// Quarter-turn classification of an angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuarterTurn {
    None,
    Cw90,
    Cw180,
    Cw270,
}

/// Map an angle to a quarter turn when it is (within tolerance) a multiple of 90.
fn quarter_turn(angle_degrees: f64) -> Option<QuarterTurn> {
    let normalized = angle_degrees.rem_euclid(360.0);
    let nearest = (normalized / 90.0).round();
    if (normalized - nearest * 90.0).abs() >= ANGLE_EPSILON {
        return None;
    }
    Some(match nearest as i64 % 4 {
        0 => QuarterTurn::None,
        1 => QuarterTurn::Cw90,
        2 => QuarterTurn::Cw180,
        _ => QuarterTurn::Cw270,
    })
}

/// Compute the dimensions of the bounding box for a rotated image.
///
/// When an image is rotated, the corners extend beyond the original bounds.
/// This function calculates the minimum bounding box that contains the
/// entire rotated image. The result is the same for θ and -θ.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    match quarter_turn(angle_degrees) {
        Some(QuarterTurn::None) | Some(QuarterTurn::Cw180) => return (width, height),
        Some(QuarterTurn::Cw90) | Some(QuarterTurn::Cw270) => return (height, width),
        None => {}
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    // new_w = |w*cos| + |h*sin|, new_h = |w*sin| + |h*cos|
    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Background fill for the exposed canvas, one value per channel.
///
/// Transparent if the image has an alpha band, opaque white for color
/// images, black for single-band images.
pub(crate) fn background_for(color: ColorType, max: f64) -> Vec<f64> {
    let channels = color.channel_count() as usize;
    if color.has_alpha() {
        vec![0.0; channels]
    } else if channels >= 3 {
        vec![max; channels]
    } else {
        vec![0.0; channels]
    }
}

/// Rotate an image clockwise by `angle_degrees`.
///
/// The image is rotated around its center and the canvas grows to fit the
/// whole result. The color type of the input is preserved.
///
/// # Errors
///
/// Returns `ImageError::InvalidDimensions` for a non-finite angle, and
/// `ImageError::OutOfMemory` when the enlarged canvas exceeds `max_alloc` or
/// cannot be allocated.
pub fn apply_rotation(
    image: &DynamicImage,
    angle_degrees: f64,
    max_alloc: Option<u64>,
) -> Result<DynamicImage> {
    if !angle_degrees.is_finite() {
        return Err(ImageError::InvalidDimensions {
            width: image.width() as i64,
            height: image.height() as i64,
        });
    }

    match quarter_turn(angle_degrees) {
        Some(QuarterTurn::None) => return Ok(image.clone()),
        Some(QuarterTurn::Cw90) => return Ok(image.rotate90()),
        Some(QuarterTurn::Cw180) => return Ok(image.rotate180()),
        Some(QuarterTurn::Cw270) => return Ok(image.rotate270()),
        None => {}
    }

    let (dst_w, dst_h) = compute_rotated_bounds(image.width(), image.height(), angle_degrees);
    let warp = Warp {
        angle_degrees,
        dst_w,
        dst_h,
        max_alloc,
    };

    use image::DynamicImage as D;
    let rotated = match image {
        D::ImageLuma8(buf) => D::ImageLuma8(warp.apply(buf, ColorType::L8)?),
        D::ImageLumaA8(buf) => D::ImageLumaA8(warp.apply(buf, ColorType::La8)?),
        D::ImageRgb8(buf) => D::ImageRgb8(warp.apply(buf, ColorType::Rgb8)?),
        D::ImageRgba8(buf) => D::ImageRgba8(warp.apply(buf, ColorType::Rgba8)?),
        D::ImageLuma16(buf) => D::ImageLuma16(warp.apply(buf, ColorType::L16)?),
        D::ImageLumaA16(buf) => D::ImageLumaA16(warp.apply(buf, ColorType::La16)?),
        D::ImageRgb16(buf) => D::ImageRgb16(warp.apply(buf, ColorType::Rgb16)?),
        D::ImageRgba16(buf) => D::ImageRgba16(warp.apply(buf, ColorType::Rgba16)?),
        D::ImageRgb32F(_) => {
            let wide = warp.apply(&image.to_rgb16(), ColorType::Rgb16)?;
            D::ImageRgb32F(D::ImageRgb16(wide).to_rgb32f())
        }
        other => {
            let wide = warp.apply(&other.to_rgba16(), ColorType::Rgba16)?;
            D::ImageRgba32F(D::ImageRgba16(wide).to_rgba32f())
        }
    };
    Ok(rotated)
}

/// Canvas and angle shared by every buffer type.
struct Warp {
    angle_degrees: f64,
    dst_w: u32,
    dst_h: u32,
    max_alloc: Option<u64>,
}

impl Warp {
    /// Source-to-canvas projection, rotating about both centers.
    fn projection(&self, src_w: u32, src_h: u32) -> Projection {
        let src_cx = (src_w as f32 - 1.0) / 2.0;
        let src_cy = (src_h as f32 - 1.0) / 2.0;
        let dst_cx = (self.dst_w as f32 - 1.0) / 2.0;
        let dst_cy = (self.dst_h as f32 - 1.0) / 2.0;

        Projection::translate(dst_cx, dst_cy)
            * Projection::rotate(self.angle_degrees.to_radians() as f32)
            * Projection::translate(-src_cx, -src_cy)
    }

    fn apply<P>(
        &self,
        src: &ImageBuffer<P, Vec<P::Subpixel>>,
        color: ColorType,
    ) -> Result<ImageBuffer<P, Vec<P::Subpixel>>>
    where
        P: Pixel + Send + Sync,
        P::Subpixel: Sample + Into<f32> + Clamp<f32> + Send + Sync,
    {
        let channels = P::CHANNEL_COUNT as usize;
        let subpixels: Vec<P::Subpixel> = background_for(color, <P::Subpixel as Sample>::MAX)
            .into_iter()
            .map(<P::Subpixel as Sample>::from_f64)
            .collect();
        let background = *P::from_slice(&subpixels);

        let bytes = pixel_bytes(self.dst_w, self.dst_h, color.bytes_per_pixel() as u64)?;
        check_alloc(bytes, self.max_alloc)?;

        let len = self.dst_w as usize * self.dst_h as usize * channels;
        let mut data: Vec<P::Subpixel> = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| ImageError::OutOfMemory(e.to_string()))?;
        data.resize(len, <P::Subpixel as Primitive>::DEFAULT_MIN_VALUE);
        let mut canvas = ImageBuffer::from_raw(self.dst_w, self.dst_h, data)
            .ok_or_else(|| ImageError::Library("rotated buffer size mismatch".to_string()))?;

        let projection = self.projection(src.width(), src.height());
        warp_into(src, &projection, Interpolation::Bilinear, background, &mut canvas);
        Ok(canvas)
    }
}
