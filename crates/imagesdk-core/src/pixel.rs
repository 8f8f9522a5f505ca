//! Subpixel conversions and allocation checks shared by the transforms.

use image::{ColorType, DynamicImage};

use crate::error::{ImageError, Result};

/// A subpixel type the transforms can sample in `f64`.
pub(crate) trait Sample: Copy {
    /// Value of a fully saturated channel.
    const MAX: f64;

    fn to_f64(self) -> f64;

    /// Convert back, rounding and saturating for integer types.
    fn from_f64(value: f64) -> Self;
}

impl Sample for u8 {
    const MAX: f64 = u8::MAX as f64;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value.round().clamp(0.0, <Self as Sample>::MAX) as u8
    }
}

impl Sample for u16 {
    const MAX: f64 = u16::MAX as f64;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value.round().clamp(0.0, <Self as Sample>::MAX) as u16
    }
}

impl Sample for f32 {
    const MAX: f64 = 1.0;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

/// Apply `$body` to the typed buffer inside a `DynamicImage`, rebuilding a
/// `DynamicImage` of the same variant from the result.
///
/// Variants added to the delegate in the future are routed through RGBA32F.
macro_rules! map_buffer {
    ($image:expr, |$buf:ident| $body:expr) => {{
        use image::DynamicImage as D;
        match $image {
            D::ImageLuma8($buf) => D::ImageLuma8($body),
            D::ImageLumaA8($buf) => D::ImageLumaA8($body),
            D::ImageRgb8($buf) => D::ImageRgb8($body),
            D::ImageRgba8($buf) => D::ImageRgba8($body),
            D::ImageLuma16($buf) => D::ImageLuma16($body),
            D::ImageLumaA16($buf) => D::ImageLumaA16($body),
            D::ImageRgb16($buf) => D::ImageRgb16($body),
            D::ImageRgba16($buf) => D::ImageRgba16($body),
            D::ImageRgb32F($buf) => D::ImageRgb32F($body),
            D::ImageRgba32F($buf) => D::ImageRgba32F($body),
            other => {
                let converted = other.to_rgba32f();
                let $buf = &converted;
                D::ImageRgba32F($body)
            }
        }
    }};
}

pub(crate) use map_buffer;

/// Storage width of one subpixel, in bytes.
pub(crate) fn bytes_per_channel(color: ColorType) -> u8 {
    let channels = color.channel_count().max(1);
    color.bytes_per_pixel() / channels
}

/// Size in bytes of a `width` x `height` buffer, or `OutOfMemory` on overflow.
pub(crate) fn pixel_bytes(width: u32, height: u32, bytes_per_pixel: u64) -> Result<u64> {
    (width as u64)
        .checked_mul(height as u64)
        .and_then(|pixels| pixels.checked_mul(bytes_per_pixel))
        .ok_or_else(|| {
            ImageError::OutOfMemory(format!("{width}x{height} pixel buffer overflows"))
        })
}

/// Refuse an allocation of `bytes` before the delegate attempts it.
///
/// The request must fit `max_alloc` when set, and must be reservable right
/// now. The trial reservation is released before returning.
pub(crate) fn check_alloc(bytes: u64, max_alloc: Option<u64>) -> Result<()> {
    if let Some(limit) = max_alloc {
        if bytes > limit {
            return Err(ImageError::OutOfMemory(format!(
                "{bytes} bytes exceeds the {limit} byte allocation limit"
            )));
        }
    }
    let len = usize::try_from(bytes)
        .map_err(|_| ImageError::OutOfMemory(format!("{bytes} bytes exceeds address space")))?;
    let mut trial: Vec<u8> = Vec::new();
    trial
        .try_reserve_exact(len)
        .map_err(|e| ImageError::OutOfMemory(format!("{bytes} bytes: {e}")))?;
    Ok(())
}

/// Same image with an opaque alpha band appended when it has none.
pub(crate) fn with_alpha(image: &DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        return image.clone();
    }
    match image.color() {
        ColorType::L8 => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgba8(image.to_rgba8()),
        ColorType::L16 => DynamicImage::ImageLumaA16(image.to_luma_alpha16()),
        ColorType::Rgb16 => DynamicImage::ImageRgba16(image.to_rgba16()),
        _ => DynamicImage::ImageRgba32F(image.to_rgba32f()),
    }
}
