//! The owned image behind every handle.

use image::DynamicImage;

use crate::decode::SourceInfo;
use crate::encode::{self, EncodedBuffer};
use crate::error::Result;
use crate::metadata::{colorspace_name, ImageMeta};
use crate::options::{
    CropOptions, JpegOptions, OpacityOptions, PngOptions, ResizeOptions, RotateOptions,
    WatermarkOptions,
};
use crate::transform;

/// A decoded image and what is known about its source.
///
/// Mutating operations are transactional: the new pixels are computed from a
/// borrow of the current ones and only replace them on success, so a failed
/// operation leaves the image untouched.
#[derive(Debug, Clone)]
pub struct Image {
    pixels: DynamicImage,
    source: SourceInfo,
}

impl Image {
    pub fn new(pixels: DynamicImage, source: SourceInfo) -> Self {
        Self { pixels, source }
    }

    /// Wrap pixels that did not come from an encoded source.
    pub fn from_pixels(pixels: DynamicImage) -> Self {
        Self::new(pixels, SourceInfo::unknown())
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.pixels.width(), self.pixels.height())
    }

    pub fn into_pixels(self) -> DynamicImage {
        self.pixels
    }

    /// Resize in place. `max_alloc` caps the bytes the resampler may allocate.
    pub fn resize(&mut self, options: &ResizeOptions, max_alloc: Option<u64>) -> Result<()> {
        self.pixels = transform::resize(&self.pixels, options, max_alloc)?;
        Ok(())
    }

    pub fn crop(&mut self, options: &CropOptions) -> Result<()> {
        self.pixels = transform::apply_crop(&self.pixels, options)?;
        Ok(())
    }

    pub fn rotate(&mut self, options: &RotateOptions, max_alloc: Option<u64>) -> Result<()> {
        self.pixels = transform::apply_rotation(&self.pixels, options.angle, max_alloc)?;
        Ok(())
    }

    /// Composite `mark` onto this image. `mark` is only read.
    pub fn watermark(&mut self, mark: &Image, options: &WatermarkOptions) -> Result<()> {
        self.watermark_pixels(&mark.pixels, options)
    }

    /// Composite raw pixels onto this image.
    pub fn watermark_pixels(
        &mut self,
        mark: &DynamicImage,
        options: &WatermarkOptions,
    ) -> Result<()> {
        self.pixels = transform::composite_watermark(
            &self.pixels,
            mark,
            options.x,
            options.y,
            options.opacity,
        )?;
        Ok(())
    }

    pub fn set_opacity(&mut self, options: &OpacityOptions) -> Result<()> {
        self.pixels = transform::set_opacity(&self.pixels, options.opacity)?;
        Ok(())
    }

    pub fn encode_jpeg(&self, options: &JpegOptions) -> Result<EncodedBuffer> {
        encode::encode_jpeg(&self.pixels, options)
    }

    pub fn encode_png(&self, options: &PngOptions) -> Result<EncodedBuffer> {
        encode::encode_png(&self.pixels, options)
    }

    /// Snapshot of the current dimensions and layout plus the load-time
    /// source facts.
    pub fn metadata(&self) -> ImageMeta {
        let color = self.pixels.color();
        let format = if self.source.format.is_empty() {
            "unknown".to_string()
        } else {
            self.source.format.clone()
        };
        ImageMeta {
            width: self.pixels.width(),
            height: self.pixels.height(),
            channels: color.channel_count() as u32,
            format,
            colorspace: colorspace_name(color).to_string(),
            density_x: self.source.density.0,
            density_y: self.source.density.1,
            file_size: self.source.file_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageError;

    fn rgb_image(width: u32, height: u32) -> Image {
        Image::from_pixels(DynamicImage::ImageRgb8(image::RgbImage::from_fn(
            width,
            height,
            |x, y| image::Rgb([x as u8, y as u8, 7]),
        )))
    }

    #[test]
    fn test_failed_crop_leaves_image_unchanged() {
        let mut img = rgb_image(10, 10);
        let before = img.pixels().as_bytes().to_vec();

        let result = img.crop(&CropOptions::new(5, 5, 10, 10));
        assert!(matches!(result, Err(ImageError::InvalidBounds { .. })));
        assert_eq!(img.dimensions(), (10, 10));
        assert_eq!(img.pixels().as_bytes(), &before[..]);
    }

    #[test]
    fn test_failed_resize_leaves_image_unchanged() {
        let mut img = rgb_image(10, 10);
        let before = img.pixels().as_bytes().to_vec();

        assert!(img.resize(&ResizeOptions::new(0, 0, false), None).is_err());
        assert_eq!(img.pixels().as_bytes(), &before[..]);

        let result = img.resize(&ResizeOptions::new(200_000, 200_000, false), Some(1 << 20));
        assert!(matches!(result, Err(ImageError::OutOfMemory(_))));
        assert_eq!(img.dimensions(), (10, 10));
        assert_eq!(img.pixels().as_bytes(), &before[..]);
    }

    #[test]
    fn test_failed_rotate_leaves_image_unchanged() {
        let mut img = rgb_image(6, 4);
        assert!(img.rotate(&RotateOptions::new(f64::INFINITY), None).is_err());
        assert_eq!(img.dimensions(), (6, 4));
    }

    #[test]
    fn test_chained_transforms() {
        let mut img = rgb_image(40, 20);
        img.resize(&ResizeOptions::new(20, 0, true), None).unwrap();
        assert_eq!(img.dimensions(), (20, 10));
        img.rotate(&RotateOptions::new(90.0), None).unwrap();
        assert_eq!(img.dimensions(), (10, 20));
        img.crop(&CropOptions::new(0, 0, 10, 5)).unwrap();
        assert_eq!(img.dimensions(), (10, 5));
        img.set_opacity(&OpacityOptions::new(0.5)).unwrap();
        assert_eq!(img.metadata().channels, 4);
    }

    #[test]
    fn test_metadata_reflects_current_state() {
        let mut img = rgb_image(8, 6);
        let meta = img.metadata();
        assert_eq!((meta.width, meta.height, meta.channels), (8, 6, 3));
        assert_eq!(meta.colorspace, "srgb");
        assert_eq!(meta.format, "unknown");
        assert_eq!(meta.density_x, 72.0);

        img.crop(&CropOptions::new(0, 0, 4, 3)).unwrap();
        let meta = img.metadata();
        assert_eq!((meta.width, meta.height), (4, 3));
    }

    #[test]
    fn test_watermark_with_other_image() {
        let mut base = rgb_image(8, 8);
        let mark = rgb_image(2, 2);
        base.watermark(&mark, &WatermarkOptions::new(3, 3, 1.0)).unwrap();
        assert_eq!(base.dimensions(), (8, 8));
        assert_eq!(base.metadata().channels, 4);
    }
}
