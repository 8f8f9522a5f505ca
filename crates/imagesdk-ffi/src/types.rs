//! C-compatible records and their conversions to core types.
//!
//! Field order and widths match `include/image_sdk.h`. Boolean flags are
//! C ints where any non-zero value means true.

use std::ffi::{c_char, c_int};

use imagesdk_core::config::DEFAULT_MAX_ALLOC;
use imagesdk_core::{
    Config, CropOptions, JpegOptions, OpacityOptions, PngOptions, ResizeOptions, RotateOptions,
    WatermarkOptions,
};

/// Raw image handle. 0 is the null handle.
pub type ImageHandle = u64;

/// Length of the fixed string fields in [`ImageMeta`], NUL included.
pub const META_STRING_LEN: usize = 32;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageResizeOptions {
    pub maintain_aspect: c_int,
    pub width: c_int,
    pub height: c_int,
}

impl From<ImageResizeOptions> for ResizeOptions {
    fn from(opts: ImageResizeOptions) -> Self {
        ResizeOptions::new(opts.width, opts.height, opts.maintain_aspect != 0)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageCropOptions {
    pub x: c_int,
    pub y: c_int,
    pub width: c_int,
    pub height: c_int,
}

impl From<ImageCropOptions> for CropOptions {
    fn from(opts: ImageCropOptions) -> Self {
        CropOptions::new(opts.x, opts.y, opts.width, opts.height)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageRotateOptions {
    /// Degrees, positive = clockwise.
    pub angle: f64,
}

impl From<ImageRotateOptions> for RotateOptions {
    fn from(opts: ImageRotateOptions) -> Self {
        RotateOptions::new(opts.angle)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageWatermarkOptions {
    pub x: c_int,
    pub y: c_int,
    pub opacity: f64,
}

impl From<ImageWatermarkOptions> for WatermarkOptions {
    fn from(opts: ImageWatermarkOptions) -> Self {
        WatermarkOptions::new(opts.x, opts.y, opts.opacity)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageOpacityOptions {
    pub opacity: f64,
}

impl From<ImageOpacityOptions> for OpacityOptions {
    fn from(opts: ImageOpacityOptions) -> Self {
        OpacityOptions::new(opts.opacity)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageEncodeJPEGOptions {
    pub quality: c_int,
    pub interlace: c_int,
}

impl From<ImageEncodeJPEGOptions> for JpegOptions {
    fn from(opts: ImageEncodeJPEGOptions) -> Self {
        JpegOptions::new(opts.quality, opts.interlace != 0)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageEncodePNGOptions {
    pub compression: c_int,
    pub interlace: c_int,
}

impl From<ImageEncodePNGOptions> for PngOptions {
    fn from(opts: ImageEncodePNGOptions) -> Self {
        PngOptions::new(opts.compression, opts.interlace != 0)
    }
}

/// Encoded bytes owned by the library until passed to `free_image_buffer`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBuffer {
    pub data: *mut u8,
    pub size: usize,
}

impl ImageBuffer {
    /// The `{NULL, 0}` buffer returned on failure.
    pub fn null() -> Self {
        Self {
            data: std::ptr::null_mut(),
            size: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }
}

/// Decode limits. A zero field means "no limit".
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSdkConfig {
    pub max_image_width: u32,
    pub max_image_height: u32,
    pub max_alloc: u64,
}

impl Default for ImageSdkConfig {
    fn default() -> Self {
        Self {
            max_image_width: 0,
            max_image_height: 0,
            max_alloc: DEFAULT_MAX_ALLOC,
        }
    }
}

impl From<ImageSdkConfig> for Config {
    fn from(config: ImageSdkConfig) -> Self {
        let nonzero_u32 = |v: u32| (v != 0).then_some(v);
        Config {
            max_image_width: nonzero_u32(config.max_image_width),
            max_image_height: nonzero_u32(config.max_image_height),
            max_alloc: (config.max_alloc != 0).then_some(config.max_alloc),
        }
    }
}

/// Image metadata as seen by C callers.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageMeta {
    pub width: c_int,
    pub height: c_int,
    pub channels: c_int,
    pub format: [c_char; META_STRING_LEN],
    pub colorspace: [c_char; META_STRING_LEN],
    /// Pixels per inch.
    pub density_x: f64,
    pub density_y: f64,
    /// Source file size in bytes; 0 if not loaded from a file.
    pub file_size: i64,
}

impl ImageMeta {
    /// All-zero record, returned for a null or invalid handle.
    pub fn zeroed() -> Self {
        Self {
            width: 0,
            height: 0,
            channels: 0,
            format: [0; META_STRING_LEN],
            colorspace: [0; META_STRING_LEN],
            density_x: 0.0,
            density_y: 0.0,
            file_size: 0,
        }
    }
}

impl From<&imagesdk_core::ImageMeta> for ImageMeta {
    fn from(meta: &imagesdk_core::ImageMeta) -> Self {
        Self {
            width: saturating_c_int(meta.width),
            height: saturating_c_int(meta.height),
            channels: saturating_c_int(meta.channels),
            format: fixed_c_string(&meta.format),
            colorspace: fixed_c_string(&meta.colorspace),
            density_x: meta.density_x,
            density_y: meta.density_y,
            file_size: i64::try_from(meta.file_size).unwrap_or(i64::MAX),
        }
    }
}

fn saturating_c_int(value: u32) -> c_int {
    c_int::try_from(value).unwrap_or(c_int::MAX)
}

/// Copy `s` into a NUL-terminated fixed buffer, truncating to fit.
fn fixed_c_string(s: &str) -> [c_char; META_STRING_LEN] {
    let mut out = [0 as c_char; META_STRING_LEN];
    for (dst, &src) in out.iter_mut().zip(s.as_bytes().iter().take(META_STRING_LEN - 1)) {
        *dst = src as c_char;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    fn as_str(field: &[c_char; META_STRING_LEN]) -> &str {
        // SAFETY: fixed_c_string always leaves a NUL in the last byte
        unsafe { CStr::from_ptr(field.as_ptr()) }.to_str().unwrap()
    }

    #[test]
    fn test_resize_conversion() {
        let opts = ResizeOptions::from(ImageResizeOptions {
            maintain_aspect: 2,
            width: 800,
            height: 0,
        });
        assert_eq!(opts, ResizeOptions::new(800, 0, true));
    }

    #[test]
    fn test_encode_options_conversion() {
        let jpeg = JpegOptions::from(ImageEncodeJPEGOptions {
            quality: 85,
            interlace: 1,
        });
        assert_eq!(jpeg, JpegOptions::new(85, true));

        let png = PngOptions::from(ImageEncodePNGOptions {
            compression: 3,
            interlace: 0,
        });
        assert_eq!(png, PngOptions::new(3, false));
    }

    #[test]
    fn test_config_zero_means_unlimited() {
        let config = Config::from(ImageSdkConfig {
            max_image_width: 0,
            max_image_height: 1024,
            max_alloc: 0,
        });
        assert_eq!(config.max_image_width, None);
        assert_eq!(config.max_image_height, Some(1024));
        assert_eq!(config.max_alloc, None);

        assert_eq!(Config::from(ImageSdkConfig::default()), Config::default());
    }

    #[test]
    fn test_meta_strings_are_terminated() {
        let core = imagesdk_core::ImageMeta {
            width: 10,
            height: 20,
            channels: 3,
            format: "pngload_buffer".to_string(),
            colorspace: "srgb".to_string(),
            density_x: 72.0,
            density_y: 72.0,
            file_size: 0,
        };
        let meta = ImageMeta::from(&core);
        assert_eq!(as_str(&meta.format), "pngload_buffer");
        assert_eq!(as_str(&meta.colorspace), "srgb");
        assert_eq!((meta.width, meta.height, meta.channels), (10, 20, 3));
    }

    #[test]
    fn test_meta_long_string_truncated() {
        let long = "x".repeat(100);
        let field = fixed_c_string(&long);
        assert_eq!(as_str(&field).len(), META_STRING_LEN - 1);
        assert_eq!(field[META_STRING_LEN - 1], 0);
    }

    #[test]
    fn test_zeroed_meta() {
        let meta = ImageMeta::zeroed();
        assert_eq!(meta.width, 0);
        assert_eq!(as_str(&meta.format), "");
        assert_eq!(meta.file_size, 0);
    }
}
