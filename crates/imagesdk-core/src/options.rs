//! Per-operation option records.
//!
//! Fields use C-int semantics so out-of-range values coming over the C
//! boundary are representable and can be rejected by validation.

use serde::{Deserialize, Serialize};

/// JPEG quality used when the requested value is outside 1..=100.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// PNG compression level used when the requested value is outside 0..=9.
pub const DEFAULT_PNG_COMPRESSION: u8 = 6;

/// Options for resizing an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeOptions {
    /// Target width in pixels (<= 0 to derive from height).
    pub width: i32,
    /// Target height in pixels (<= 0 to derive from width).
    pub height: i32,
    /// Use a single uniform scale factor.
    pub maintain_aspect: bool,
}

impl ResizeOptions {
    pub fn new(width: i32, height: i32, maintain_aspect: bool) -> Self {
        Self {
            width,
            height,
            maintain_aspect,
        }
    }
}

/// Options for cropping an image to a pixel rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropOptions {
    /// Left edge (0-based).
    pub x: i32,
    /// Top edge (0-based).
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CropOptions {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Options for rotating an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RotateOptions {
    /// Rotation angle in degrees (positive = clockwise).
    pub angle: f64,
}

impl RotateOptions {
    pub fn new(angle: f64) -> Self {
        Self { angle }
    }
}

/// Options for compositing a watermark onto an image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    /// Horizontal offset of the watermark (may be negative).
    pub x: i32,
    /// Vertical offset of the watermark (may be negative).
    pub y: i32,
    /// Watermark opacity, clamped to [0, 1].
    pub opacity: f64,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            opacity: 1.0,
        }
    }
}

impl WatermarkOptions {
    pub fn new(x: i32, y: i32, opacity: f64) -> Self {
        Self { x, y, opacity }
    }
}

/// Options for changing the overall opacity of an image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpacityOptions {
    /// Opacity factor, clamped to [0, 1].
    pub opacity: f64,
}

impl Default for OpacityOptions {
    fn default() -> Self {
        Self { opacity: 1.0 }
    }
}

impl OpacityOptions {
    pub fn new(opacity: f64) -> Self {
        Self { opacity }
    }
}

/// JPEG encoding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JpegOptions {
    /// Quality 1-100; anything else selects the default of 75.
    pub quality: i32,
    /// Request progressive output.
    pub interlace: bool,
}

impl Default for JpegOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY as i32,
            interlace: false,
        }
    }
}

impl JpegOptions {
    pub fn new(quality: i32, interlace: bool) -> Self {
        Self { quality, interlace }
    }

    /// Quality actually handed to the encoder.
    pub fn effective_quality(&self) -> u8 {
        if (1..=100).contains(&self.quality) {
            self.quality as u8
        } else {
            DEFAULT_JPEG_QUALITY
        }
    }
}

/// PNG encoding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PngOptions {
    /// Compression level 0-9; anything else selects the default of 6.
    pub compression: i32,
    /// Request Adam7 interlaced output.
    pub interlace: bool,
}

impl Default for PngOptions {
    fn default() -> Self {
        Self {
            compression: DEFAULT_PNG_COMPRESSION as i32,
            interlace: false,
        }
    }
}

impl PngOptions {
    pub fn new(compression: i32, interlace: bool) -> Self {
        Self {
            compression,
            interlace,
        }
    }

    /// Compression level actually handed to the encoder.
    pub fn effective_compression(&self) -> u8 {
        if (0..=9).contains(&self.compression) {
            self.compression as u8
        } else {
            DEFAULT_PNG_COMPRESSION
        }
    }
}

/// Clamp an opacity factor to [0, 1]. NaN is treated as fully transparent.
pub fn clamp_opacity(opacity: f64) -> f64 {
    if opacity.is_nan() {
        return 0.0;
    }
    opacity.clamp(0.0, 1.0)
}
