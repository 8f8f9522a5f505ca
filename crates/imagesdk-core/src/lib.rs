//! Image SDK Core - handle-based image operations
//!
//! This crate provides the safe Rust side of the image SDK: loading images
//! from files or memory, resizing, cropping, rotating, watermarking,
//! changing opacity, encoding to JPEG/PNG and reading metadata. Pixel work is
//! delegated to the `image` crate.
//!
//! Images live in a generation-checked [`HandleRegistry`] and are addressed
//! by [`ImageHandle`]. The [`ImageSdk`] façade ties the registry to the
//! operations and reports every outcome as an [`ImageStatus`].
//!
//! ```ignore
//! use imagesdk_core::{ImageSdk, ResizeOptions, JpegOptions};
//!
//! let sdk = ImageSdk::default();
//! let handle = sdk.load_path("photo.png")?;
//! sdk.resize(handle, &ResizeOptions::new(800, 0, true))?;
//! let jpeg = sdk.encode_jpeg(handle, &JpegOptions::default())?;
//! sdk.release(handle)?;
//! ```

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod metadata;
pub mod options;
pub mod owned;
mod pixel;
pub mod registry;
pub mod sdk;
pub mod transform;

pub use config::Config;
pub use decode::{load_bytes, load_path, SourceInfo};
pub use encode::{encode_jpeg, encode_png, EncodedBuffer};
pub use error::{ImageError, ImageStatus, Result};
pub use metadata::ImageMeta;
pub use options::{
    clamp_opacity, CropOptions, JpegOptions, OpacityOptions, PngOptions, ResizeOptions,
    RotateOptions, WatermarkOptions,
};
pub use owned::Image;
pub use registry::{HandleRegistry, ImageHandle};
pub use sdk::ImageSdk;
