//! In-place transforms on a handle.
//!
//! Each returns `SUCCESS` or the failure status; a failed transform leaves the
//! image unchanged.

use imagesdk_core::ImageStatus;

use crate::decode::handle_from_raw;
use crate::types::{
    ImageCropOptions, ImageHandle, ImageOpacityOptions, ImageResizeOptions, ImageRotateOptions,
    ImageWatermarkOptions,
};
use crate::{sdk, status_call};

/// Resize an image. Resampling uses Lanczos3.
#[no_mangle]
pub extern "C" fn resize_image(handle: ImageHandle, options: ImageResizeOptions) -> ImageStatus {
    status_call("resize_image", || {
        sdk().resize(handle_from_raw(handle)?, &options.into())
    })
}

/// Crop an image to a rectangle inside its bounds.
#[no_mangle]
pub extern "C" fn crop_image(handle: ImageHandle, options: ImageCropOptions) -> ImageStatus {
    status_call("crop_image", || {
        sdk().crop(handle_from_raw(handle)?, &options.into())
    })
}

/// Rotate an image clockwise by `options.angle` degrees.
#[no_mangle]
pub extern "C" fn rotate_image(handle: ImageHandle, options: ImageRotateOptions) -> ImageStatus {
    status_call("rotate_image", || {
        sdk().rotate(handle_from_raw(handle)?, &options.into())
    })
}

/// Composite one image onto another. Both handles may be the same.
#[no_mangle]
pub extern "C" fn watermark_image(
    base_handle: ImageHandle,
    watermark_handle: ImageHandle,
    options: ImageWatermarkOptions,
) -> ImageStatus {
    status_call("watermark_image", || {
        let base = handle_from_raw(base_handle)?;
        let mark = handle_from_raw(watermark_handle)?;
        sdk().watermark(base, mark, &options.into())
    })
}

/// Scale the alpha of an image, adding an alpha band if needed.
#[no_mangle]
pub extern "C" fn change_image_opacity(
    handle: ImageHandle,
    options: ImageOpacityOptions,
) -> ImageStatus {
    status_call("change_image_opacity", || {
        sdk().change_opacity(handle_from_raw(handle)?, &options.into())
    })
}
