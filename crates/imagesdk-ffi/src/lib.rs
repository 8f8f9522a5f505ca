//! Image SDK FFI - C bindings for imagesdk-core
//!
//! This crate exposes the handle-based operations of `imagesdk-core` through a
//! C ABI. The matching declarations live in `include/image_sdk.h`.
//!
//! # Module Structure
//!
//! - `types` - `#[repr(C)]` records and their conversions to core types
//! - `decode` - loading images and releasing handles
//! - `transform` - resize, crop, rotate, watermark, opacity
//! - `encode` - JPEG/PNG encoding and the caller-owned buffer table
//! - `metadata` - metadata extraction
//!
//! # Usage
//!
//! ```c
//! image_sdk_init();
//! ImageHandle img = load_image("input.jpg");
//! if (img) {
//!     ImageResizeOptions opts = {1, 800, 600};
//!     resize_image(img, opts);
//!     ImageBuffer out = encode_to_jpeg(img, (ImageEncodeJPEGOptions){85, 0});
//!     free_image_buffer(out);
//!     free_image_handle(img);
//! }
//! image_sdk_cleanup();
//! ```
//!
//! Every entry point records its outcome in a thread-local status readable
//! through `image_sdk_last_status`, and no panic ever unwinds into the caller.

use std::cell::Cell;
use std::ffi::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use imagesdk_core::{Config, ImageError, ImageSdk, ImageStatus};
use tracing_subscriber::EnvFilter;

mod decode;
mod encode;
mod metadata;
mod transform;
mod types;

pub use decode::{free_image_handle, load_image, load_image_from_bytes};
pub use encode::{encode_to_jpeg, encode_to_png, free_image_buffer};
pub use metadata::extract_metadata;
pub use transform::{change_image_opacity, crop_image, resize_image, rotate_image, watermark_image};
pub use types::{
    ImageBuffer, ImageCropOptions, ImageEncodeJPEGOptions, ImageEncodePNGOptions, ImageHandle,
    ImageMeta, ImageOpacityOptions, ImageResizeOptions, ImageRotateOptions, ImageSdkConfig,
    ImageWatermarkOptions,
};

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "warn";

static SDK: OnceLock<ImageSdk> = OnceLock::new();

thread_local! {
    static LAST_STATUS: Cell<ImageStatus> = const { Cell::new(ImageStatus::Success) };
}

/// The process-wide SDK. Created with the default configuration on first use.
pub(crate) fn sdk() -> &'static ImageSdk {
    SDK.get_or_init(ImageSdk::default)
}

fn set_last_status(status: ImageStatus) {
    LAST_STATUS.with(|cell| cell.set(status));
}

/// Run `f` at the C boundary.
///
/// Records the outcome as the thread's last status and returns `fallback`
/// on error. A panic is caught, logged and reported as `UnknownError`.
pub(crate) fn ffi_call<T, F>(operation: &'static str, fallback: T, f: F) -> T
where
    F: FnOnce() -> Result<T, ImageError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => {
            set_last_status(ImageStatus::Success);
            value
        }
        Ok(Err(e)) => {
            set_last_status(e.status());
            fallback
        }
        Err(_) => {
            tracing::error!(operation, "panic caught at the C boundary");
            set_last_status(ImageStatus::UnknownError);
            fallback
        }
    }
}

/// Like [`ffi_call`] for operations whose only result is a status.
pub(crate) fn status_call<F>(operation: &'static str, f: F) -> ImageStatus
where
    F: FnOnce() -> Result<(), ImageError>,
{
    ffi_call(operation, (), f);
    LAST_STATUS.with(Cell::get)
}

/// Install the stderr log subscriber unless the host already has one.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // Err means a global subscriber is already set, which is fine
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Initialize the SDK with the default configuration.
///
/// Calling this is optional and idempotent; it installs logging.
#[no_mangle]
pub extern "C" fn image_sdk_init() -> ImageStatus {
    status_call("image_sdk_init", || {
        init_logging();
        sdk();
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), "image sdk initialized");
        Ok(())
    })
}

/// Initialize the SDK and apply `config`.
///
/// Returns `LIBRARY_INIT_FAILURE` for a null pointer.
///
/// # Safety
///
/// `config` must be null or point to a valid `ImageSdkConfig`.
#[no_mangle]
pub unsafe extern "C" fn image_sdk_init_with_config(config: *const ImageSdkConfig) -> ImageStatus {
    status_call("image_sdk_init_with_config", || {
        init_logging();
        // SAFETY: the caller guarantees `config` is null or valid
        let config = unsafe { config.as_ref() }
            .ok_or_else(|| ImageError::InitFailed("config pointer is null".to_string()))?;
        sdk().configure(Config::from(*config))
    })
}

/// Release every live image handle.
///
/// Encoded buffers already handed out stay valid until freed.
#[no_mangle]
pub extern "C" fn image_sdk_cleanup() {
    ffi_call("image_sdk_cleanup", (), || {
        if let Some(sdk) = SDK.get() {
            sdk.release_all();
        }
        Ok(())
    })
}

/// Library version as a static NUL-terminated string.
#[no_mangle]
pub extern "C" fn image_sdk_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}

/// Status of the last SDK call made on the calling thread.
#[no_mangle]
pub extern "C" fn image_sdk_last_status() -> ImageStatus {
    LAST_STATUS.with(Cell::get)
}
