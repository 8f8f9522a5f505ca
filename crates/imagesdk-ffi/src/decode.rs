//! Loading images and releasing handles.

use std::ffi::{c_char, CStr};
use std::path::Path;

use imagesdk_core::{ImageError, ImageHandle as Handle};

use crate::types::ImageHandle;
use crate::{ffi_call, sdk};

/// Convert a raw handle, rejecting the null handle.
pub(crate) fn handle_from_raw(raw: ImageHandle) -> Result<Handle, ImageError> {
    Handle::from_raw(raw).ok_or(ImageError::InvalidHandle)
}

/// Borrow a C string as a filesystem path.
///
/// On Unix the bytes are used as-is, so names that are not UTF-8 still load.
#[cfg(unix)]
fn path_from_c(path: &CStr) -> Result<&Path, ImageError> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    Ok(Path::new(OsStr::from_bytes(path.to_bytes())))
}

#[cfg(not(unix))]
fn path_from_c(path: &CStr) -> Result<&Path, ImageError> {
    path.to_str()
        .map(Path::new)
        .map_err(|e| ImageError::InvalidPath(e.to_string()))
}

/// Load an image from a file path.
///
/// Returns the new handle, or 0 on failure with the reason in
/// `image_sdk_last_status`.
///
/// # Safety
///
/// `input_path` must be null or point to a NUL-terminated string that stays
/// valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn load_image(input_path: *const c_char) -> ImageHandle {
    ffi_call("load_image", 0, || {
        if input_path.is_null() {
            return Err(ImageError::InvalidPath("path pointer is null".to_string()));
        }
        // SAFETY: non-null and NUL-terminated per the caller contract
        let path = unsafe { CStr::from_ptr(input_path) };
        sdk().load_path(path_from_c(path)?).map(Handle::to_raw)
    })
}

/// Load an image from an encoded byte buffer. The bytes are not retained.
///
/// # Safety
///
/// `data` must be null or point to at least `size` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn load_image_from_bytes(data: *const u8, size: usize) -> ImageHandle {
    ffi_call("load_image_from_bytes", 0, || {
        if data.is_null() || size == 0 {
            return Err(ImageError::LoadFailed("buffer is null or empty".to_string()));
        }
        // SAFETY: non-null with `size` readable bytes per the caller contract
        let bytes = unsafe { std::slice::from_raw_parts(data, size) };
        sdk().load_bytes(bytes).map(Handle::to_raw)
    })
}

/// Release an image handle. Passing 0 is a no-op.
///
/// Releasing an already released handle is detected and reported as
/// `INVALID_HANDLE`.
#[no_mangle]
pub extern "C" fn free_image_handle(handle: ImageHandle) {
    ffi_call("free_image_handle", (), || match Handle::from_raw(handle) {
        Some(handle) => sdk().release(handle),
        None => Ok(()),
    })
}
