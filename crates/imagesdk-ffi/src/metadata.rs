//! Metadata extraction.

use crate::decode::handle_from_raw;
use crate::types::{ImageHandle, ImageMeta};
use crate::{ffi_call, sdk};

/// Snapshot the metadata of an image.
///
/// A null or invalid handle yields an all-zero record with
/// `INVALID_HANDLE` in `image_sdk_last_status`.
#[no_mangle]
pub extern "C" fn extract_metadata(handle: ImageHandle) -> ImageMeta {
    ffi_call("extract_metadata", ImageMeta::zeroed(), || {
        let meta = sdk().metadata(handle_from_raw(handle)?)?;
        Ok(ImageMeta::from(&meta))
    })
}
