//! Encoding to caller-visible buffers.
//!
//! Encoded bytes stay owned by the library in a table keyed by data pointer
//! until the caller hands the buffer back to `free_image_buffer`. Buffers
//! outlive the image they came from and `image_sdk_cleanup`.

use std::collections::HashMap;
use std::sync::OnceLock;

use imagesdk_core::{EncodedBuffer, ImageError};
use parking_lot::Mutex;

use crate::decode::handle_from_raw;
use crate::types::{ImageBuffer, ImageEncodeJPEGOptions, ImageEncodePNGOptions, ImageHandle};
use crate::{ffi_call, sdk};

type BufferTable = Mutex<HashMap<usize, Box<[u8]>>>;

fn buffers() -> &'static BufferTable {
    static BUFFERS: OnceLock<BufferTable> = OnceLock::new();
    BUFFERS.get_or_init(BufferTable::default)
}

/// Move encoded bytes into the table and describe them for C.
fn publish(encoded: EncodedBuffer) -> Result<ImageBuffer, ImageError> {
    if encoded.is_empty() {
        return Err(ImageError::EncodeFailed("encoder produced no data".to_string()));
    }
    let mut bytes = encoded.into_vec().into_boxed_slice();
    let buffer = ImageBuffer {
        data: bytes.as_mut_ptr(),
        size: bytes.len(),
    };
    buffers().lock().insert(buffer.data as usize, bytes);
    Ok(buffer)
}

/// Encode an image to JPEG.
///
/// Returns `{NULL, 0}` on failure. Release the result with
/// `free_image_buffer`.
#[no_mangle]
pub extern "C" fn encode_to_jpeg(
    handle: ImageHandle,
    options: ImageEncodeJPEGOptions,
) -> ImageBuffer {
    ffi_call("encode_to_jpeg", ImageBuffer::null(), || {
        let encoded = sdk().encode_jpeg(handle_from_raw(handle)?, &options.into())?;
        publish(encoded)
    })
}

/// Encode an image to PNG.
///
/// Returns `{NULL, 0}` on failure. Release the result with
/// `free_image_buffer`.
#[no_mangle]
pub extern "C" fn encode_to_png(handle: ImageHandle, options: ImageEncodePNGOptions) -> ImageBuffer {
    ffi_call("encode_to_png", ImageBuffer::null(), || {
        let encoded = sdk().encode_png(handle_from_raw(handle)?, &options.into())?;
        publish(encoded)
    })
}

/// Release a buffer returned by an encode call. A null buffer is a no-op.
///
/// Unknown or already released buffers are logged and reported as
/// `INVALID_HANDLE`; nothing is freed.
#[no_mangle]
pub extern "C" fn free_image_buffer(buffer: ImageBuffer) {
    ffi_call("free_image_buffer", (), || {
        if buffer.is_null() {
            return Ok(());
        }
        match buffers().lock().remove(&(buffer.data as usize)) {
            Some(bytes) => {
                if bytes.len() != buffer.size {
                    tracing::warn!(
                        expected = bytes.len(),
                        actual = buffer.size,
                        "buffer freed with mismatched size"
                    );
                }
                Ok(())
            }
            None => {
                tracing::warn!(
                    ptr = ?buffer.data,
                    size = buffer.size,
                    "free of unknown or already freed buffer"
                );
                Err(ImageError::InvalidHandle)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::free_image_handle;
    use crate::image_sdk_last_status;
    use crate::test_support::load_png;
    use imagesdk_core::ImageStatus;

    fn bytes_of(buffer: &ImageBuffer) -> &[u8] {
        // SAFETY: buffer came from an encode call and has not been freed
        unsafe { std::slice::from_raw_parts(buffer.data, buffer.size) }
    }

    #[test]
    fn test_encode_jpeg_round_trip() {
        let handle = load_png(24, 16);
        let jpeg = encode_to_jpeg(
            handle,
            ImageEncodeJPEGOptions {
                quality: 85,
                interlace: 0,
            },
        );
        assert!(!jpeg.is_null());
        assert_eq!(image_sdk_last_status(), ImageStatus::Success);
        assert_eq!(&bytes_of(&jpeg)[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(bytes_of(&jpeg)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (24, 16));

        free_image_buffer(jpeg);
        assert_eq!(image_sdk_last_status(), ImageStatus::Success);
        free_image_handle(handle);
    }

    #[test]
    fn test_encode_png() {
        let handle = load_png(8, 8);
        let png = encode_to_png(
            handle,
            ImageEncodePNGOptions {
                compression: 9,
                interlace: 1,
            },
        );
        assert!(!png.is_null());
        assert_eq!(&bytes_of(&png)[1..4], b"PNG");
        // IHDR interlace method: Adam7
        assert_eq!(bytes_of(&png)[28], 1);
        free_image_buffer(png);
        free_image_handle(handle);
    }

    #[test]
    fn test_encode_progressive_jpeg() {
        let handle = load_png(24, 16);
        let jpeg = encode_to_jpeg(
            handle,
            ImageEncodeJPEGOptions {
                quality: 70,
                interlace: 1,
            },
        );
        assert_eq!(image_sdk_last_status(), ImageStatus::Success);
        assert!(bytes_of(&jpeg).windows(2).any(|w| w == [0xFF, 0xC2]));

        let decoded = image::load_from_memory(bytes_of(&jpeg)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (24, 16));
        free_image_buffer(jpeg);
        free_image_handle(handle);
    }

    #[test]
    fn test_buffer_outlives_handle() {
        let handle = load_png(8, 8);
        let png = encode_to_png(handle, ImageEncodePNGOptions::default());
        free_image_handle(handle);

        let decoded = image::load_from_memory(bytes_of(&png)).unwrap();
        assert_eq!(decoded.width(), 8);
        free_image_buffer(png);
    }

    #[test]
    fn test_encode_null_handle() {
        let jpeg = encode_to_jpeg(0, ImageEncodeJPEGOptions::default());
        assert_eq!(jpeg, ImageBuffer::null());
        assert_eq!(image_sdk_last_status(), ImageStatus::InvalidHandle);
    }

    #[test]
    fn test_double_free_buffer_is_detected() {
        let handle = load_png(4, 4);
        let png = encode_to_png(handle, ImageEncodePNGOptions::default());
        free_image_handle(handle);

        free_image_buffer(png);
        assert_eq!(image_sdk_last_status(), ImageStatus::Success);
        free_image_buffer(png);
        assert_eq!(image_sdk_last_status(), ImageStatus::InvalidHandle);
    }

    #[test]
    fn test_free_null_buffer() {
        free_image_buffer(ImageBuffer::null());
        assert_eq!(image_sdk_last_status(), ImageStatus::Success);
    }
}
