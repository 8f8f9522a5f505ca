//! Encoding images to JPEG and PNG byte buffers.
//!
//! Both encoders write into a pre-reserved `Vec<u8>`, so an allocation
//! failure surfaces as `OutOfMemory` instead of aborting the process.
//!
//! The `interlace` option selects progressive JPEG (mozjpeg) over baseline,
//! and Adam7 PNG (oxipng) over a standard stream.

mod jpeg;
mod png;

use std::ops::Deref;

use crate::error::{ImageError, Result};

pub use self::jpeg::encode_jpeg;
pub use self::png::{compression_type, encode_png};

/// Owned encoded image bytes. Dropping the buffer releases it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBuffer(Vec<u8>);

impl EncodedBuffer {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Take ownership of the underlying bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for EncodedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for EncodedBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Allocate an output buffer with room for `estimate` bytes.
fn reserve_output(estimate: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve(estimate)
        .map_err(|e| ImageError::OutOfMemory(format!("output buffer of {estimate} bytes: {e}")))?;
    Ok(out)
}
