//! Status taxonomy and error types shared by every operation.
//!
//! `ImageStatus` is the closed set of outcome codes exposed across the C
//! boundary. `ImageError` is the Rust-side error carrying context; every
//! variant maps to exactly one status.

use std::fmt;

use image::error::{ImageError as DelegateError, LimitErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome code returned by every operation.
///
/// The integer values are part of the C ABI and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum ImageStatus {
    /// Unknown or unspecified error.
    #[default]
    UnknownError = 0,
    /// Operation completed successfully.
    Success = 1,
    /// The delegate imaging library reported a fault.
    LibraryError = 2,
    /// Library initialization failed.
    LibraryInitFailure = 3,
    /// Null, stale or unknown image handle.
    InvalidHandle = 4,
    /// Memory could not be allocated.
    MemoryAllocationFailure = 5,
    /// Null, empty or non-UTF-8 path.
    InvalidPath = 6,
    /// The image could not be read or decoded.
    LoadFailure = 7,
    /// The image format is not recognized.
    InvalidFormat = 8,
    /// Invalid width/height parameters.
    InvalidDimensions = 9,
    /// Invalid x/y coordinates.
    InvalidPosition = 10,
    /// The operation exceeds the image boundaries.
    InvalidBounds = 11,
    /// Encoding the image failed.
    SaveFailure = 12,
}

impl ImageStatus {
    /// Integer code as seen by C callers.
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Convert an integer code back to a status.
    ///
    /// Codes outside the taxonomy map to `UnknownError`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ImageStatus::Success,
            2 => ImageStatus::LibraryError,
            3 => ImageStatus::LibraryInitFailure,
            4 => ImageStatus::InvalidHandle,
            5 => ImageStatus::MemoryAllocationFailure,
            6 => ImageStatus::InvalidPath,
            7 => ImageStatus::LoadFailure,
            8 => ImageStatus::InvalidFormat,
            9 => ImageStatus::InvalidDimensions,
            10 => ImageStatus::InvalidPosition,
            11 => ImageStatus::InvalidBounds,
            12 => ImageStatus::SaveFailure,
            _ => ImageStatus::UnknownError,
        }
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == ImageStatus::Success
    }

    /// Stable upper-snake name, used in log output.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageStatus::UnknownError => "UNKNOWN_ERROR",
            ImageStatus::Success => "SUCCESS",
            ImageStatus::LibraryError => "LIBRARY_ERROR",
            ImageStatus::LibraryInitFailure => "LIBRARY_INIT_FAILURE",
            ImageStatus::InvalidHandle => "INVALID_HANDLE",
            ImageStatus::MemoryAllocationFailure => "MEMORY_ALLOCATION_FAILURE",
            ImageStatus::InvalidPath => "INVALID_PATH",
            ImageStatus::LoadFailure => "LOAD_FAILURE",
            ImageStatus::InvalidFormat => "INVALID_FORMAT",
            ImageStatus::InvalidDimensions => "INVALID_DIMENSIONS",
            ImageStatus::InvalidPosition => "INVALID_POSITION",
            ImageStatus::InvalidBounds => "INVALID_BOUNDS",
            ImageStatus::SaveFailure => "SAVE_FAILURE",
        }
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for image operations.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The handle is null, stale, or was never issued.
    #[error("Invalid image handle")]
    InvalidHandle,

    /// The path is empty or cannot be represented.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The source could not be read or decoded.
    #[error("Failed to load image: {0}")]
    LoadFailed(String),

    /// The format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// Width or height is out of range.
    #[error("Invalid dimensions: width ({width}) and height ({height})")]
    InvalidDimensions { width: i64, height: i64 },

    /// A coordinate is negative.
    #[error("Invalid position: x ({x}) and y ({y}) must be non-negative")]
    InvalidPosition { x: i64, y: i64 },

    /// The requested region extends past the image.
    #[error(
        "Region {width}x{height} at ({x}, {y}) exceeds image bounds {image_width}x{image_height}"
    )]
    InvalidBounds {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        image_width: u32,
        image_height: u32,
    },

    /// Allocation failed or a decode limit was exceeded.
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// The delegate library reported a fault.
    #[error("Image library error: {0}")]
    Library(String),

    /// Encoding to an output format failed.
    #[error("Encoding failed: {0}")]
    EncodeFailed(String),

    /// Initialization or configuration failed.
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Anything that fits no other category.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ImageError {
    /// The status code this error is reported as.
    pub fn status(&self) -> ImageStatus {
        match self {
            ImageError::InvalidHandle => ImageStatus::InvalidHandle,
            ImageError::InvalidPath(_) => ImageStatus::InvalidPath,
            ImageError::LoadFailed(_) => ImageStatus::LoadFailure,
            ImageError::InvalidFormat => ImageStatus::InvalidFormat,
            ImageError::InvalidDimensions { .. } => ImageStatus::InvalidDimensions,
            ImageError::InvalidPosition { .. } => ImageStatus::InvalidPosition,
            ImageError::InvalidBounds { .. } => ImageStatus::InvalidBounds,
            ImageError::OutOfMemory(_) => ImageStatus::MemoryAllocationFailure,
            ImageError::Library(_) => ImageStatus::LibraryError,
            ImageError::EncodeFailed(_) => ImageStatus::SaveFailure,
            ImageError::InitFailed(_) => ImageStatus::LibraryInitFailure,
            ImageError::Unknown(_) => ImageStatus::UnknownError,
        }
    }
}

impl From<DelegateError> for ImageError {
    fn from(err: DelegateError) -> Self {
        match err {
            DelegateError::Limits(ref limit) => match limit.kind() {
                LimitErrorKind::InsufficientMemory | LimitErrorKind::DimensionError => {
                    ImageError::OutOfMemory(err.to_string())
                }
                _ => ImageError::Library(err.to_string()),
            },
            DelegateError::Unsupported(_) => ImageError::InvalidFormat,
            DelegateError::IoError(e) => ImageError::LoadFailed(e.to_string()),
            other => ImageError::Library(other.to_string()),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ImageError>;
