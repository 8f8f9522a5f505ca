//! Runtime configuration: decode limits handed to the delegate library.

use serde::{Deserialize, Serialize};

use crate::error::{ImageError, Result};

/// Default allocation ceiling for a single decode (512 MiB).
pub const DEFAULT_MAX_ALLOC: u64 = 512 * 1024 * 1024;

/// SDK configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reject images wider than this.
    pub max_image_width: Option<u32>,
    /// Reject images taller than this.
    pub max_image_height: Option<u32>,
    /// Maximum bytes a decoder may allocate.
    pub max_alloc: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_image_width: None,
            max_image_height: None,
            max_alloc: Some(DEFAULT_MAX_ALLOC),
        }
    }
}

impl Config {
    /// Configuration with no limits at all.
    pub fn unlimited() -> Self {
        Self {
            max_image_width: None,
            max_image_height: None,
            max_alloc: None,
        }
    }

    /// Reject limits that could never admit an image.
    pub fn validate(&self) -> Result<()> {
        if self.max_image_width == Some(0) || self.max_image_height == Some(0) {
            return Err(ImageError::InitFailed(
                "maximum image dimensions must be non-zero".to_string(),
            ));
        }
        if self.max_alloc == Some(0) {
            return Err(ImageError::InitFailed(
                "maximum allocation must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Decode limits in the delegate's representation.
    pub fn limits(&self) -> image::Limits {
        let mut limits = image::Limits::no_limits();
        limits.max_image_width = self.max_image_width;
        limits.max_image_height = self.max_image_height;
        limits.max_alloc = self.max_alloc;
        limits
    }
}
