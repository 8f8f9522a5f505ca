//! Image transformation operations.
//!
//! Every function here borrows its input and returns a new `DynamicImage`, so
//! callers can commit the result only on success.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner
//! - Rotation angles are in degrees, positive = clockwise
//! - Crop rectangles and watermark offsets are in whole pixels

mod alpha;
mod crop;
mod resize;
mod rotation;

pub use alpha::{composite_watermark, set_opacity};
pub use crop::{apply_crop, validate_crop};
pub use resize::{resize, resize_alloc_bytes, scale_factors, scaled_dimensions, RESIZE_FILTER};
pub use rotation::{apply_rotation, compute_rotated_bounds};
