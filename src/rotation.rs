//! Coordinate rotation utilities
//!
//! The DPI frame buffer is always addressed in native panel coordinates.
//! These functions map logical coordinates, as seen by a rotated graphics
//! layer, onto the native frame buffer.
//!
//! ## Rotation Modes
//!
//! - **Rotate0**: Native orientation
//! - **Rotate90**: 90° clockwise, width and height swapped
//! - **Rotate180**: 180° rotation, origin at bottom-right
//! - **Rotate270**: 270° clockwise (or 90° counter-clockwise)
//!
//! ## Example
//!
//! ```
//! use ota7290b::{Rotation, rotation::apply_rotation};
//!
//! // On a 480x1920 panel rotated 90°, the logical origin is the native top-right pixel
//! assert_eq!(apply_rotation(0, 0, 480, 1920, Rotation::Rotate90), (479, 0));
//! ```

use crate::config::Rotation;
use crate::surface::Region;

/// Map a logical pixel to native panel coordinates
///
/// # Arguments
///
/// * `x` - Logical X coordinate
/// * `y` - Logical Y coordinate
/// * `width` - Native panel width in pixels
/// * `height` - Native panel height in pixels
/// * `rotation` - Rotation mode
///
/// The caller guarantees `(x, y)` lies inside the rotated bounds.
pub fn apply_rotation(x: u32, y: u32, width: u32, height: u32, rotation: Rotation) -> (u32, u32) {
    match rotation {
        Rotation::Rotate0 => (x, y),
        Rotation::Rotate90 => (width - 1 - y, x),
        Rotation::Rotate180 => (width - 1 - x, height - 1 - y),
        Rotation::Rotate270 => (y, height - 1 - x),
    }
}

/// Map a logical rectangle to the native region covering the same pixels
///
/// The rectangle must be non-empty and inside the rotated bounds.
pub fn rotate_region(region: Region, width: u32, height: u32, rotation: Rotation) -> Region {
    let x0 = u32::from(region.x);
    let y0 = u32::from(region.y);
    let x1 = x0 + u32::from(region.w) - 1;
    let y1 = y0 + u32::from(region.h) - 1;

    let (ax, ay) = apply_rotation(x0, y0, width, height, rotation);
    let (bx, by) = apply_rotation(x1, y1, width, height, rotation);

    let left = ax.min(bx);
    let top = ay.min(by);
    Region::new(
        left as u16,
        top as u16,
        (ax.max(bx) - left + 1) as u16,
        (ay.max(by) - top + 1) as u16,
    )
}
