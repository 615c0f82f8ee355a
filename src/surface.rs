//! Display surface abstraction
//!
//! [`DisplaySurface`] is the narrow interface upper graphics layers draw
//! through. Pixel writes are only accepted once the panel is streaming video;
//! before that every write fails with [`HwFault::NotReady`] and nothing reaches
//! the hardware.

use crate::config::{Dimensions, PixelFormat};
use crate::error::HwFault;

/// Rectangular pixel region in native panel coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    /// X coordinate in pixels
    pub x: u16,
    /// Y coordinate in pixels
    pub y: u16,
    /// Width in pixels
    pub w: u16,
    /// Height in pixels
    pub h: u16,
}

impl Region {
    /// Create a new region
    #[allow(clippy::many_single_char_names)]
    pub fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    /// Number of pixels covered
    pub fn pixel_count(&self) -> usize {
        self.w as usize * self.h as usize
    }

    /// Check the region against the panel and `data` against the region
    ///
    /// # Errors
    ///
    /// Returns [`HwFault::InvalidRegion`] for an empty region or one that
    /// leaves the panel, and [`HwFault::BufferSize`] when `data_len` is not
    /// exactly `pixel_count() * bytes_per_pixel`.
    pub fn validate(
        &self,
        dimensions: Dimensions,
        format: PixelFormat,
        data_len: usize,
    ) -> Result<(), HwFault> {
        let right = u32::from(self.x) + u32::from(self.w);
        let bottom = u32::from(self.y) + u32::from(self.h);
        if self.w == 0
            || self.h == 0
            || right > u32::from(dimensions.width)
            || bottom > u32::from(dimensions.height)
        {
            return Err(HwFault::InvalidRegion {
                x: self.x,
                y: self.y,
                w: self.w,
                h: self.h,
            });
        }

        let required = self.pixel_count() * format.bytes_per_pixel();
        if data_len != required {
            return Err(HwFault::BufferSize {
                required,
                provided: data_len,
            });
        }
        Ok(())
    }
}

/// A pixel sink backed by a streaming panel
pub trait DisplaySurface {
    /// Native panel size as (width, height)
    fn bounds(&self) -> (u16, u16);

    /// Copy pixel data into `region` of the frame buffer
    ///
    /// The write is synchronous: it returns once the copy has completed.
    fn write_pixels(&mut self, region: Region, data: &[u8]) -> Result<(), HwFault>;

    /// Make previously written pixels visible
    ///
    /// The video generator scans the frame buffer continuously, so this only
    /// reports whether the panel is still streaming.
    fn flush(&mut self) -> Result<(), HwFault>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> Dimensions {
        Dimensions::new(480, 1920).unwrap()
    }

    #[test]
    fn test_region_pixel_count() {
        assert_eq!(Region::new(0, 0, 480, 1920).pixel_count(), 921_600);
    }

    #[test]
    fn test_validate_accepts_full_panel() {
        let region = Region::new(0, 0, 480, 1920);
        let len = 480 * 1920 * 2;
        assert_eq!(region.validate(dims(), PixelFormat::Rgb565, len), Ok(()));
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        let region = Region::new(470, 0, 20, 1);
        assert_eq!(
            region.validate(dims(), PixelFormat::Rgb565, 40),
            Err(HwFault::InvalidRegion {
                x: 470,
                y: 0,
                w: 20,
                h: 1
            })
        );
    }

    #[test]
    fn test_validate_rejects_empty_region() {
        let region = Region::new(0, 0, 0, 10);
        assert!(matches!(
            region.validate(dims(), PixelFormat::Rgb565, 0),
            Err(HwFault::InvalidRegion { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_wrong_length() {
        let region = Region::new(10, 10, 4, 4);
        assert_eq!(
            region.validate(dims(), PixelFormat::Rgb888, 32),
            Err(HwFault::BufferSize {
                required: 48,
                provided: 32
            })
        );
    }
}
