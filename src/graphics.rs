//! Graphics support via embedded-graphics
//!
//! This module implements [`DrawTarget`] for [`Panel`], so any
//! embedded-graphics primitive can be drawn straight into the DPI frame
//! buffer once the panel is streaming.
//!
//! ## Features
//!
//! - 2D graphics primitives (lines, rectangles, circles, text, etc.)
//! - Rotation support (logical coordinates are mapped onto the native panel)
//! - Row-chunked solid fills
//!
//! Colors are given as [`Rgb888`] and encoded into the panel's
//! [`PixelFormat`] on the way out. Every draw is synchronous, so a draw call
//! returns only after its pixels are in the frame buffer.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_graphics::{
//!     pixelcolor::Rgb888,
//!     prelude::*,
//!     primitives::{Circle, PrimitiveStyle, Rectangle},
//! };
//! use ota7290b::{Panel, panels};
//! # use ota7290b::interface::{DsiInterface, PowerInterface};
//! # fn run<P: PowerInterface, H: DsiInterface, D: embedded_hal::delay::DelayNs>(
//! #     power: P, host: H, delay: D,
//! # ) {
//! # let config = match panels::waveshare_8inch8().build() {
//! #     Ok(config) => config,
//! #     Err(_) => return,
//! # };
//! let mut panel = Panel::new(config, power, host, delay);
//! if panel.initialize().is_err() {
//!     return;
//! }
//!
//! let _ = panel.clear(Rgb888::BLACK);
//! let _ = Rectangle::new(Point::new(10, 10), Size::new(200, 100))
//!     .into_styled(PrimitiveStyle::with_fill(Rgb888::BLUE))
//!     .draw(&mut panel);
//! let _ = Circle::new(Point::new(100, 400), 80)
//!     .into_styled(PrimitiveStyle::with_stroke(Rgb888::WHITE, 3))
//!     .draw(&mut panel);
//! # }
//! ```

use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{Dimensions as _, OriginDimensions, Point, Size},
    pixelcolor::{Rgb888, RgbColor},
    prelude::Pixel,
    primitives::Rectangle,
};
use embedded_hal::delay::DelayNs;

use crate::config::PixelFormat;
use crate::display::Panel;
use crate::error::HwFault;
use crate::interface::{DsiInterface, PowerInterface};
use crate::rotation::{apply_rotation, rotate_region};
use crate::surface::{DisplaySurface, Region};

/// Largest number of pixels sent per write during solid fills
pub const LINE_PIXELS: usize = 256;

/// Encode a color into the frame buffer byte layout of `format`
///
/// Pixels are stored as little-endian words: RGB565 as two bytes, RGB666
/// and RGB888 as three bytes (blue first). RGB666 keeps the top six bits of
/// each channel. Returns the number of bytes written to `out`.
pub fn encode_pixel(color: Rgb888, format: PixelFormat, out: &mut [u8; 3]) -> usize {
    let (r, g, b) = (color.r(), color.g(), color.b());
    match format {
        PixelFormat::Rgb565 => {
            let value =
                (u16::from(r & 0xF8) << 8) | (u16::from(g & 0xFC) << 3) | u16::from(b >> 3);
            out[..2].copy_from_slice(&value.to_le_bytes());
            2
        }
        PixelFormat::Rgb666 => {
            *out = [b & 0xFC, g & 0xFC, r & 0xFC];
            3
        }
        PixelFormat::Rgb888 => {
            *out = [b, g, r];
            3
        }
    }
}

impl<P, H, D> Panel<P, H, D>
where
    P: PowerInterface,
    H: DsiInterface,
    D: DelayNs,
{
    fn native_size(&self) -> (u32, u32) {
        let dims = self.config().dimensions;
        (u32::from(dims.width), u32::from(dims.height))
    }
}

impl<P, H, D> DrawTarget for Panel<P, H, D>
where
    P: PowerInterface,
    H: DsiInterface,
    D: DelayNs,
{
    type Color = Rgb888;
    type Error = HwFault;

    fn draw_iter<Iter>(&mut self, pixels: Iter) -> Result<(), Self::Error>
    where
        Iter: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let sz = self.size();
        let (width, height) = self.native_size();
        let rotation = self.config().rotation;
        let format = self.config().pixel_format;
        let mut encoded = [0u8; 3];

        for Pixel(Point { x, y }, color) in pixels {
            if x < 0 || y < 0 {
                continue;
            }

            let x = x as u32;
            let y = y as u32;

            if x >= sz.width || y >= sz.height {
                continue;
            }

            let (nx, ny) = apply_rotation(x, y, width, height, rotation);
            let len = encode_pixel(color, format, &mut encoded);
            self.write_pixels(Region::new(nx as u16, ny as u16, 1, 1), &encoded[..len])?;
        }

        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if area.bottom_right().is_none() {
            return Ok(());
        }

        let (width, height) = self.native_size();
        let logical = Region::new(
            area.top_left.x as u16,
            area.top_left.y as u16,
            area.size.width as u16,
            area.size.height as u16,
        );
        let native = rotate_region(logical, width, height, self.config().rotation);

        let mut encoded = [0u8; 3];
        let bpp = encode_pixel(color, self.config().pixel_format, &mut encoded);
        let mut line = [0u8; LINE_PIXELS * 3];
        for (i, byte) in line.iter_mut().enumerate() {
            *byte = encoded[i % bpp];
        }

        let right = native.x + native.w;
        for row in native.y..native.y + native.h {
            let mut x = native.x;
            while x < right {
                let count = (right - x).min(LINE_PIXELS as u16);
                self.write_pixels(Region::new(x, row, count, 1), &line[..count as usize * bpp])?;
                x += count;
            }
        }
        Ok(())
    }
}

impl<P, H, D> OriginDimensions for Panel<P, H, D>
where
    P: PowerInterface,
    H: DsiInterface,
    D: DelayNs,
{
    fn size(&self) -> Size {
        let rotated = self.config().rotated_dimensions();
        Size::new(u32::from(rotated.width), u32::from(rotated.height))
    }
}
