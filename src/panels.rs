//! Presets for known OTA7290B panels
//!
//! Each preset returns a [`Builder`] so board code can still override
//! rotation, timeouts or the reset line before calling `build()`.

use crate::config::{Builder, Dimensions, DsiLink, PixelFormat, PowerRail, SyncTiming};

/// Waveshare 8.8" DSI panel (480x1920, two lanes)
///
/// The panel's MIPI PHY is fed from LDO channel 3 at 2.5 V on ESP32-P4
/// boards. No init table is needed; the bridge is configured at the factory.
///
/// ```
/// use ota7290b::{Rotation, panels};
///
/// let config = match panels::waveshare_8inch8().rotation(Rotation::Rotate90).build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert_eq!(config.rotated_dimensions().width, 1920);
/// ```
pub fn waveshare_8inch8() -> Builder {
    Builder::new()
        .dimensions(Dimensions {
            width: 480,
            height: 1920,
        })
        .pixel_format(PixelFormat::Rgb565)
        .timing(SyncTiming::new(50, 50, 50), SyncTiming::new(20, 20, 20))
        .pixel_clock_mhz(75)
        .link(DsiLink::new(2, 1300))
        .power_rail(PowerRail {
            id: 3,
            millivolts: 2500,
            stable_ms: 10,
        })
        .wake_delay_ms(120)
        .display_on_delay_ms(20)
        .bracket_param(Some(0x00))
}
