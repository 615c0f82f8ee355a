//! Hardware interface abstraction
//!
//! This module provides the two hardware seams of the driver:
//!
//! - [`DsiInterface`]: register-level access to the DSI host controller, its
//!   command (DBI) path and its DPI video generator
//! - [`PowerInterface`]: the panel power rail and the hardware reset line
//!
//! No other part of the crate touches hardware. The bring-up logic in
//! [`Sequencer`](crate::sequencer::Sequencer) only ever talks to these traits,
//! which makes every ordering and timing property testable with mocks.
//!
//! ## Implementing
//!
//! [`PowerPins`](crate::power::PowerPins) implements [`PowerInterface`] for
//! plain embedded-hal GPIO. [`DsiInterface`] is platform specific and is
//! implemented on top of the vendor's DSI host driver (on ESP32-P4, the
//! `esp_lcd` DSI bus, DBI IO and DPI panel handles).
//!
//! Implementations must not block: every status query returns immediately
//! and the driver does the bounded polling.

use core::fmt::Debug;
use embedded_hal::delay::DelayNs;

use crate::bus::{Mode, PhyConfig};
use crate::config::PowerRail;
use crate::surface::Region;
use crate::video::VideoTimingProgram;

/// Poll interval for every bounded wait, in milliseconds
pub const POLL_INTERVAL_MS: u32 = 1;

/// Register-level access to a DSI host controller
pub trait DsiInterface {
    /// Error type for host operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Program PHY lane count, lane rate and clock dividers and enable the PLL
    fn configure_bus(&mut self, phy: &PhyConfig) -> Result<(), Self::Error>;

    /// Whether the PHY PLL has locked
    fn phy_locked(&mut self) -> Result<bool, Self::Error>;

    /// Switch the link between low-power command mode and high-speed video mode
    fn set_mode(&mut self, mode: Mode) -> Result<(), Self::Error>;

    /// Queue one DCS packet on a virtual channel
    fn write_dcs(
        &mut self,
        virtual_channel: u8,
        opcode: u8,
        params: &[u8],
    ) -> Result<(), Self::Error>;

    /// Whether the last DCS packet was acknowledged
    fn dcs_acknowledged(&mut self) -> Result<bool, Self::Error>;

    /// Load a timing program into the DPI video generator without starting it
    fn configure_video(&mut self, program: &VideoTimingProgram) -> Result<(), Self::Error>;

    /// Start streaming video
    fn start_video(&mut self) -> Result<(), Self::Error>;

    /// Whether the video generator has flagged a FIFO underrun since the last start
    fn video_underrun(&mut self) -> Result<bool, Self::Error>;

    /// Stop streaming video
    fn stop_video(&mut self) -> Result<(), Self::Error>;

    /// Start copying pixel data for `region` into the frame buffer
    fn draw_bitmap(&mut self, region: &Region, data: &[u8]) -> Result<(), Self::Error>;

    /// Whether the last `draw_bitmap` copy has completed
    fn transfer_done(&mut self) -> Result<bool, Self::Error>;

    /// Disable the PHY and release the bus
    fn shutdown_bus(&mut self) -> Result<(), Self::Error>;
}

/// Access to the panel power rail and reset line
pub trait PowerInterface {
    /// Error type for power operations
    type Error: Debug;

    /// Enable or disable a power rail
    fn set_rail(&mut self, rail: PowerRail, enabled: bool) -> Result<(), Self::Error>;

    /// Rail ready feedback
    ///
    /// Returns `Ok(None)` when the board has no feedback for this rail; the
    /// driver then falls back to the rail's timed stable delay.
    fn rail_ready(&mut self, rail: PowerRail) -> Result<Option<bool>, Self::Error>;

    /// Drive the reset line to a physical level
    fn drive_reset(&mut self, high: bool) -> Result<(), Self::Error>;
}

/// Poll `ready` every [`POLL_INTERVAL_MS`] until it returns true or `timeout_ms` elapses
///
/// Returns `Ok(false)` on timeout. `ready` is always checked once more after
/// the last delay, so a condition that becomes true exactly at the deadline
/// is still observed.
pub(crate) fn poll_until<D, E, F>(delay: &mut D, timeout_ms: u32, mut ready: F) -> Result<bool, E>
where
    D: DelayNs,
    F: FnMut() -> Result<bool, E>,
{
    let mut waited = 0u32;
    loop {
        if ready()? {
            return Ok(true);
        }
        if waited >= timeout_ms {
            return Ok(false);
        }
        delay.delay_ms(POLL_INTERVAL_MS);
        waited += POLL_INTERVAL_MS;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingDelay;

    #[test]
    fn test_poll_until_ready_immediately() {
        let mut delay = RecordingDelay::default();
        let result: Result<bool, ()> = poll_until(&mut delay, 10, || Ok(true));
        assert_eq!(result, Ok(true));
        assert_eq!(delay.total_ms(), 0);
    }

    #[test]
    fn test_poll_until_times_out() {
        let mut delay = RecordingDelay::default();
        let mut polls = 0;
        let result: Result<bool, ()> = poll_until(&mut delay, 5, || {
            polls += 1;
            Ok(false)
        });
        assert_eq!(result, Ok(false));
        assert_eq!(polls, 6);
        assert_eq!(delay.total_ms(), 5);
    }

    #[test]
    fn test_poll_until_ready_after_some_polls() {
        let mut delay = RecordingDelay::default();
        let mut polls = 0;
        let result: Result<bool, ()> = poll_until(&mut delay, 10, || {
            polls += 1;
            Ok(polls == 3)
        });
        assert_eq!(result, Ok(true));
        assert_eq!(delay.total_ms(), 2);
    }

    #[test]
    fn test_poll_until_propagates_error() {
        let mut delay = RecordingDelay::default();
        let result: Result<bool, u8> = poll_until(&mut delay, 10, || Err(7));
        assert_eq!(result, Err(7));
    }
}
