//! OTA7290B MIPI-DSI Panel Driver
//!
//! A bring-up driver for MIPI-DSI panels behind an OTA7290B bridge, such as
//! the Waveshare 8.8" 480x1920 panel.
//!
//! These panels only work when the bring-up order is exact: power and reset,
//! DSI bus up in low-power mode, SLPOUT, the panel wake delay, the init table,
//! DISPON, and only then the switch to video mode and DPI video start. The
//! [`Sequencer`] enforces that order one step at a time and records where a
//! failure stopped it.
//!
//! ## Features
//!
//! - `no_std` compatible
//! - `embedded-hal` v1.0 support
//! - `embedded-graphics` integration (with `graphics` feature)
//! - Bounded waits everywhere: every failure is a [`HwFault`], never a hang
//! - Step-wise bring-up with best-effort teardown
//! - Rotation support
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::OutputPin;
//! use ota7290b::interface::DsiInterface;
//! use ota7290b::power::PowerPins;
//! use ota7290b::{Panel, PanelState, Rotation, panels};
//!
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct MockHost;
//! # impl DsiInterface for MockHost {
//! #     type Error = Infallible;
//! #     fn configure_bus(&mut self, _: &ota7290b::bus::PhyConfig) -> Result<(), Infallible> { Ok(()) }
//! #     fn phy_locked(&mut self) -> Result<bool, Infallible> { Ok(true) }
//! #     fn set_mode(&mut self, _: ota7290b::Mode) -> Result<(), Infallible> { Ok(()) }
//! #     fn write_dcs(&mut self, _: u8, _: u8, _: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn dcs_acknowledged(&mut self) -> Result<bool, Infallible> { Ok(true) }
//! #     fn configure_video(&mut self, _: &ota7290b::VideoTimingProgram) -> Result<(), Infallible> { Ok(()) }
//! #     fn start_video(&mut self) -> Result<(), Infallible> { Ok(()) }
//! #     fn video_underrun(&mut self) -> Result<bool, Infallible> { Ok(false) }
//! #     fn stop_video(&mut self) -> Result<(), Infallible> { Ok(()) }
//! #     fn draw_bitmap(&mut self, _: &ota7290b::Region, _: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn transfer_done(&mut self) -> Result<bool, Infallible> { Ok(true) }
//! #     fn shutdown_bus(&mut self) -> Result<(), Infallible> { Ok(()) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let reset_pin = MockPin;
//! # let host = MockHost;
//! # let delay = MockDelay;
//! let config = match panels::waveshare_8inch8().rotation(Rotation::Rotate90).build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//!
//! let mut panel = Panel::new(config, PowerPins::new(reset_pin), host, delay);
//! panel.log_config();
//! match panel.initialize() {
//!     Ok(()) => assert_eq!(panel.state(), PanelState::VideoStreaming),
//!     Err(_) => panel.teardown(),
//! }
//! ```

#![no_std]

#[cfg(test)]
extern crate alloc;

/// DSI host bus management
pub mod bus;
/// DCS command transport
pub mod channel;
/// MIPI DCS command definitions
pub mod command;
/// Panel configuration types and builder
pub mod config;
/// Panel driver
pub mod display;
/// Error types for the driver
pub mod error;
/// Hardware interface abstraction
pub mod interface;
/// Presets for known panels
pub mod panels;
/// Panel power and reset control
pub mod power;
/// Coordinate rotation utilities
pub mod rotation;
/// Bring-up state machine
pub mod sequencer;
/// Display surface abstraction
pub mod surface;
/// DPI video control
pub mod video;

/// Graphics support via embedded-graphics (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod graphics;

#[cfg(test)]
mod mock;

pub use bus::{BusHandle, Mode};
pub use channel::CommandChannel;
pub use command::{CommandFrame, InitCommand};
pub use config::{
    Builder, Dimensions, DsiLink, PanelConfig, PixelFormat, PowerRail, ResetTiming, Rotation,
    SyncTiming, Timeouts,
};
pub use display::Panel;
pub use error::{BuilderError, Fault, HwFault, MAX_DATA_LANES, MAX_LANE_RATE_MBPS};
pub use interface::{DsiInterface, POLL_INTERVAL_MS, PowerInterface};
pub use power::{NoPin, PowerController, PowerPins};
pub use sequencer::{PanelState, Sequencer, Stage};
pub use surface::{DisplaySurface, Region};
pub use video::{VideoController, VideoTimingProgram};
