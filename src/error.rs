//! Error types for the driver
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and panel bring-up and operation ([`HwFault`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`HwFault`] - Hardware faults raised while bringing up or driving the panel
//! - [`Fault`] - A fault recorded by the sequencer together with the stage it interrupted
//!
//! ## Example
//!
//! ```
//! use ota7290b::{Builder, BuilderError, Dimensions};
//!
//! // Missing dimensions
//! let result = Builder::new().build();
//! assert!(matches!(result, Err(BuilderError::MissingDimensions)));
//!
//! // Invalid dimensions
//! let result = Dimensions::new(0, 1920);
//! assert!(result.is_err());
//! ```

use core::fmt::Debug;

use crate::sequencer::Stage;

/// Highest number of DSI data lanes defined by the MIPI D-PHY specification
pub const MAX_DATA_LANES: u8 = 4;

/// Highest per-lane bit rate defined by the MIPI D-PHY specification (v2.5), in Mbps
pub const MAX_LANE_RATE_MBPS: u32 = 4_500;

/// Hardware faults raised by the bring-up core
///
/// Every wait in the driver is bounded, so a stalled peripheral always ends
/// in one of the timeout variants rather than a hang.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HwFault {
    /// The panel power rail never reported ready within the configured budget
    PowerRailTimeout,
    /// The DSI PHY / PLL did not lock within the bounded retry window
    PhyLockTimeout,
    /// The DSI bus is down or not in the mode the operation requires
    BusNotReady,
    /// The bus reported no acknowledgment for a DCS command
    AckTimeout,
    /// The DPI video generator reported a FIFO underrun while starting
    TimingUnderrun,
    /// The panel is not streaming video yet (or has been torn down)
    NotReady,
    /// A reset or power-enable pin could not be driven
    Gpio,
    /// The DSI host reported a register or transfer error
    Host,
    /// A pixel transfer did not complete within the configured budget
    TransferTimeout,
    /// A pixel region lies outside the panel or is empty
    InvalidRegion {
        /// X coordinate
        x: u16,
        /// Y coordinate
        y: u16,
        /// Width
        w: u16,
        /// Height
        h: u16,
    },
    /// Pixel data length does not match the region
    BufferSize {
        /// Required length in bytes
        required: usize,
        /// Provided length in bytes
        provided: usize,
    },
}

impl core::fmt::Display for HwFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PowerRailTimeout => write!(f, "Timeout waiting for power rail"),
            Self::PhyLockTimeout => write!(f, "Timeout waiting for DSI PHY lock"),
            Self::BusNotReady => write!(f, "DSI bus not in the required mode"),
            Self::AckTimeout => write!(f, "Timeout waiting for DCS acknowledgment"),
            Self::TimingUnderrun => write!(f, "DPI video FIFO underrun"),
            Self::NotReady => write!(f, "Panel is not streaming video"),
            Self::Gpio => write!(f, "GPIO error"),
            Self::Host => write!(f, "DSI host error"),
            Self::TransferTimeout => write!(f, "Timeout waiting for pixel transfer"),
            Self::InvalidRegion { x, y, w, h } => {
                write!(f, "Invalid region: x={x}, y={y}, w={w}, h={h}")
            }
            Self::BufferSize { required, provided } => {
                write!(
                    f,
                    "Pixel buffer size mismatch: required {required} bytes, provided {provided}"
                )
            }
        }
    }
}

impl core::error::Error for HwFault {}

/// A fault recorded by the sequencer
///
/// `previous` is the last stage the panel had successfully reached before
/// `cause` stopped forward progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fault {
    /// Last stage reached before the fault
    pub previous: Stage,
    /// The fault that stopped the sequencer
    pub cause: HwFault,
}

impl core::fmt::Display for Fault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (after {:?})", self.cause, self.previous)
    }
}

impl core::error::Error for Fault {}

/// Convert a DSI host error into [`HwFault::Host`], logging the original error
pub(crate) fn host_fault<E: Debug>(operation: &'static str) -> impl FnOnce(E) -> HwFault {
    move |e| {
        log::error!("{operation}: DSI host error {e:?}");
        HwFault::Host
    }
}

/// Convert a pin error into [`HwFault::Gpio`], logging the original error
pub(crate) fn gpio_fault<E: Debug>(operation: &'static str) -> impl FnOnce(E) -> HwFault {
    move |e| {
        log::error!("{operation}: GPIO error {e:?}");
        HwFault::Gpio
    }
}

/// Errors that can occur when building configuration
///
/// These errors occur during the builder pattern before the panel is created.
#[derive(Debug, PartialEq, Eq)]
pub enum BuilderError {
    /// Dimensions were not specified
    ///
    /// [`Builder::dimensions()`](crate::config::Builder::dimensions) must be called before building.
    MissingDimensions,
    /// Horizontal and vertical sync timing were not specified
    MissingTiming,
    /// DSI link parameters were not specified
    MissingLink,
    /// The post-SLPOUT wake delay was not specified
    ///
    /// This is a panel datasheet value and has no safe default.
    MissingWakeDelay,
    /// Invalid dimensions provided
    InvalidDimensions {
        /// Active width requested
        width: u16,
        /// Active height requested
        height: u16,
    },
    /// Data lane count outside `1..=MAX_DATA_LANES`
    InvalidLaneCount(u8),
    /// Pixel clock of zero
    ZeroPixelClock,
    /// Lane bit rate of zero
    ZeroLaneRate,
    /// Lane bit rate above `MAX_LANE_RATE_MBPS`
    LaneRateTooHigh(u32),
    /// The DSI link cannot carry the configured pixel stream
    InsufficientBandwidth {
        /// Pixel stream bandwidth in Mbps
        required_mbps: u32,
        /// Link bandwidth in Mbps
        available_mbps: u32,
    },
    /// A wait budget of zero would make a bounded wait fail immediately
    ZeroTimeout,
    /// The init table contains an opcode the sequencer sends itself
    ReservedOpcode {
        /// Offending opcode
        opcode: u8,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingDimensions => write!(f, "Dimensions must be specified"),
            Self::MissingTiming => write!(f, "Sync timing must be specified"),
            Self::MissingLink => write!(f, "DSI link must be specified"),
            Self::MissingWakeDelay => write!(f, "Wake delay must be specified"),
            Self::InvalidDimensions { width, height } => {
                write!(f, "Invalid dimensions {width}x{height}")
            }
            Self::InvalidLaneCount(lanes) => {
                write!(f, "Invalid lane count {lanes} (1..={MAX_DATA_LANES})")
            }
            Self::ZeroPixelClock => write!(f, "Pixel clock must be non-zero"),
            Self::ZeroLaneRate => write!(f, "Lane bit rate must be non-zero"),
            Self::LaneRateTooHigh(mbps) => {
                write!(f, "Lane bit rate {mbps} Mbps above {MAX_LANE_RATE_MBPS} Mbps")
            }
            Self::InsufficientBandwidth {
                required_mbps,
                available_mbps,
            } => write!(
                f,
                "Link bandwidth {available_mbps} Mbps below pixel stream {required_mbps} Mbps"
            ),
            Self::ZeroTimeout => write!(f, "Wait budgets must be non-zero"),
            Self::ReservedOpcode { opcode } => {
                write!(f, "Opcode 0x{opcode:02X} is reserved for the sequencer")
            }
        }
    }
}

impl core::error::Error for BuilderError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_fault_display_includes_stage() {
        let fault = Fault {
            previous: Stage::PoweredUp,
            cause: HwFault::PhyLockTimeout,
        };
        assert_eq!(
            fault.to_string(),
            "Timeout waiting for DSI PHY lock (after PoweredUp)"
        );
    }

    #[test]
    fn test_reserved_opcode_display() {
        let err = BuilderError::ReservedOpcode { opcode: 0x01 };
        assert_eq!(err.to_string(), "Opcode 0x01 is reserved for the sequencer");
    }

    #[test]
    fn test_host_fault_maps_any_error() {
        let fault = host_fault("start_video")(42u8);
        assert_eq!(fault, HwFault::Host);
    }
}
