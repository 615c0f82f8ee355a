//! MIPI DCS command definitions
//!
//! This module defines the Display Command Set opcodes used while the DSI
//! bus is in low-power mode, and the [`CommandFrame`] type describing a
//! single DCS transaction.
//!
//! ## Frame Structure
//!
//! Each frame is sent as one DSI packet on the configured virtual channel:
//! 1. Opcode byte
//! 2. Parameter bytes (none for a short write, one for a short write with
//!    parameter, more for a long write)
//! 3. Optional post-delay before the next frame
//!
//! ## Example
//!
//! ```
//! use ota7290b::command::{self, CommandFrame};
//!
//! const TABLE: &[CommandFrame<'static>] = &[
//!     CommandFrame::new(command::SET_PIXEL_FORMAT, &[0x55]),
//!     CommandFrame::new(0xB0, &[0x5A, 0x01]).with_delay(5),
//! ];
//! assert_eq!(TABLE[1].post_delay_ms, 5);
//! ```

// Power and mode commands

/// NOP (0x00)
pub const NOP: u8 = 0x00;

/// Soft reset (0x01)
///
/// On OTA7290B panels this also resets the bridge and discards any
/// configuration it received over its side channel, so the sequencer never
/// sends it and init tables may not contain it.
pub const SOFT_RESET: u8 = 0x01;

/// Enter sleep mode (0x10)
pub const ENTER_SLEEP_MODE: u8 = 0x10;

/// Exit sleep mode, SLPOUT (0x11)
///
/// Wakes the panel electronics. The panel needs its datasheet wake delay
/// before it accepts further configuration.
pub const EXIT_SLEEP_MODE: u8 = 0x11;

/// Set display off, DISPOFF (0x28)
pub const SET_DISPLAY_OFF: u8 = 0x28;

/// Set display on, DISPON (0x29)
///
/// Enables panel output. Sent as the last frame before video starts.
pub const SET_DISPLAY_ON: u8 = 0x29;

// Addressing and format commands

/// Write memory start (0x2C)
pub const WRITE_MEMORY_START: u8 = 0x2C;

/// Set tear effect line on (0x35)
///
/// Requires 1 byte: 0x00 = V-blank only, 0x01 = V-blank and H-blank
pub const SET_TEAR_ON: u8 = 0x35;

/// Set address mode, MADCTL (0x36)
pub const SET_ADDRESS_MODE: u8 = 0x36;

/// Set pixel format, COLMOD (0x3A)
///
/// Requires 1 byte: 0x55 = 16 bpp, 0x66 = 18 bpp, 0x77 = 24 bpp
pub const SET_PIXEL_FORMAT: u8 = 0x3A;

/// Write display brightness (0x51)
pub const SET_DISPLAY_BRIGHTNESS: u8 = 0x51;

/// A single DCS transaction
///
/// Frames are constructed, transmitted and discarded; panel init tables are
/// `'static` slices of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandFrame<'a> {
    /// DCS opcode
    pub opcode: u8,
    /// Parameter bytes
    pub params: &'a [u8],
    /// Delay to honor after the frame is acknowledged, in milliseconds
    pub post_delay_ms: u32,
}

impl<'a> CommandFrame<'a> {
    /// Create a frame with no post-delay
    pub const fn new(opcode: u8, params: &'a [u8]) -> Self {
        Self {
            opcode,
            params,
            post_delay_ms: 0,
        }
    }

    /// Set the post-delay in milliseconds
    pub const fn with_delay(mut self, ms: u32) -> Self {
        self.post_delay_ms = ms;
        self
    }

    /// Whether the sequencer reserves this opcode for itself
    pub const fn is_reserved(&self) -> bool {
        matches!(self.opcode, SOFT_RESET | EXIT_SLEEP_MODE | SET_DISPLAY_ON)
    }
}

/// An entry of a panel init table
pub type InitCommand = CommandFrame<'static>;

/// Build a bracket frame (SLPOUT / DISPON / DISPOFF / SLPIN) with an optional single parameter
pub(crate) fn bracket_frame(
    opcode: u8,
    param: Option<&u8>,
    post_delay_ms: u32,
) -> CommandFrame<'_> {
    let params: &[u8] = match param {
        Some(value) => core::slice::from_ref(value),
        None => &[],
    };
    CommandFrame::new(opcode, params).with_delay(post_delay_ms)
}
