//! DCS command channel
//!
//! Sends [`CommandFrame`]s over the DSI bus while it is in low-power mode.
//! Every frame is acknowledged (bounded by `timeouts.ack_ms`) and its
//! post-delay elapses before the next frame goes out.

use embedded_hal::delay::DelayNs;

use crate::bus::{BusHandle, Mode};
use crate::command::CommandFrame;
use crate::config::PanelConfig;
use crate::error::{HwFault, host_fault};
use crate::interface::{DsiInterface, poll_until};

/// Low-power DCS transport on one virtual channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandChannel {
    virtual_channel: u8,
    ack_timeout_ms: u32,
}

impl CommandChannel {
    /// Create a channel on `virtual_channel` with an acknowledgment budget
    pub fn new(virtual_channel: u8, ack_timeout_ms: u32) -> Self {
        Self {
            virtual_channel,
            ack_timeout_ms,
        }
    }

    /// Create the channel described by a panel configuration
    pub fn from_config(config: &PanelConfig) -> Self {
        Self::new(config.link.virtual_channel, config.timeouts.ack_ms)
    }

    /// Send one frame and wait for its acknowledgment and post-delay
    ///
    /// # Errors
    ///
    /// - [`HwFault::BusNotReady`] if the bus is down or streaming video
    /// - [`HwFault::AckTimeout`] if no acknowledgment arrives in time
    /// - [`HwFault::Host`] if the host rejects the packet
    pub fn send<H, D>(
        &self,
        bus: &mut BusHandle<H>,
        frame: &CommandFrame<'_>,
        delay: &mut D,
    ) -> Result<(), HwFault>
    where
        H: DsiInterface,
        D: DelayNs,
    {
        if bus.mode() != Some(Mode::LowPower) {
            log::error!(
                "DCS 0x{:02X} refused, bus mode {:?}",
                frame.opcode,
                bus.mode()
            );
            return Err(HwFault::BusNotReady);
        }

        log::debug!(
            "DCS 0x{:02X} {:02X?} (+{} ms)",
            frame.opcode,
            frame.params,
            frame.post_delay_ms
        );
        let host = bus.host_mut();
        host.write_dcs(self.virtual_channel, frame.opcode, frame.params)
            .map_err(host_fault("write_dcs"))?;

        let acked = poll_until(delay, self.ack_timeout_ms, || host.dcs_acknowledged())
            .map_err(host_fault("dcs_acknowledged"))?;
        if !acked {
            log::error!("DCS 0x{:02X} not acknowledged", frame.opcode);
            return Err(HwFault::AckTimeout);
        }

        if frame.post_delay_ms > 0 {
            delay.delay_ms(frame.post_delay_ms);
        }
        Ok(())
    }

    /// Send frames in order, stopping at the first failure
    ///
    /// # Errors
    ///
    /// Returns the first frame's error; later frames are not sent.
    pub fn send_sequence<H, D>(
        &self,
        bus: &mut BusHandle<H>,
        frames: &[CommandFrame<'_>],
        delay: &mut D,
    ) -> Result<(), HwFault>
    where
        H: DsiInterface,
        D: DelayNs,
    {
        for (index, frame) in frames.iter().enumerate() {
            if let Err(e) = self.send(bus, frame, delay) {
                log::error!("command sequence aborted at entry {index}/{}", frames.len());
                return Err(e);
            }
        }
        Ok(())
    }
}
