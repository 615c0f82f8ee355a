//! DSI host bus management
//!
//! [`BusHandle`] owns the DSI host peripheral. Because it takes the
//! [`DsiInterface`] implementation by value, exactly one handle can exist per
//! controller, and whoever owns the handle owns every mode transition.
//!
//! `init_bus` always leaves the link in [`Mode::LowPower`]. Video never
//! starts here; switching to [`Mode::Video`] is the sequencer's decision.

use embedded_hal::delay::DelayNs;

use crate::config::{DsiLink, PanelConfig};
use crate::error::{HwFault, host_fault};
use crate::interface::{DsiInterface, poll_until};

/// Highest LP escape clock allowed by the D-PHY specification, in kHz
pub const MAX_ESCAPE_CLOCK_KHZ: u32 = 20_000;

/// DSI link transmission mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Low-power mode, used for DCS command transactions
    LowPower,
    /// High-speed video streaming
    Video,
}

/// PHY parameters derived from the link configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhyConfig {
    /// DSI host instance
    pub bus_id: u8,
    /// Number of data lanes
    pub data_lanes: u8,
    /// Per-lane bit rate in Mbps
    pub lane_bit_rate_mbps: u32,
    /// Lane byte clock (lane bit rate / 8) in kHz
    pub lane_byte_clock_khz: u32,
    /// Divider from lane byte clock to the LP escape clock
    pub tx_escape_divider: u8,
}

impl PhyConfig {
    /// Derive PHY parameters from link settings
    pub fn from_link(link: &DsiLink) -> Self {
        let lane_byte_clock_khz = link.lane_bit_rate_mbps.saturating_mul(1000) / 8;
        let divider = lane_byte_clock_khz.div_ceil(MAX_ESCAPE_CLOCK_KHZ).max(1);
        Self {
            bus_id: link.bus_id,
            data_lanes: link.data_lanes,
            lane_bit_rate_mbps: link.lane_bit_rate_mbps,
            lane_byte_clock_khz,
            tx_escape_divider: divider.min(u32::from(u8::MAX)) as u8,
        }
    }
}

/// Exclusive ownership of a DSI host controller
pub struct BusHandle<H> {
    host: H,
    mode: Option<Mode>,
    // PHY programmed at least once since the last shutdown
    configured: bool,
}

impl<H> BusHandle<H>
where
    H: DsiInterface,
{
    /// Take ownership of the host peripheral; the bus starts down
    pub fn new(host: H) -> Self {
        Self {
            host,
            mode: None,
            configured: false,
        }
    }

    /// Configure the PHY from `config` and bring the link up in low-power mode
    ///
    /// PHY lock is attempted `timeouts.phy_lock_attempts` times, each attempt
    /// reprogramming the PHY and polling for at most `timeouts.phy_lock_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`HwFault::PhyLockTimeout`] when no attempt locks, and
    /// [`HwFault::Host`] when the host rejects a register access.
    pub fn init_bus<D: DelayNs>(
        &mut self,
        config: &PanelConfig,
        delay: &mut D,
    ) -> Result<(), HwFault> {
        if self.configured {
            log::warn!("DSI bus already up, reinitialising");
            self.teardown();
        }

        let phy = PhyConfig::from_link(&config.link);
        let attempts = config.timeouts.phy_lock_attempts;
        log::info!(
            "DSI bus {}: {} lane(s) @ {} Mbps",
            phy.bus_id,
            phy.data_lanes,
            phy.lane_bit_rate_mbps
        );

        for attempt in 1..=attempts {
            self.configured = true;
            self.host
                .configure_bus(&phy)
                .map_err(host_fault("configure_bus"))?;

            let host = &mut self.host;
            let locked = poll_until(delay, config.timeouts.phy_lock_ms, || host.phy_locked())
                .map_err(host_fault("phy_locked"))?;

            if locked {
                self.host
                    .set_mode(Mode::LowPower)
                    .map_err(host_fault("set_mode"))?;
                self.mode = Some(Mode::LowPower);
                log::debug!("PHY locked on attempt {attempt}");
                return Ok(());
            }
            log::warn!("PHY lock attempt {attempt}/{attempts} timed out");
        }

        self.teardown();
        Err(HwFault::PhyLockTimeout)
    }

    /// Switch the link mode
    ///
    /// The bus trusts its caller on ordering; the sequencer only requests
    /// [`Mode::Video`] once the DCS sequence has completed.
    ///
    /// # Errors
    ///
    /// Returns [`HwFault::BusNotReady`] if the bus is down.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), HwFault> {
        if self.mode.is_none() {
            return Err(HwFault::BusNotReady);
        }
        if self.mode == Some(mode) {
            return Ok(());
        }
        self.host.set_mode(mode).map_err(host_fault("set_mode"))?;
        log::debug!("DSI mode -> {mode:?}");
        self.mode = Some(mode);
        Ok(())
    }

    /// Shut the PHY down; the handle stays valid for a later `init_bus`
    ///
    /// Also releases a PHY left programmed by an `init_bus` that failed
    /// part-way.
    pub fn teardown(&mut self) {
        self.mode = None;
        if core::mem::take(&mut self.configured) {
            if let Err(e) = self.host.shutdown_bus() {
                log::warn!("DSI bus shutdown failed: {e:?}");
            }
        }
    }

    /// Current link mode (`None` while the bus is down)
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Release the host peripheral
    pub fn release(self) -> H {
        self.host
    }

    pub(crate) fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}
