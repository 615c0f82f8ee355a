//! Panel driver
//!
//! [`Panel`] bundles a [`Sequencer`] with the delay provider it needs and
//! exposes the streaming panel as a [`DisplaySurface`].

use embedded_hal::delay::DelayNs;

use crate::config::PanelConfig;
use crate::error::HwFault;
use crate::interface::{DsiInterface, PowerInterface};
use crate::sequencer::{PanelState, Sequencer};
use crate::surface::{DisplaySurface, Region};
use crate::video::VideoTimingProgram;

type PanelResult<T = ()> = core::result::Result<T, HwFault>;

/// OTA7290B panel driver
///
/// Owns the power interface, the DSI host and the delay provider.
/// For embedded-graphics support, enable the `graphics` feature.
///
/// ## Example
///
/// ```rust,no_run
/// # use ota7290b::interface::{DsiInterface, PowerInterface};
/// use ota7290b::{DisplaySurface, Panel, Region, panels};
/// # fn run<P: PowerInterface, H: DsiInterface, D: embedded_hal::delay::DelayNs>(
/// #     power: P, host: H, delay: D,
/// # ) {
/// let config = match panels::waveshare_8inch8().build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// let mut panel = Panel::new(config, power, host, delay);
/// panel.log_config();
/// if panel.initialize().is_err() {
///     panel.teardown();
///     return;
/// }
///
/// // One black RGB565 line
/// let line = [0u8; 480 * 2];
/// let _ = panel.write_pixels(Region::new(0, 0, 480, 1), &line);
/// # }
/// ```
pub struct Panel<P, H, D> {
    sequencer: Sequencer<P, H>,
    delay: D,
}

impl<P, H, D> Panel<P, H, D>
where
    P: PowerInterface,
    H: DsiInterface,
    D: DelayNs,
{
    /// Create a new panel; nothing is touched until [`initialize`](Self::initialize)
    pub fn new(config: PanelConfig, power: P, host: H, delay: D) -> Self {
        Self {
            sequencer: Sequencer::new(config, power, host),
            delay,
        }
    }

    /// Bring the panel up to video streaming
    ///
    /// # Errors
    ///
    /// Returns the fault that stopped bring-up; [`state`](Self::state) then
    /// reports [`PanelState::Faulted`].
    pub fn initialize(&mut self) -> PanelResult {
        self.sequencer.initialize(&mut self.delay)
    }

    /// Perform one bring-up transition
    pub fn step(&mut self) -> PanelResult<PanelState> {
        self.sequencer.step(&mut self.delay)
    }

    /// Abandon bring-up or streaming and release the hardware
    pub fn abort(&mut self) {
        self.sequencer.abort(&mut self.delay);
    }

    /// Orderly shutdown back to [`PanelState::Uninitialized`]
    pub fn teardown(&mut self) {
        self.sequencer.teardown(&mut self.delay);
    }

    /// Current state
    pub fn state(&self) -> PanelState {
        self.sequencer.state()
    }

    /// Panel configuration
    pub fn config(&self) -> &PanelConfig {
        self.sequencer.config()
    }

    /// Video timing program derived from the configuration
    pub fn program(&self) -> &VideoTimingProgram {
        self.sequencer.program()
    }

    /// Log the configuration and derived timing at info level
    pub fn log_config(&self) {
        let program = self.program();
        log::info!("OTA7290B panel: {}", self.config());
        log::info!(
            "  timing: {}x{} total, line {} ns, {}.{:03} Hz",
            program.h_total,
            program.v_total,
            program.line_time_ns,
            program.frame_rate_mhz / 1000,
            program.frame_rate_mhz % 1000
        );
    }

    /// Release the power interface, the host and the delay
    pub fn release(self) -> (P, H, D) {
        let (power, host) = self.sequencer.release();
        (power, host, self.delay)
    }
}

impl<P, H, D> DisplaySurface for Panel<P, H, D>
where
    P: PowerInterface,
    H: DsiInterface,
    D: DelayNs,
{
    fn bounds(&self) -> (u16, u16) {
        let dims = self.config().dimensions;
        (dims.width, dims.height)
    }

    fn write_pixels(&mut self, region: Region, data: &[u8]) -> PanelResult {
        if self.state() != PanelState::VideoStreaming {
            return Err(HwFault::NotReady);
        }
        let config = self.sequencer.config();
        region.validate(config.dimensions, config.pixel_format, data.len())?;
        self.sequencer.write_pixels(&region, data, &mut self.delay)
    }

    fn flush(&mut self) -> PanelResult {
        match self.state() {
            PanelState::VideoStreaming => Ok(()),
            PanelState::Faulted(fault) => Err(fault.cause),
            _ => Err(HwFault::NotReady),
        }
    }
}
