//! Panel bring-up sequencer
//!
//! [`Sequencer`] drives the panel through its bring-up stages, strictly in
//! order and one transition per [`step`](Sequencer::step):
//!
//! ```text
//! Uninitialized -> PoweredUp -> BusReady -> PanelAwake -> PanelConfigured -> VideoStreaming
//!   power rail +     PHY lock,    SLPOUT +      init table,    switch to video,
//!   reset pulse      LP mode      wake delay    DISPON         start DPI stream
//! ```
//!
//! Any failure moves the sequencer to [`PanelState::Faulted`], recording the
//! last stage reached and the cause. A faulted sequencer makes no further
//! progress until it is torn down.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use ota7290b::interface::{DsiInterface, PowerInterface};
//! # use ota7290b::{PanelState, Sequencer, panels};
//! # fn bring_up<P: PowerInterface, H: DsiInterface, D: embedded_hal::delay::DelayNs>(
//! #     power: P, host: H, delay: &mut D,
//! # ) {
//! let config = match panels::waveshare_8inch8().build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//! let mut sequencer = Sequencer::new(config, power, host);
//! match sequencer.initialize(delay) {
//!     Ok(()) => assert_eq!(sequencer.state(), PanelState::VideoStreaming),
//!     Err(_) => {
//!         // The faulted state records the last stage reached
//!         let _ = sequencer.state();
//!         sequencer.teardown(delay);
//!     }
//! }
//! # }
//! ```

use embedded_hal::delay::DelayNs;

use crate::bus::{BusHandle, Mode};
use crate::channel::CommandChannel;
use crate::command::{
    ENTER_SLEEP_MODE, EXIT_SLEEP_MODE, SET_DISPLAY_OFF, SET_DISPLAY_ON, bracket_frame,
};
use crate::config::PanelConfig;
use crate::error::{Fault, HwFault};
use crate::interface::{DsiInterface, PowerInterface};
use crate::power::PowerController;
use crate::surface::Region;
use crate::video::{VideoController, VideoTimingProgram};

/// Bring-up stage reached by the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Nothing powered
    Uninitialized,
    /// Rail stable, reset released
    PoweredUp,
    /// PHY locked, link in low-power mode
    BusReady,
    /// SLPOUT sent and wake delay elapsed
    PanelAwake,
    /// Init table and DISPON sent
    PanelConfigured,
    /// DPI video running
    VideoStreaming,
}

impl Stage {
    /// The stage following this one
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Uninitialized => Some(Self::PoweredUp),
            Self::PoweredUp => Some(Self::BusReady),
            Self::BusReady => Some(Self::PanelAwake),
            Self::PanelAwake => Some(Self::PanelConfigured),
            Self::PanelConfigured => Some(Self::VideoStreaming),
            Self::VideoStreaming => None,
        }
    }
}

/// Lifecycle state of a panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelState {
    /// Nothing powered
    Uninitialized,
    /// Rail stable, reset released
    PoweredUp,
    /// PHY locked, link in low-power mode
    BusReady,
    /// SLPOUT sent and wake delay elapsed
    PanelAwake,
    /// Init table and DISPON sent
    PanelConfigured,
    /// DPI video running; pixel writes accepted
    VideoStreaming,
    /// Bring-up or streaming stopped on a hardware fault
    Faulted(Fault),
}

impl PanelState {
    /// The stage this state represents, `None` when faulted
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Uninitialized => Some(Stage::Uninitialized),
            Self::PoweredUp => Some(Stage::PoweredUp),
            Self::BusReady => Some(Stage::BusReady),
            Self::PanelAwake => Some(Stage::PanelAwake),
            Self::PanelConfigured => Some(Stage::PanelConfigured),
            Self::VideoStreaming => Some(Stage::VideoStreaming),
            Self::Faulted(_) => None,
        }
    }

    /// The last stage actually reached, including before a fault
    pub fn reached(&self) -> Stage {
        match self {
            Self::Faulted(fault) => fault.previous,
            other => other.stage().unwrap_or(Stage::Uninitialized),
        }
    }

    /// Whether the state is [`PanelState::Faulted`]
    pub fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted(_))
    }
}

impl From<Stage> for PanelState {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Uninitialized => Self::Uninitialized,
            Stage::PoweredUp => Self::PoweredUp,
            Stage::BusReady => Self::BusReady,
            Stage::PanelAwake => Self::PanelAwake,
            Stage::PanelConfigured => Self::PanelConfigured,
            Stage::VideoStreaming => Self::VideoStreaming,
        }
    }
}

/// Ordered bring-up and teardown of one panel
pub struct Sequencer<P, H> {
    config: PanelConfig,
    power: PowerController<P>,
    bus: BusHandle<H>,
    channel: CommandChannel,
    video: VideoController,
    state: PanelState,
}

impl<P, H> Sequencer<P, H>
where
    P: PowerInterface,
    H: DsiInterface,
{
    /// Create a sequencer; nothing is touched until the first step
    pub fn new(config: PanelConfig, power: P, host: H) -> Self {
        Self {
            power: PowerController::new(power, &config),
            bus: BusHandle::new(host),
            channel: CommandChannel::from_config(&config),
            video: VideoController::new(&config),
            state: PanelState::Uninitialized,
            config,
        }
    }

    /// Current state
    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Panel configuration
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Video timing program loaded at the last stage
    pub fn program(&self) -> &VideoTimingProgram {
        self.video.program()
    }

    /// Perform exactly one forward transition
    ///
    /// Returns the new state. Once streaming, this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the cause of the failure after moving to
    /// [`PanelState::Faulted`]. A faulted sequencer returns the recorded
    /// cause again without touching hardware.
    pub fn step<D: DelayNs>(&mut self, delay: &mut D) -> Result<PanelState, HwFault> {
        let current = match self.state {
            PanelState::Faulted(fault) => return Err(fault.cause),
            state => state.reached(),
        };
        let Some(next) = current.next() else {
            return Ok(self.state);
        };

        let result = match current {
            Stage::Uninitialized => self.power.power_up(delay),
            Stage::PoweredUp => self.bus.init_bus(&self.config, delay),
            Stage::BusReady => self.wake_panel(delay),
            Stage::PanelAwake => self.configure_panel(delay),
            Stage::PanelConfigured => self.start_streaming(delay),
            Stage::VideoStreaming => Ok(()),
        };

        match result {
            Ok(()) => {
                self.state = next.into();
                log::info!("panel {:?}", next);
                Ok(self.state)
            }
            Err(cause) => {
                log::error!("bring-up failed after {:?}: {}", current, cause);
                self.state = PanelState::Faulted(Fault {
                    previous: current,
                    cause,
                });
                Err(cause)
            }
        }
    }

    /// Step until video is streaming
    ///
    /// Calling this on a streaming panel does nothing.
    ///
    /// # Errors
    ///
    /// Returns the first fault; see [`step`](Self::step).
    pub fn initialize<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), HwFault> {
        loop {
            if self.step(delay)? == PanelState::VideoStreaming {
                return Ok(());
            }
        }
    }

    /// Best-effort shutdown back to [`PanelState::Uninitialized`]
    ///
    /// Stops video, puts the panel to sleep if it was awake, shuts the bus
    /// down and removes power. Individual failures are logged and skipped.
    pub fn teardown<D: DelayNs>(&mut self, delay: &mut D) {
        if self.state == PanelState::Uninitialized {
            return;
        }
        let reached = self.state.reached();
        log::info!("teardown from {:?}", self.state);

        if let Err(e) = self.video.stop_video(&mut self.bus) {
            log::warn!("stop video: {e}");
        }

        if self.bus.mode() == Some(Mode::Video) {
            if let Err(e) = self.bus.set_mode(Mode::LowPower) {
                log::warn!("switch to low-power: {e}");
            }
        }

        if reached >= Stage::PanelAwake && self.bus.mode() == Some(Mode::LowPower) {
            let param = self.config.bracket_param.as_ref();
            let display_off = bracket_frame(SET_DISPLAY_OFF, param, 0);
            let sleep_in = bracket_frame(ENTER_SLEEP_MODE, param, self.config.wake_delay_ms);
            for frame in [display_off, sleep_in] {
                if let Err(e) = self.channel.send(&mut self.bus, &frame, delay) {
                    log::warn!("DCS 0x{:02X} during teardown: {e}", frame.opcode);
                }
            }
        }

        self.bus.teardown();
        if let Err(e) = self.power.power_down() {
            log::warn!("power down: {e}");
        }
        self.state = PanelState::Uninitialized;
    }

    /// Abandon bring-up or streaming, releasing all hardware
    pub fn abort<D: DelayNs>(&mut self, delay: &mut D) {
        log::warn!("abort requested in {:?}", self.state);
        self.teardown(delay);
    }

    /// Release the power and host interfaces
    pub fn release(self) -> (P, H) {
        (self.power.release(), self.bus.release())
    }

    /// Copy validated pixel data into the frame buffer
    ///
    /// A host failure while streaming faults the panel.
    pub(crate) fn write_pixels<D: DelayNs>(
        &mut self,
        region: &Region,
        data: &[u8],
        delay: &mut D,
    ) -> Result<(), HwFault> {
        if self.state != PanelState::VideoStreaming {
            return Err(HwFault::NotReady);
        }
        match self.video.write_pixels(&mut self.bus, region, data, delay) {
            Err(cause @ (HwFault::Host | HwFault::TransferTimeout)) => {
                log::error!("streaming fault: {cause}");
                self.state = PanelState::Faulted(Fault {
                    previous: Stage::VideoStreaming,
                    cause,
                });
                Err(cause)
            }
            other => other,
        }
    }

    fn wake_panel<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), HwFault> {
        let sleep_out = bracket_frame(EXIT_SLEEP_MODE, self.config.bracket_param.as_ref(), 0);
        self.channel.send(&mut self.bus, &sleep_out, delay)?;
        log::debug!("waiting {} ms for panel wake", self.config.wake_delay_ms);
        delay.delay_ms(self.config.wake_delay_ms);
        Ok(())
    }

    fn configure_panel<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), HwFault> {
        self.channel
            .send_sequence(&mut self.bus, self.config.init_commands, delay)?;
        let display_on = bracket_frame(
            SET_DISPLAY_ON,
            self.config.bracket_param.as_ref(),
            self.config.display_on_delay_ms,
        );
        self.channel.send(&mut self.bus, &display_on, delay)
    }

    fn start_streaming<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), HwFault> {
        self.bus.set_mode(Mode::Video)?;
        self.video.start_video(&mut self.bus, delay)
    }
}
