//! Panel power and reset control
//!
//! [`PowerController`] brings the panel rail up, waits for it to settle and
//! pulses the hardware reset line. Reset is the only thing that takes the
//! OTA7290B bridge back to a known state; DCS soft reset is never used.
//!
//! ## Hardware
//!
//! [`PowerPins`] implements [`PowerInterface`] with embedded-hal GPIO:
//! - **RST**: Reset (output, polarity from [`ResetTiming`])
//! - **EN**: Rail enable (output, optional)
//! - **PG**: Rail power-good (input, optional)
//!
//! Without a power-good pin the rail's `stable_ms` delay is used instead.
//!
//! ## Example
//!
//! ```
//! use ota7290b::power::PowerPins;
//! # use core::convert::Infallible;
//! # use embedded_hal::digital::OutputPin;
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! let _pins = PowerPins::new(MockPin).with_enable(MockPin);
//! ```

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, ErrorKind, ErrorType, InputPin, OutputPin, PinState};

use crate::config::{PanelConfig, PowerRail, ResetTiming};
use crate::error::{HwFault, gpio_fault};
use crate::interface::{PowerInterface, poll_until};

/// Sequences the panel power rail and reset line
pub struct PowerController<P> {
    power: P,
    rail: PowerRail,
    reset: ResetTiming,
    rail_ready_ms: u32,
}

impl<P> PowerController<P>
where
    P: PowerInterface,
{
    /// Create a controller using the rail, reset timing and budgets of `config`
    pub fn new(power: P, config: &PanelConfig) -> Self {
        Self {
            power,
            rail: config.power_rail,
            reset: config.reset,
            rail_ready_ms: config.timeouts.rail_ready_ms,
        }
    }

    /// Enable the rail, wait for it to be stable and pulse reset
    ///
    /// On success the panel is powered and out of reset.
    ///
    /// # Errors
    ///
    /// - [`HwFault::PowerRailTimeout`] if power-good never asserts
    /// - [`HwFault::Gpio`] if a pin cannot be driven or read
    pub fn power_up<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), HwFault> {
        log::info!(
            "enabling rail {} ({} mV)",
            self.rail.id,
            self.rail.millivolts
        );
        self.power
            .set_rail(self.rail, true)
            .map_err(gpio_fault("set_rail"))?;
        self.wait_rail_stable(delay)?;

        self.assert_reset(self.reset.pulse_ms, delay)?;
        self.release_reset()?;
        delay.delay_ms(self.reset.settle_ms);
        Ok(())
    }

    /// Hold the panel in reset for `duration_ms`
    ///
    /// Reset stays asserted on return; call [`release_reset`](Self::release_reset).
    pub fn assert_reset<D: DelayNs>(
        &mut self,
        duration_ms: u32,
        delay: &mut D,
    ) -> Result<(), HwFault> {
        self.drive_reset(true)?;
        delay.delay_ms(duration_ms);
        Ok(())
    }

    /// Release the reset line
    pub fn release_reset(&mut self) -> Result<(), HwFault> {
        self.drive_reset(false)
    }

    /// Put the panel back in reset and disable the rail
    pub fn power_down(&mut self) -> Result<(), HwFault> {
        self.drive_reset(true)?;
        self.power
            .set_rail(self.rail, false)
            .map_err(gpio_fault("set_rail"))?;
        log::info!("rail {} disabled", self.rail.id);
        Ok(())
    }

    /// Release the power interface
    pub fn release(self) -> P {
        self.power
    }

    fn wait_rail_stable<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), HwFault> {
        let rail = self.rail;
        match self.power.rail_ready(rail).map_err(gpio_fault("rail_ready"))? {
            None => {
                delay.delay_ms(rail.stable_ms);
                Ok(())
            }
            Some(true) => Ok(()),
            Some(false) => {
                let power = &mut self.power;
                let ready = poll_until(delay, self.rail_ready_ms, || {
                    power.rail_ready(rail).map(|r| r != Some(false))
                })
                .map_err(gpio_fault("rail_ready"))?;
                if ready {
                    Ok(())
                } else {
                    log::error!("rail {} not ready after {} ms", rail.id, self.rail_ready_ms);
                    Err(HwFault::PowerRailTimeout)
                }
            }
        }
    }

    fn drive_reset(&mut self, asserted: bool) -> Result<(), HwFault> {
        let high = asserted != self.reset.active_low;
        self.power
            .drive_reset(high)
            .map_err(gpio_fault("drive_reset"))
    }
}

/// Placeholder for an absent optional pin
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

/// [`PowerInterface`] over embedded-hal GPIO
///
/// ## Type Parameters
///
/// * `RST` - Reset pin implementing [`OutputPin`]
/// * `EN` - Rail enable pin implementing [`OutputPin`] (active high)
/// * `PG` - Power-good pin implementing [`InputPin`] (active high)
///
/// A single enable pin serves whichever rail is configured.
pub struct PowerPins<RST, EN = NoPin, PG = NoPin> {
    reset: RST,
    enable: Option<EN>,
    power_good: Option<PG>,
}

impl<RST: OutputPin> PowerPins<RST> {
    /// Create pins with only a reset line
    pub fn new(reset: RST) -> Self {
        Self {
            reset,
            enable: None,
            power_good: None,
        }
    }
}

impl<RST, EN, PG> PowerPins<RST, EN, PG> {
    /// Add a rail enable pin
    pub fn with_enable<E: OutputPin>(self, enable: E) -> PowerPins<RST, E, PG> {
        PowerPins {
            reset: self.reset,
            enable: Some(enable),
            power_good: self.power_good,
        }
    }

    /// Add a power-good feedback pin
    pub fn with_power_good<G: InputPin>(self, power_good: G) -> PowerPins<RST, EN, G> {
        PowerPins {
            reset: self.reset,
            enable: self.enable,
            power_good: Some(power_good),
        }
    }
}

impl<RST, EN, PG> PowerInterface for PowerPins<RST, EN, PG>
where
    RST: OutputPin,
    EN: OutputPin,
    PG: InputPin,
{
    type Error = ErrorKind;

    fn set_rail(&mut self, _rail: PowerRail, enabled: bool) -> Result<(), Self::Error> {
        match self.enable.as_mut() {
            Some(pin) => pin
                .set_state(PinState::from(enabled))
                .map_err(|e| e.kind()),
            None => Ok(()),
        }
    }

    fn rail_ready(&mut self, _rail: PowerRail) -> Result<Option<bool>, Self::Error> {
        match self.power_good.as_mut() {
            Some(pin) => pin.is_high().map(Some).map_err(|e| e.kind()),
            None => Ok(None),
        }
    }

    fn drive_reset(&mut self, high: bool) -> Result<(), Self::Error> {
        self.reset
            .set_state(PinState::from(high))
            .map_err(|e| e.kind())
    }
}
