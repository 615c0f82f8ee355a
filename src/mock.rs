//! Recording mocks for the hardware seams
//!
//! [`MockPower`], [`MockHost`] and (optionally) [`RecordingDelay`] append to
//! one shared [`Log`], so tests can assert the exact cross-peripheral order
//! of a bring-up.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use embedded_hal::delay::DelayNs;

use crate::bus::{Mode, PhyConfig};
use crate::config::{PanelConfig, PowerRail};
use crate::interface::{DsiInterface, PowerInterface};
use crate::panels;
use crate::surface::Region;
use crate::video::VideoTimingProgram;

/// Shared event log
pub type Log = Rc<RefCell<Vec<Event>>>;

/// Create an empty log
pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Waveshare 8.8" configuration with a 120 ms wake delay
pub fn test_config() -> PanelConfig {
    panels::waveshare_8inch8().build().unwrap()
}

/// Something a mock observed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    RailOn(u8),
    RailOff(u8),
    Reset { high: bool },
    Wait(u32),
    BusConfigured { lanes: u8 },
    Mode(Mode),
    Dcs { channel: u8, opcode: u8, params: Vec<u8> },
    VideoConfigured,
    VideoStart,
    VideoStop,
    Draw(Region),
    BusShutdown,
}

/// Error returned by failing mocks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockError;

pub struct MockPower {
    log: Log,
    /// `None`: no feedback; `Some(n)`: ready from the n-th query on
    pub ready_after_polls: Option<u32>,
    polls: u32,
    pub fail_reset: bool,
}

impl MockPower {
    pub fn new(log: &Log) -> Self {
        Self {
            log: Rc::clone(log),
            ready_after_polls: None,
            polls: 0,
            fail_reset: false,
        }
    }
}

impl PowerInterface for MockPower {
    type Error = MockError;

    fn set_rail(&mut self, rail: PowerRail, enabled: bool) -> Result<(), Self::Error> {
        let event = if enabled {
            Event::RailOn(rail.id)
        } else {
            Event::RailOff(rail.id)
        };
        self.log.borrow_mut().push(event);
        Ok(())
    }

    fn rail_ready(&mut self, _rail: PowerRail) -> Result<Option<bool>, Self::Error> {
        self.polls = self.polls.saturating_add(1);
        Ok(self.ready_after_polls.map(|n| self.polls >= n))
    }

    fn drive_reset(&mut self, high: bool) -> Result<(), Self::Error> {
        if self.fail_reset {
            return Err(MockError);
        }
        self.log.borrow_mut().push(Event::Reset { high });
        Ok(())
    }
}

pub struct MockHost {
    log: Log,
    mode: Option<Mode>,
    /// `None`: PHY never locks; `Some(n)`: locked from the n-th query on
    pub lock_after_polls: Option<u32>,
    lock_polls: u32,
    pub ack: bool,
    pub nack_opcode: Option<u8>,
    last_opcode: Option<u8>,
    /// Number of start attempts that report an underrun
    pub underruns: u32,
    pub start_attempts: u32,
    /// Transfer-done queries answered `false` after each draw
    pub transfer_polls: u32,
    transfer_queries: u32,
    pub fail_draw: bool,
    pub fail_set_mode: bool,
    /// DCS packets written while the link was in video mode
    pub dcs_in_video: u32,
    pub programmed: Option<VideoTimingProgram>,
}

impl MockHost {
    pub fn new(log: &Log) -> Self {
        Self {
            log: Rc::clone(log),
            mode: None,
            lock_after_polls: Some(1),
            lock_polls: 0,
            ack: true,
            nack_opcode: None,
            last_opcode: None,
            underruns: 0,
            start_attempts: 0,
            transfer_polls: 0,
            transfer_queries: 0,
            fail_draw: false,
            fail_set_mode: false,
            dcs_in_video: 0,
            programmed: None,
        }
    }

    fn push(&self, event: Event) {
        self.log.borrow_mut().push(event);
    }
}

impl DsiInterface for MockHost {
    type Error = MockError;

    fn configure_bus(&mut self, phy: &PhyConfig) -> Result<(), Self::Error> {
        self.push(Event::BusConfigured {
            lanes: phy.data_lanes,
        });
        Ok(())
    }

    fn phy_locked(&mut self) -> Result<bool, Self::Error> {
        self.lock_polls = self.lock_polls.saturating_add(1);
        Ok(self.lock_after_polls.is_some_and(|n| self.lock_polls >= n))
    }

    fn set_mode(&mut self, mode: Mode) -> Result<(), Self::Error> {
        if self.fail_set_mode {
            return Err(MockError);
        }
        self.mode = Some(mode);
        self.push(Event::Mode(mode));
        Ok(())
    }

    fn write_dcs(
        &mut self,
        virtual_channel: u8,
        opcode: u8,
        params: &[u8],
    ) -> Result<(), Self::Error> {
        if self.mode == Some(Mode::Video) {
            self.dcs_in_video += 1;
        }
        self.last_opcode = Some(opcode);
        self.push(Event::Dcs {
            channel: virtual_channel,
            opcode,
            params: params.to_vec(),
        });
        Ok(())
    }

    fn dcs_acknowledged(&mut self) -> Result<bool, Self::Error> {
        let nacked = self.nack_opcode.is_some() && self.last_opcode == self.nack_opcode;
        Ok(self.ack && !nacked)
    }

    fn configure_video(&mut self, program: &VideoTimingProgram) -> Result<(), Self::Error> {
        self.programmed = Some(*program);
        self.push(Event::VideoConfigured);
        Ok(())
    }

    fn start_video(&mut self) -> Result<(), Self::Error> {
        self.start_attempts += 1;
        self.push(Event::VideoStart);
        Ok(())
    }

    fn video_underrun(&mut self) -> Result<bool, Self::Error> {
        if self.underruns > 0 {
            self.underruns -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn stop_video(&mut self) -> Result<(), Self::Error> {
        self.push(Event::VideoStop);
        Ok(())
    }

    fn draw_bitmap(&mut self, region: &Region, _data: &[u8]) -> Result<(), Self::Error> {
        if self.fail_draw {
            return Err(MockError);
        }
        self.transfer_queries = 0;
        self.push(Event::Draw(*region));
        Ok(())
    }

    fn transfer_done(&mut self) -> Result<bool, Self::Error> {
        self.transfer_queries = self.transfer_queries.saturating_add(1);
        Ok(self.transfer_queries > self.transfer_polls)
    }

    fn shutdown_bus(&mut self) -> Result<(), Self::Error> {
        self.mode = None;
        self.push(Event::BusShutdown);
        Ok(())
    }
}

/// Delay that only counts, optionally logging each millisecond wait
#[derive(Default)]
pub struct RecordingDelay {
    log: Option<Log>,
    total_ns: u64,
}

impl RecordingDelay {
    pub fn with_log(log: &Log) -> Self {
        Self {
            log: Some(Rc::clone(log)),
            total_ns: 0,
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.total_ns += u64::from(us) * 1_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
        if let Some(log) = &self.log {
            log.borrow_mut().push(Event::Wait(ms));
        }
    }
}
