//! DPI video panel control
//!
//! [`VideoController`] owns the [`VideoTimingProgram`] computed from the panel
//! configuration, loads it into the DSI host's DPI video generator and starts
//! and stops the stream. It also carries pixel transfers into the frame
//! buffer once video is running.
//!
//! ## Timing
//!
//! Horizontal timing is programmed into the host in lane byte clock cycles:
//!
//! ```text
//! cycles = pixels * lane_byte_clock / pixel_clock
//! ```
//!
//! with `lane_byte_clock = lane_bit_rate / 8`.

use embedded_hal::delay::DelayNs;

use crate::bus::{BusHandle, Mode};
use crate::config::{PanelConfig, PixelFormat};
use crate::error::{HwFault, host_fault};
use crate::interface::{DsiInterface, poll_until};
use crate::surface::Region;

/// Timing parameters loaded into the DPI video generator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoTimingProgram {
    /// Active pixels per line
    pub h_active: u16,
    /// Horizontal sync width in pixels
    pub h_sync: u16,
    /// Horizontal back porch in pixels
    pub h_back_porch: u16,
    /// Horizontal front porch in pixels
    pub h_front_porch: u16,
    /// Total pixels per line including blanking
    pub h_total: u32,
    /// Active lines per frame
    pub v_active: u16,
    /// Vertical sync width in lines
    pub v_sync: u16,
    /// Vertical back porch in lines
    pub v_back_porch: u16,
    /// Vertical front porch in lines
    pub v_front_porch: u16,
    /// Total lines per frame including blanking
    pub v_total: u32,
    /// Pixel clock in kHz
    pub pixel_clock_khz: u32,
    /// Lane byte clock in kHz
    pub lane_byte_clock_khz: u32,
    /// Horizontal sync width in lane byte clock cycles
    pub hsa_cycles: u32,
    /// Horizontal back porch in lane byte clock cycles
    pub hbp_cycles: u32,
    /// Full line time in lane byte clock cycles
    pub hline_cycles: u32,
    /// Line time in nanoseconds
    pub line_time_ns: u32,
    /// Frame rate in millihertz
    pub frame_rate_mhz: u32,
    /// Pixel format on the link
    pub pixel_format: PixelFormat,
    /// Virtual channel carrying video packets
    pub virtual_channel: u8,
}

impl VideoTimingProgram {
    /// Derive the timing program for a panel configuration
    ///
    /// The builder has already rejected zero clocks, so every division here
    /// has a non-zero divisor.
    pub fn from_config(config: &PanelConfig) -> Self {
        let h = config.horizontal;
        let v = config.vertical;
        let h_total = u32::from(config.dimensions.width) + h.blanking();
        let v_total = u32::from(config.dimensions.height) + v.blanking();
        let pixel_clock_khz = config.pixel_clock_mhz.saturating_mul(1000);
        let lane_byte_clock_khz = config.link.lane_bit_rate_mbps.saturating_mul(1000) / 8;

        let to_cycles = |pixels: u32| -> u32 {
            (u64::from(pixels) * u64::from(lane_byte_clock_khz) / u64::from(pixel_clock_khz))
                as u32
        };
        let frame_pixels = u64::from(h_total) * u64::from(v_total);

        Self {
            h_active: config.dimensions.width,
            h_sync: h.sync_width,
            h_back_porch: h.back_porch,
            h_front_porch: h.front_porch,
            h_total,
            v_active: config.dimensions.height,
            v_sync: v.sync_width,
            v_back_porch: v.back_porch,
            v_front_porch: v.front_porch,
            v_total,
            pixel_clock_khz,
            lane_byte_clock_khz,
            hsa_cycles: to_cycles(u32::from(h.sync_width)),
            hbp_cycles: to_cycles(u32::from(h.back_porch)),
            hline_cycles: to_cycles(h_total),
            line_time_ns: (u64::from(h_total) * 1_000_000 / u64::from(pixel_clock_khz)) as u32,
            frame_rate_mhz: (u64::from(pixel_clock_khz) * 1_000_000 / frame_pixels) as u32,
            pixel_format: config.pixel_format,
            virtual_channel: config.link.virtual_channel,
        }
    }
}

/// Controller for the DPI video stream
#[derive(Debug)]
pub struct VideoController {
    program: VideoTimingProgram,
    underrun_retry_delay_ms: u32,
    transfer_timeout_ms: u32,
    streaming: bool,
}

impl VideoController {
    /// Create a controller with the timing program for `config`
    pub fn new(config: &PanelConfig) -> Self {
        let program = Self::configure_timing(config);
        log::debug!(
            "video timing: {}x{} total, {} ns/line, {}.{:03} Hz",
            program.h_total,
            program.v_total,
            program.line_time_ns,
            program.frame_rate_mhz / 1000,
            program.frame_rate_mhz % 1000
        );
        Self {
            program,
            underrun_retry_delay_ms: config.underrun_retry_delay_ms,
            transfer_timeout_ms: config.timeouts.transfer_ms,
            streaming: false,
        }
    }

    /// Compute the timing program for a configuration
    pub fn configure_timing(config: &PanelConfig) -> VideoTimingProgram {
        VideoTimingProgram::from_config(config)
    }

    /// The timing program this controller loads
    pub fn program(&self) -> &VideoTimingProgram {
        &self.program
    }

    /// Whether video is currently streaming
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Load the timing program and start streaming
    ///
    /// A FIFO underrun on the first start is retried once after
    /// `underrun_retry_delay_ms`.
    ///
    /// # Errors
    ///
    /// - [`HwFault::BusNotReady`] unless the bus is in [`Mode::Video`]
    /// - [`HwFault::TimingUnderrun`] if the retry underruns as well
    /// - [`HwFault::Host`] if the host rejects the program
    pub fn start_video<H, D>(
        &mut self,
        bus: &mut BusHandle<H>,
        delay: &mut D,
    ) -> Result<(), HwFault>
    where
        H: DsiInterface,
        D: DelayNs,
    {
        if bus.mode() != Some(Mode::Video) {
            return Err(HwFault::BusNotReady);
        }

        let host = bus.host_mut();
        host.configure_video(&self.program)
            .map_err(host_fault("configure_video"))?;

        for attempt in 1..=2 {
            host.start_video().map_err(host_fault("start_video"))?;
            if !host.video_underrun().map_err(host_fault("video_underrun"))? {
                self.streaming = true;
                log::info!("video streaming");
                return Ok(());
            }

            log::warn!("video FIFO underrun on start attempt {attempt}");
            host.stop_video().map_err(host_fault("stop_video"))?;
            if attempt == 1 {
                delay.delay_ms(self.underrun_retry_delay_ms);
            }
        }
        Err(HwFault::TimingUnderrun)
    }

    /// Stop the video stream
    ///
    /// # Errors
    ///
    /// Returns [`HwFault::Host`] if the host fails to stop; the controller
    /// treats the stream as stopped either way.
    pub fn stop_video<H: DsiInterface>(&mut self, bus: &mut BusHandle<H>) -> Result<(), HwFault> {
        if !self.streaming {
            return Ok(());
        }
        self.streaming = false;
        bus.host_mut()
            .stop_video()
            .map_err(host_fault("stop_video"))
    }

    /// Copy pixel data into the frame buffer and wait for the transfer
    ///
    /// `region` and `data` must already be validated against the panel.
    pub(crate) fn write_pixels<H, D>(
        &mut self,
        bus: &mut BusHandle<H>,
        region: &Region,
        data: &[u8],
        delay: &mut D,
    ) -> Result<(), HwFault>
    where
        H: DsiInterface,
        D: DelayNs,
    {
        if !self.streaming {
            return Err(HwFault::NotReady);
        }

        let host = bus.host_mut();
        host.draw_bitmap(region, data)
            .map_err(host_fault("draw_bitmap"))?;
        let done = poll_until(delay, self.transfer_timeout_ms, || host.transfer_done())
            .map_err(host_fault("transfer_done"))?;
        if !done {
            log::error!("pixel transfer for {region:?} timed out");
            return Err(HwFault::TransferTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Event, MockHost, RecordingDelay, new_log, test_config};

    fn video_bus(host: MockHost) -> BusHandle<MockHost> {
        let mut bus = BusHandle::new(host);
        let mut delay = RecordingDelay::default();
        bus.init_bus(&test_config(), &mut delay).unwrap();
        bus.set_mode(Mode::Video).unwrap();
        bus
    }

    #[test]
    fn test_timing_program_for_8inch8_panel() {
        let program = VideoTimingProgram::from_config(&test_config());
        assert_eq!(program.h_total, 630);
        assert_eq!(program.v_total, 1980);
        assert_eq!(program.pixel_clock_khz, 75_000);
        assert_eq!(program.lane_byte_clock_khz, 162_500);
        assert_eq!(program.line_time_ns, 8400);
        assert_eq!(program.frame_rate_mhz, 60_125);
        assert_eq!(program.hsa_cycles, 108);
        assert_eq!(program.hbp_cycles, 108);
        assert_eq!(program.hline_cycles, 1365);
    }

    #[test]
    fn test_start_video_requires_video_mode() {
        let log = new_log();
        let mut bus = BusHandle::new(MockHost::new(&log));
        let mut delay = RecordingDelay::default();
        bus.init_bus(&test_config(), &mut delay).unwrap();
        let mut video = VideoController::new(&test_config());
        assert_eq!(
            video.start_video(&mut bus, &mut delay),
            Err(HwFault::BusNotReady)
        );
        assert!(!log.borrow().contains(&Event::VideoStart));
    }

    #[test]
    fn test_start_video_loads_program() {
        let log = new_log();
        let mut bus = video_bus(MockHost::new(&log));
        let mut video = VideoController::new(&test_config());
        let mut delay = RecordingDelay::default();
        video.start_video(&mut bus, &mut delay).unwrap();
        assert!(video.is_streaming());
        let host = bus.release();
        assert_eq!(host.programmed, Some(*video.program()));
        assert_eq!(host.start_attempts, 1);
    }

    #[test]
    fn test_start_video_retries_single_underrun() {
        let log = new_log();
        let mut host = MockHost::new(&log);
        host.underruns = 1;
        let mut bus = video_bus(host);
        let mut video = VideoController::new(&test_config());
        let mut delay = RecordingDelay::default();
        assert!(video.start_video(&mut bus, &mut delay).is_ok());
        assert_eq!(delay.total_ms(), 10);
        assert_eq!(bus.release().start_attempts, 2);
    }

    #[test]
    fn test_start_video_persistent_underrun() {
        let log = new_log();
        let mut host = MockHost::new(&log);
        host.underruns = 5;
        let mut bus = video_bus(host);
        let mut video = VideoController::new(&test_config());
        let mut delay = RecordingDelay::default();
        assert_eq!(
            video.start_video(&mut bus, &mut delay),
            Err(HwFault::TimingUnderrun)
        );
        assert!(!video.is_streaming());
        assert_eq!(log.borrow().last(), Some(&Event::VideoStop));
        assert_eq!(bus.release().start_attempts, 2);
    }

    #[test]
    fn test_write_pixels_waits_for_transfer() {
        let log = new_log();
        let mut host = MockHost::new(&log);
        host.transfer_polls = 3;
        let mut bus = video_bus(host);
        let mut video = VideoController::new(&test_config());
        let mut delay = RecordingDelay::default();
        video.start_video(&mut bus, &mut delay).unwrap();
        let region = Region::new(0, 0, 2, 1);
        video
            .write_pixels(&mut bus, &region, &[0; 4], &mut delay)
            .unwrap();
        assert_eq!(delay.total_ms(), 3);
        assert_eq!(log.borrow().last(), Some(&Event::Draw(region)));
    }

    #[test]
    fn test_write_pixels_transfer_timeout() {
        let log = new_log();
        let mut host = MockHost::new(&log);
        host.transfer_polls = u32::MAX;
        let mut bus = video_bus(host);
        let mut video = VideoController::new(&test_config());
        let mut delay = RecordingDelay::default();
        video.start_video(&mut bus, &mut delay).unwrap();
        let result = video.write_pixels(&mut bus, &Region::new(0, 0, 1, 1), &[0; 2], &mut delay);
        assert_eq!(result, Err(HwFault::TransferTimeout));
        assert_eq!(delay.total_ms(), 1000);
    }
}
