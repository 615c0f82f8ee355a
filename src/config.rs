//! Panel configuration types and builder

use crate::command::InitCommand;
pub use crate::error::{BuilderError, MAX_DATA_LANES, MAX_LANE_RATE_MBPS};

/// Active area dimensions in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    /// Active width (pixels per line)
    pub width: u16,
    /// Active height (lines per frame)
    pub height: u16,
}

impl Dimensions {
    /// Create new dimensions with validation
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidDimensions` if either side is zero.
    pub fn new(width: u16, height: u16) -> Result<Self, BuilderError> {
        if width == 0 || height == 0 {
            return Err(BuilderError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of pixels in one frame
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Pixel format streamed over DPI
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelFormat {
    /// 16-bit RGB
    #[default]
    Rgb565,
    /// 18-bit RGB, loosely packed in 3 bytes
    Rgb666,
    /// 24-bit RGB
    Rgb888,
}

impl PixelFormat {
    /// Bits per pixel on the wire
    pub const fn bits_per_pixel(&self) -> u32 {
        match self {
            Self::Rgb565 => 16,
            Self::Rgb666 => 18,
            Self::Rgb888 => 24,
        }
    }

    /// Bytes per pixel in host memory
    pub const fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb565 => 2,
            Self::Rgb666 | Self::Rgb888 => 3,
        }
    }
}

/// Sync pulse and porch widths for one axis
///
/// Horizontal values are in pixel clocks, vertical values in lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncTiming {
    /// Sync pulse width
    pub sync_width: u16,
    /// Back porch
    pub back_porch: u16,
    /// Front porch
    pub front_porch: u16,
}

impl SyncTiming {
    /// Create sync timing from pulse width and porches
    pub const fn new(sync_width: u16, back_porch: u16, front_porch: u16) -> Self {
        Self {
            sync_width,
            back_porch,
            front_porch,
        }
    }

    /// Blanking interval (sync + porches)
    pub const fn blanking(&self) -> u32 {
        self.sync_width as u32 + self.back_porch as u32 + self.front_porch as u32
    }
}

/// DSI link parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DsiLink {
    /// DSI host instance
    pub bus_id: u8,
    /// Number of data lanes (1..=4)
    pub data_lanes: u8,
    /// Per-lane bit rate in Mbps
    pub lane_bit_rate_mbps: u32,
    /// Virtual channel used for both DCS and video
    pub virtual_channel: u8,
}

impl DsiLink {
    /// Create link parameters on bus 0, virtual channel 0
    pub const fn new(data_lanes: u8, lane_bit_rate_mbps: u32) -> Self {
        Self {
            bus_id: 0,
            data_lanes,
            lane_bit_rate_mbps,
            virtual_channel: 0,
        }
    }

    /// Aggregate link bandwidth in Mbps
    pub const fn bandwidth_mbps(&self) -> u32 {
        (self.data_lanes as u32).saturating_mul(self.lane_bit_rate_mbps)
    }
}

/// Reset line polarity and timing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetTiming {
    /// Reset is asserted by driving the line low
    pub active_low: bool,
    /// How long reset is held asserted
    pub pulse_ms: u32,
    /// Settle time after release before the panel is considered powered
    pub settle_ms: u32,
}

impl Default for ResetTiming {
    fn default() -> Self {
        Self {
            active_low: true,
            pulse_ms: 10,
            settle_ms: 10,
        }
    }
}

/// Panel power rail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowerRail {
    /// Board-specific rail identifier (e.g. LDO channel)
    pub id: u8,
    /// Requested rail voltage
    pub millivolts: u16,
    /// Stable delay used when the rail has no ready feedback
    pub stable_ms: u32,
}

impl Default for PowerRail {
    fn default() -> Self {
        Self {
            id: 0,
            millivolts: 2500,
            stable_ms: 10,
        }
    }
}

/// Upper bounds for every hardware wait
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// Budget for rail-ready feedback
    pub rail_ready_ms: u32,
    /// Budget for one PHY lock attempt
    pub phy_lock_ms: u32,
    /// Number of PHY lock attempts before giving up
    pub phy_lock_attempts: u8,
    /// Budget for a DCS acknowledgment
    pub ack_ms: u32,
    /// Budget for a pixel transfer to complete
    pub transfer_ms: u32,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            rail_ready_ms: 100,
            phy_lock_ms: 10,
            phy_lock_attempts: 3,
            ack_ms: 10,
            transfer_ms: 1000,
        }
    }
}

impl Timeouts {
    fn any_zero(&self) -> bool {
        self.rail_ready_ms == 0
            || self.phy_lock_ms == 0
            || self.phy_lock_attempts == 0
            || self.ack_ms == 0
            || self.transfer_ms == 0
    }
}

/// Display rotation relative to native orientation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    /// No rotation
    #[default]
    Rotate0,
    /// Rotate 90 degrees clockwise
    Rotate90,
    /// Rotate 180 degrees
    Rotate180,
    /// Rotate 270 degrees clockwise
    Rotate270,
}

/// Panel configuration
///
/// Read-only for the lifetime of a driver instance. Use [`Builder`] to create one.
#[derive(Clone, Debug)]
pub struct PanelConfig {
    /// Active area
    pub dimensions: Dimensions,
    /// DPI pixel format
    pub pixel_format: PixelFormat,
    /// Horizontal sync timing (pixel clocks)
    pub horizontal: SyncTiming,
    /// Vertical sync timing (lines)
    pub vertical: SyncTiming,
    /// DPI pixel clock in MHz
    pub pixel_clock_mhz: u32,
    /// DSI link parameters
    pub link: DsiLink,
    /// Reset line polarity and timing
    pub reset: ResetTiming,
    /// Panel power rail
    pub power_rail: PowerRail,
    /// Mandatory delay after SLPOUT
    pub wake_delay_ms: u32,
    /// Delay after DISPON before video starts
    pub display_on_delay_ms: u32,
    /// Single parameter sent with SLPOUT and DISPON (`None` for a plain short write)
    pub bracket_param: Option<u8>,
    /// Panel-specific init table sent between SLPOUT and DISPON
    pub init_commands: &'static [InitCommand],
    /// Wait budgets
    pub timeouts: Timeouts,
    /// Delay before the single retry after a video underrun
    pub underrun_retry_delay_ms: u32,
    /// Logical rotation applied by the graphics layer
    pub rotation: Rotation,
}

impl PanelConfig {
    /// Get the rotated dimensions based on rotation setting
    pub fn rotated_dimensions(&self) -> Dimensions {
        match self.rotation {
            Rotation::Rotate0 | Rotation::Rotate180 => self.dimensions,
            Rotation::Rotate90 | Rotation::Rotate270 => Dimensions {
                width: self.dimensions.height,
                height: self.dimensions.width,
            },
        }
    }

    /// Size of one full frame in bytes
    pub fn frame_bytes(&self) -> usize {
        self.dimensions.pixel_count() * self.pixel_format.bytes_per_pixel()
    }
}

impl core::fmt::Display for PanelConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}x{} {:?}, {} lane(s) @ {} Mbps, pclk {} MHz, {} init command(s)",
            self.dimensions.width,
            self.dimensions.height,
            self.pixel_format,
            self.link.data_lanes,
            self.link.lane_bit_rate_mbps,
            self.pixel_clock_mhz,
            self.init_commands.len()
        )
    }
}

/// Builder for constructing panel configuration
///
/// # Example
///
/// ```
/// use ota7290b::{Builder, Dimensions, DsiLink, PixelFormat, SyncTiming};
///
/// let dims = match Dimensions::new(480, 1920) {
///     Ok(dims) => dims,
///     Err(_) => return,
/// };
/// let config = match Builder::new()
///     .dimensions(dims)
///     .pixel_format(PixelFormat::Rgb565)
///     .timing(SyncTiming::new(50, 50, 50), SyncTiming::new(20, 20, 20))
///     .pixel_clock_mhz(75)
///     .link(DsiLink::new(2, 1300))
///     .wake_delay_ms(120)
///     .build()
/// {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert_eq!(config.wake_delay_ms, 120);
/// ```
#[must_use]
pub struct Builder {
    dimensions: Option<Dimensions>,
    pixel_format: PixelFormat,
    timing: Option<(SyncTiming, SyncTiming)>,
    pixel_clock_mhz: u32,
    link: Option<DsiLink>,
    reset: ResetTiming,
    power_rail: PowerRail,
    wake_delay_ms: Option<u32>,
    display_on_delay_ms: u32,
    bracket_param: Option<u8>,
    init_commands: &'static [InitCommand],
    timeouts: Timeouts,
    underrun_retry_delay_ms: u32,
    rotation: Rotation,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            dimensions: None,
            pixel_format: PixelFormat::Rgb565,
            timing: None,
            pixel_clock_mhz: 0,
            link: None,
            reset: ResetTiming::default(),
            power_rail: PowerRail::default(),
            wake_delay_ms: None,
            // Settle after DISPON before switching to HS
            display_on_delay_ms: 20,
            // Board support code sends SLPOUT/DISPON as short write with a zero parameter
            bracket_param: Some(0x00),
            init_commands: &[],
            timeouts: Timeouts::default(),
            underrun_retry_delay_ms: 10,
            rotation: Rotation::Rotate0,
        }
    }
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set active area dimensions (required)
    pub fn dimensions(mut self, dims: Dimensions) -> Self {
        self.dimensions = Some(dims);
        self
    }

    /// Set the DPI pixel format
    pub fn pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    /// Set horizontal and vertical sync timing (required)
    pub fn timing(mut self, horizontal: SyncTiming, vertical: SyncTiming) -> Self {
        self.timing = Some((horizontal, vertical));
        self
    }

    /// Set the DPI pixel clock in MHz (required)
    pub fn pixel_clock_mhz(mut self, mhz: u32) -> Self {
        self.pixel_clock_mhz = mhz;
        self
    }

    /// Set DSI link parameters (required)
    pub fn link(mut self, link: DsiLink) -> Self {
        self.link = Some(link);
        self
    }

    /// Set reset polarity and timing
    pub fn reset(mut self, reset: ResetTiming) -> Self {
        self.reset = reset;
        self
    }

    /// Set the panel power rail
    pub fn power_rail(mut self, rail: PowerRail) -> Self {
        self.power_rail = rail;
        self
    }

    /// Set the mandatory post-SLPOUT wake delay (required)
    pub fn wake_delay_ms(mut self, ms: u32) -> Self {
        self.wake_delay_ms = Some(ms);
        self
    }

    /// Set the delay after DISPON
    pub fn display_on_delay_ms(mut self, ms: u32) -> Self {
        self.display_on_delay_ms = ms;
        self
    }

    /// Set the single parameter sent with SLPOUT and DISPON
    pub fn bracket_param(mut self, param: Option<u8>) -> Self {
        self.bracket_param = param;
        self
    }

    /// Set the panel-specific init table
    pub fn init_commands(mut self, commands: &'static [InitCommand]) -> Self {
        self.init_commands = commands;
        self
    }

    /// Set wait budgets
    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the delay before retrying after a video underrun
    pub fn underrun_retry_delay_ms(mut self, ms: u32) -> Self {
        self.underrun_retry_delay_ms = ms;
        self
    }

    /// Set logical rotation
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns a [`BuilderError`] if a required value is missing or the
    /// combination cannot be driven.
    pub fn build(self) -> Result<PanelConfig, BuilderError> {
        let dimensions = self.dimensions.ok_or(BuilderError::MissingDimensions)?;
        let (horizontal, vertical) = self.timing.ok_or(BuilderError::MissingTiming)?;
        let link = self.link.ok_or(BuilderError::MissingLink)?;
        let wake_delay_ms = self.wake_delay_ms.ok_or(BuilderError::MissingWakeDelay)?;

        if link.data_lanes == 0 || link.data_lanes > MAX_DATA_LANES {
            return Err(BuilderError::InvalidLaneCount(link.data_lanes));
        }
        if link.lane_bit_rate_mbps == 0 {
            return Err(BuilderError::ZeroLaneRate);
        }
        if link.lane_bit_rate_mbps > MAX_LANE_RATE_MBPS {
            return Err(BuilderError::LaneRateTooHigh(link.lane_bit_rate_mbps));
        }
        if self.pixel_clock_mhz == 0 {
            return Err(BuilderError::ZeroPixelClock);
        }

        let required_mbps = self
            .pixel_clock_mhz
            .saturating_mul(self.pixel_format.bits_per_pixel());
        let available_mbps = link.bandwidth_mbps();
        if available_mbps < required_mbps {
            return Err(BuilderError::InsufficientBandwidth {
                required_mbps,
                available_mbps,
            });
        }

        if self.timeouts.any_zero() {
            return Err(BuilderError::ZeroTimeout);
        }

        if let Some(reserved) = self.init_commands.iter().find(|c| c.is_reserved()) {
            return Err(BuilderError::ReservedOpcode {
                opcode: reserved.opcode,
            });
        }

        Ok(PanelConfig {
            dimensions,
            pixel_format: self.pixel_format,
            horizontal,
            vertical,
            pixel_clock_mhz: self.pixel_clock_mhz,
            link,
            reset: self.reset,
            power_rail: self.power_rail,
            wake_delay_ms,
            display_on_delay_ms: self.display_on_delay_ms,
            bracket_param: self.bracket_param,
            init_commands: self.init_commands,
            timeouts: self.timeouts,
            underrun_retry_delay_ms: self.underrun_retry_delay_ms,
            rotation: self.rotation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandFrame, SET_PIXEL_FORMAT, SOFT_RESET};
    use alloc::string::ToString;

    fn base() -> Builder {
        Builder::new()
            .dimensions(Dimensions::new(480, 1920).unwrap())
            .timing(SyncTiming::new(50, 50, 50), SyncTiming::new(20, 20, 20))
            .pixel_clock_mhz(75)
            .link(DsiLink::new(2, 1300))
            .wake_delay_ms(120)
    }

    #[test]
    fn test_dimensions_reject_zero() {
        assert!(matches!(
            Dimensions::new(0, 10),
            Err(BuilderError::InvalidDimensions { width: 0, .. })
        ));
        assert!(Dimensions::new(10, 0).is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let config = base().build().unwrap();
        assert!(config.reset.active_low);
        assert_eq!(config.bracket_param, Some(0x00));
        assert_eq!(config.display_on_delay_ms, 20);
        assert_eq!(config.timeouts.phy_lock_attempts, 3);
        assert!(config.init_commands.is_empty());
    }

    #[test]
    fn test_builder_requires_wake_delay() {
        let result = Builder::new()
            .dimensions(Dimensions::new(480, 1920).unwrap())
            .timing(SyncTiming::default(), SyncTiming::default())
            .pixel_clock_mhz(75)
            .link(DsiLink::new(2, 1300))
            .build();
        assert!(matches!(result, Err(BuilderError::MissingWakeDelay)));
    }

    #[test]
    fn test_builder_requires_link() {
        let result = Builder::new()
            .dimensions(Dimensions::new(480, 1920).unwrap())
            .timing(SyncTiming::default(), SyncTiming::default())
            .build();
        assert!(matches!(result, Err(BuilderError::MissingLink)));
    }

    #[test]
    fn test_builder_rejects_lane_count() {
        let result = base().link(DsiLink::new(5, 1000)).build();
        assert!(matches!(result, Err(BuilderError::InvalidLaneCount(5))));
        let result = base().link(DsiLink::new(0, 1000)).build();
        assert!(matches!(result, Err(BuilderError::InvalidLaneCount(0))));
    }

    #[test]
    fn test_builder_rejects_insufficient_bandwidth() {
        let result = base()
            .pixel_format(PixelFormat::Rgb888)
            .link(DsiLink::new(1, 1000))
            .build();
        assert_eq!(
            result.err(),
            Some(BuilderError::InsufficientBandwidth {
                required_mbps: 1800,
                available_mbps: 1000
            })
        );
    }

    #[test]
    fn test_builder_rejects_lane_rate_above_dphy_limit() {
        let result = base().link(DsiLink::new(4, 2_000_000_000)).build();
        assert_eq!(
            result.err(),
            Some(BuilderError::LaneRateTooHigh(2_000_000_000))
        );
        assert!(base().link(DsiLink::new(2, 4500)).build().is_ok());
    }

    #[test]
    fn test_link_bandwidth_saturates() {
        assert_eq!(DsiLink::new(4, u32::MAX).bandwidth_mbps(), u32::MAX);
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let timeouts = Timeouts {
            ack_ms: 0,
            ..Timeouts::default()
        };
        assert!(matches!(
            base().timeouts(timeouts).build(),
            Err(BuilderError::ZeroTimeout)
        ));
    }

    #[test]
    fn test_builder_rejects_soft_reset_in_table() {
        static TABLE: [InitCommand; 2] = [
            CommandFrame::new(SET_PIXEL_FORMAT, &[0x55]),
            CommandFrame::new(SOFT_RESET, &[]),
        ];
        assert!(matches!(
            base().init_commands(&TABLE).build(),
            Err(BuilderError::ReservedOpcode { opcode: 0x01 })
        ));
    }

    #[test]
    fn test_rotated_dimensions() {
        let config = base().rotation(Rotation::Rotate90).build().unwrap();
        assert_eq!(config.rotated_dimensions().width, 1920);
        assert_eq!(config.rotated_dimensions().height, 480);
    }

    #[test]
    fn test_frame_bytes() {
        let config = base().build().unwrap();
        assert_eq!(config.frame_bytes(), 480 * 1920 * 2);
    }

    #[test]
    fn test_config_display_summary() {
        let config = base().build().unwrap();
        assert_eq!(
            config.to_string(),
            "480x1920 Rgb565, 2 lane(s) @ 1300 Mbps, pclk 75 MHz, 0 init command(s)"
        );
    }
}
