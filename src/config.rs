use crate::constants::*;
use std::time::Duration;

/// Settings used to open a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub device: String,
    pub baud_rate: u32,
    pub channel_count: u8,
    /// Read/write timeout. `None` blocks until the device answers.
    pub timeout: Option<Duration>,
    /// Pause after parking a channel, giving the servo time to get there.
    pub settle_delay: Duration,
    /// Initial `(min, max)` range for every channel; 0 leaves a side unbounded.
    pub range: (i32, i32),
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            device: DEFAULT_DEVICE.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            channel_count: DEFAULT_CHANNEL_COUNT,
            timeout: None,
            settle_delay: SETTLE_DELAY,
            range: (0, 0),
        }
    }
}

impl ControllerConfig {
    pub fn new(device: impl Into<String>, baud_rate: u32) -> Self {
        ControllerConfig {
            device: device.into(),
            baud_rate,
            ..Default::default()
        }
    }

    pub fn with_channel_count(mut self, channel_count: u8) -> Self {
        self.channel_count = channel_count;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_range(mut self, min: i32, max: i32) -> Self {
        self.range = (min, max);
        self
    }
}
