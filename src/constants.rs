use std::time::Duration;

// Frame prefix: Pololu protocol start byte followed by the device number
pub const SYNC_BYTE: u8 = 0xAA;
pub const DEVICE_NUMBER: u8 = 0x0C;

// Command constants (before masking off the high bit)
pub const CMD_SET_TARGET: u8 = 0x84;
pub const CMD_SET_SPEED: u8 = 0x87;
pub const CMD_SET_ACCELERATION: u8 = 0x89;
pub const CMD_GET_POSITION: u8 = 0x90;
pub const CMD_GET_ERRORS: u8 = 0xA1;

pub const RESPONSE_LEN: usize = 2;

/// Target value meaning "stop sending pulses".
pub const NEUTRAL_TARGET: i32 = 0;

// Controller defaults
#[cfg(windows)]
pub const DEFAULT_DEVICE: &str = "COM1";
#[cfg(not(windows))]
pub const DEFAULT_DEVICE: &str = "/dev/ttyS0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_CHANNEL_COUNT: u8 = 24;
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Slice used to poll the serial port when no timeout is configured.
pub const BLOCKING_POLL_INTERVAL: Duration = Duration::from_secs(1);
