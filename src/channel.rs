use crate::constants::NEUTRAL_TARGET;
use crate::error::Result;
use crate::transport::Link;
use crate::types::Command;
use std::thread;
use std::time::Duration;

/// One servo output of the controller.
///
/// Positions are in quarter-microseconds of pulse width. The cached target,
/// speed and acceleration are what was last written to the wire; the device
/// never acknowledges them.
pub struct Channel {
    no: u8,
    min_position: i32,
    max_position: i32,
    requested_target: i32,
    target: i32,
    speed: i32,
    acceleration: i32,
    settle_delay: Duration,
    link: Link,
}

impl Channel {
    pub(crate) fn new(no: u8, link: Link, range: (i32, i32), settle_delay: Duration) -> Self {
        Channel {
            no,
            min_position: range.0,
            max_position: range.1,
            requested_target: 0,
            target: 0,
            speed: 0,
            acceleration: 0,
            settle_delay,
            link,
        }
    }

    pub fn no(&self) -> u8 {
        self.no
    }

    /// Current pulse width reported by the device.
    pub fn get_position(&self) -> Result<i16> {
        self.link.query(&Command::GetPosition { channel: self.no })
    }

    pub fn set_speed(&mut self, value: i32) -> Result<()> {
        self.link.send(&Command::SetSpeed {
            channel: self.no,
            value,
        })?;
        self.speed = value;
        Ok(())
    }

    pub fn set_acceleration(&mut self, value: i32) -> Result<()> {
        self.link.send(&Command::SetAcceleration {
            channel: self.no,
            value,
        })?;
        self.acceleration = value;
        Ok(())
    }

    /// Moves the servo, clamping `value` into the configured range.
    ///
    /// `0` is sent as is and switches the output off.
    pub fn set_target(&mut self, value: i32) -> Result<()> {
        let clamped = self.clamp(value);
        self.link.send(&Command::SetTarget {
            channel: self.no,
            value: clamped,
        })?;
        self.requested_target = value;
        self.target = clamped;
        Ok(())
    }

    fn clamp(&self, value: i32) -> i32 {
        if value == NEUTRAL_TARGET {
            return value;
        }
        let mut value = value;
        if self.min_position != 0 && value < self.min_position {
            value = self.min_position;
        }
        if self.max_position != 0 && value > self.max_position {
            value = self.max_position;
        }
        value
    }

    /// Last target sent to the device, after clamping.
    pub fn target(&self) -> i32 {
        self.target
    }

    /// Last target passed to [`Channel::set_target`] that made it onto the wire, before clamping.
    pub fn requested_target(&self) -> i32 {
        self.requested_target
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    pub fn acceleration(&self) -> i32 {
        self.acceleration
    }

    pub fn range(&self) -> (i32, i32) {
        (self.min_position, self.max_position)
    }

    /// Bounds used by `set_target`; 0 disables a side. `min <= max` is not checked.
    pub fn set_range(&mut self, (min, max): (i32, i32)) {
        self.min_position = min;
        self.max_position = max;
    }

    pub fn min_position(&self) -> i32 {
        self.min_position
    }

    pub fn set_min_position(&mut self, min: i32) {
        self.min_position = min;
    }

    pub fn max_position(&self) -> i32 {
        self.max_position
    }

    pub fn set_max_position(&mut self, max: i32) {
        self.max_position = max;
    }

    /// Switches the output off and waits for the servo to settle.
    pub fn shutdown(&mut self) -> Result<()> {
        self.set_target(NEUTRAL_TARGET)?;
        thread::sleep(self.settle_delay);
        Ok(())
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("no", &self.no)
            .field("range", &self.range())
            .field("target", &self.target)
            .field("speed", &self.speed)
            .field("acceleration", &self.acceleration)
            .finish()
    }
}
