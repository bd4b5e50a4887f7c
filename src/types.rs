use crate::constants::*;
use strum_macros::{Display, EnumIter};

#[derive(Debug, Display, EnumIter, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Opcode {
    SetTarget,
    SetSpeed,
    SetAcceleration,
    GetPosition,
    GetErrors,
}

impl Opcode {
    /// Opcode as listed in the device manual, high bit still set.
    pub fn raw(self) -> u8 {
        match self {
            Opcode::SetTarget => CMD_SET_TARGET,
            Opcode::SetSpeed => CMD_SET_SPEED,
            Opcode::SetAcceleration => CMD_SET_ACCELERATION,
            Opcode::GetPosition => CMD_GET_POSITION,
            Opcode::GetErrors => CMD_GET_ERRORS,
        }
    }

    /// Opcode byte as transmitted after the prefix.
    pub fn wire(self) -> u8 {
        self.raw() & 0x7F
    }

    /// Number of response bytes the device sends back.
    pub fn response_len(self) -> usize {
        match self {
            Opcode::GetPosition | Opcode::GetErrors => RESPONSE_LEN,
            _ => 0,
        }
    }
}

/// One framed request to the controller.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Command {
    SetTarget { channel: u8, value: i32 },
    SetSpeed { channel: u8, value: i32 },
    SetAcceleration { channel: u8, value: i32 },
    GetPosition { channel: u8 },
    GetErrors,
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::SetTarget { .. } => Opcode::SetTarget,
            Command::SetSpeed { .. } => Opcode::SetSpeed,
            Command::SetAcceleration { .. } => Opcode::SetAcceleration,
            Command::GetPosition { .. } => Opcode::GetPosition,
            Command::GetErrors => Opcode::GetErrors,
        }
    }

    pub fn channel(&self) -> Option<u8> {
        match *self {
            Command::SetTarget { channel, .. }
            | Command::SetSpeed { channel, .. }
            | Command::SetAcceleration { channel, .. }
            | Command::GetPosition { channel } => Some(channel),
            Command::GetErrors => None,
        }
    }

    /// Encodes the full frame, prefix included.
    ///
    /// Channel numbers are sent as given; the device ignores numbers above
    /// its channel count.
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = vec![SYNC_BYTE, DEVICE_NUMBER, self.opcode().wire()];
        match *self {
            Command::SetTarget { channel, value }
            | Command::SetSpeed { channel, value }
            | Command::SetAcceleration { channel, value } => {
                let (low, high) = split_14bit(value);
                frame.extend_from_slice(&[channel, low, high]);
            }
            Command::GetPosition { channel } => frame.push(channel),
            Command::GetErrors => {}
        }
        frame
    }
}

/// Splits a value into two 7-bit bytes, low first.
///
/// Only bits 0..14 survive: values outside `[0, 16383]` (negatives included)
/// wrap silently.
pub fn split_14bit(value: i32) -> (u8, u8) {
    ((value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8)
}

pub fn join_14bit(low: u8, high: u8) -> i32 {
    (low & 0x7F) as i32 | (((high & 0x7F) as i32) << 7)
}

pub fn decode_response(data: [u8; RESPONSE_LEN]) -> i16 {
    i16::from_le_bytes(data)
}
