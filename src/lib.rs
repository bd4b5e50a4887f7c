mod channel;
mod config;
mod constants;
mod controller;
mod error;
mod transport;
mod types;

pub use channel::Channel;
pub use config::ControllerConfig;
pub use controller::Controller;
pub use error::{MaestroError, Result};
pub use transport::{SerialTransport, Transport};
pub use types::{decode_response, join_14bit, split_14bit, Command, Opcode};

// Re-export commonly used items
pub use constants::{DEFAULT_BAUD_RATE, DEFAULT_CHANNEL_COUNT, DEFAULT_DEVICE, SETTLE_DELAY};
