//! Error types for the servo controller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaestroError {
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Failed to open {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Timed out waiting for response: expected {expected} bytes, got {received}")]
    Timeout { expected: usize, received: usize },

    #[error("Controller is closed")]
    InvalidState,
}

pub type Result<T, E = MaestroError> = std::result::Result<T, E>;
