use crate::{
    channel::Channel,
    config::ControllerConfig,
    error::{MaestroError, Result},
    transport::{Link, SerialTransport, Transport},
    types::Command,
};
use std::ops::{Index, IndexMut};
use tracing::{info, warn};

/// Pololu Maestro servo controller on a UART link.
///
/// Owns the transport and a fixed set of channels, channel `i` at index `i`.
/// Call [`Controller::shutdown`] to park every channel and close the link;
/// dropping an open controller does the same.
pub struct Controller {
    link: Link,
    channels: Vec<Channel>,
    closed: bool,
}

impl Controller {
    /// Opens the serial port described by `config`.
    pub fn open(config: ControllerConfig) -> Result<Self> {
        let transport = SerialTransport::open(&config)?;
        Ok(Self::with_transport(transport, config))
    }

    /// Opens the platform's default port at 9600 baud with 24 channels.
    pub fn open_default() -> Result<Self> {
        Self::open(ControllerConfig::default())
    }

    /// Builds a controller on an already opened transport.
    pub fn with_transport(transport: impl Transport + 'static, config: ControllerConfig) -> Self {
        let link = Link::new(Box::new(transport));
        let channels = (0..config.channel_count)
            .map(|no| Channel::new(no, link.clone(), config.range, config.settle_delay))
            .collect();

        info!(channels = config.channel_count, "controller ready");
        Controller {
            link,
            channels,
            closed: false,
        }
    }

    /// Error bits reported by the firmware; their meaning is device-defined.
    pub fn get_error(&self) -> Result<i16> {
        self.ensure_open()?;
        self.link.query(&Command::GetErrors)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [Channel] {
        &mut self.channels
    }

    pub fn channel(&self, no: usize) -> Option<&Channel> {
        self.channels.get(no)
    }

    pub fn channel_mut(&mut self, no: usize) -> Option<&mut Channel> {
        self.channels.get_mut(no)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Parks every channel in order, then closes the transport.
    ///
    /// The first failing channel stops the sequence; the transport is closed
    /// regardless and that error is returned. Fails with `InvalidState` when
    /// already closed.
    pub fn shutdown(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;

        let parked = self.channels.iter_mut().try_for_each(Channel::shutdown);
        let closed = self.link.close();
        info!("controller closed");

        parked.and(closed)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed || !self.link.is_open() {
            return Err(MaestroError::InvalidState);
        }
        Ok(())
    }
}

impl Index<usize> for Controller {
    type Output = Channel;

    fn index(&self, no: usize) -> &Channel {
        &self.channels[no]
    }
}

impl IndexMut<usize> for Controller {
    fn index_mut(&mut self, no: usize) -> &mut Channel {
        &mut self.channels[no]
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.shutdown() {
            warn!("shutdown on drop failed: {}", e);
        }
    }
}
