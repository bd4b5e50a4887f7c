use crate::config::ControllerConfig;
use crate::constants::*;
use crate::error::{MaestroError, Result};
use crate::types::{decode_response, Command};
use parking_lot::Mutex;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, ErrorKind, Read, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Duplex byte channel to the controller.
pub trait Transport: Send {
    fn write_all(&mut self, data: &[u8]) -> Result<()>;
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// UART link, 8N1 without flow control.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    timeout: Option<Duration>,
}

impl SerialTransport {
    pub fn open(config: &ControllerConfig) -> Result<Self> {
        let port = serialport::new(config.device.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.timeout.unwrap_or(BLOCKING_POLL_INTERVAL))
            .open()
            .map_err(|source| MaestroError::Open {
                device: config.device.clone(),
                source,
            })?;

        info!(device = %config.device, baud = config.baud_rate, "serial port opened");
        Ok(SerialTransport {
            port: Some(port),
            timeout: config.timeout,
        })
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(MaestroError::InvalidState)
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let timeout = self.timeout;
        let port = self.port()?;
        write_frame(port, data, timeout)?;
        port.flush()?;
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let timeout = self.timeout;
        read_frame(self.port()?, buf, timeout)
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            port.flush()?;
        }
        Ok(())
    }
}

// With no timeout configured an expired poll slice just means "keep waiting".
fn keep_waiting(err: &io::Error, timeout: Option<Duration>) -> bool {
    err.kind() == ErrorKind::Interrupted || (err.kind() == ErrorKind::TimedOut && timeout.is_none())
}

fn write_frame<W: Write + ?Sized>(port: &mut W, data: &[u8], timeout: Option<Duration>) -> Result<()> {
    let mut written = 0;
    while written < data.len() {
        match port.write(&data[written..]) {
            Ok(0) => return Err(io::Error::from(ErrorKind::WriteZero).into()),
            Ok(n) => written += n,
            Err(e) if keep_waiting(&e, timeout) => continue,
            Err(e) if e.kind() == ErrorKind::TimedOut => {
                return Err(MaestroError::Timeout {
                    expected: data.len(),
                    received: written,
                })
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn read_frame<R: Read + ?Sized>(port: &mut R, buf: &mut [u8], timeout: Option<Duration>) -> Result<()> {
    let mut received = 0;
    while received < buf.len() {
        match port.read(&mut buf[received..]) {
            Ok(0) => return Err(io::Error::from(ErrorKind::UnexpectedEof).into()),
            Ok(n) => received += n,
            Err(e) if keep_waiting(&e, timeout) => continue,
            Err(e) if e.kind() == ErrorKind::TimedOut => {
                return Err(MaestroError::Timeout {
                    expected: buf.len(),
                    received,
                })
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Handle to the controller's transport shared with its channels.
///
/// Only the controller closes it; after that every command fails with
/// `InvalidState`.
#[derive(Clone)]
pub(crate) struct Link {
    inner: Arc<Mutex<Option<Box<dyn Transport>>>>,
}

impl Link {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Link {
            inner: Arc::new(Mutex::new(Some(transport))),
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().is_some()
    }

    pub fn send(&self, command: &Command) -> Result<()> {
        let mut guard = self.inner.lock();
        let transport = guard.as_mut().ok_or(MaestroError::InvalidState)?;
        debug!(opcode = %command.opcode(), channel = ?command.channel(), "sending command");
        transport.write_all(&command.encode())
    }

    /// Sends a query and reads its 2-byte reply without letting another
    /// command in between.
    pub fn query(&self, command: &Command) -> Result<i16> {
        let mut guard = self.inner.lock();
        let transport = guard.as_mut().ok_or(MaestroError::InvalidState)?;
        debug!(opcode = %command.opcode(), channel = ?command.channel(), "sending query");
        transport.write_all(&command.encode())?;

        let mut data = [0u8; RESPONSE_LEN];
        transport.read_exact(&mut data)?;
        Ok(decode_response(data))
    }

    pub fn close(&self) -> Result<()> {
        let mut transport = self.inner.lock().take().ok_or(MaestroError::InvalidState)?;
        transport.close()?;
        info!("transport closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Loopback {
        written: Arc<Mutex<Vec<u8>>>,
        replies: VecDeque<u8>,
    }

    impl Transport for Loopback {
        fn write_all(&mut self, data: &[u8]) -> Result<()> {
            self.written.lock().extend_from_slice(data);
            Ok(())
        }

        fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
            for byte in buf.iter_mut() {
                *byte = self
                    .replies
                    .pop_front()
                    .ok_or_else(|| io::Error::from(ErrorKind::UnexpectedEof))?;
            }
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    /// Port that replays a fixed script of read/write outcomes.
    #[derive(Default)]
    struct ScriptedPort {
        reads: VecDeque<io::Result<Vec<u8>>>,
        writes: VecDeque<io::Result<usize>>,
        written: Vec<u8>,
    }

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::from(ErrorKind::TimedOut)),
            }
        }
    }

    impl Write for ScriptedPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = self.writes.pop_front().unwrap_or(Ok(buf.len()))?;
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn timed_out() -> io::Error {
        io::Error::from(ErrorKind::TimedOut)
    }

    #[test]
    fn silent_device_times_out_when_timeout_configured() {
        let mut port = ScriptedPort::default();
        let mut buf = [0u8; 2];
        let err = read_frame(&mut port, &mut buf, Some(Duration::from_millis(50))).unwrap_err();
        assert!(matches!(err, MaestroError::Timeout { expected: 2, received: 0 }));
    }

    #[test]
    fn partial_reply_reports_received_bytes() {
        let mut port = ScriptedPort {
            reads: VecDeque::from(vec![Ok(vec![0xE8]), Err(timed_out())]),
            ..Default::default()
        };
        let mut buf = [0u8; 2];
        let err = read_frame(&mut port, &mut buf, Some(Duration::from_millis(50))).unwrap_err();
        assert!(matches!(err, MaestroError::Timeout { expected: 2, received: 1 }));
    }

    #[test]
    fn without_timeout_expired_polls_keep_waiting() {
        let mut port = ScriptedPort {
            reads: VecDeque::from(vec![
                Err(timed_out()),
                Ok(vec![0xE8]),
                Err(timed_out()),
                Err(io::Error::from(ErrorKind::Interrupted)),
                Ok(vec![0x03]),
            ]),
            ..Default::default()
        };
        let mut buf = [0u8; 2];
        read_frame(&mut port, &mut buf, None).unwrap();
        assert_eq!(decode_response(buf), 1000);
    }

    #[test]
    fn read_errors_other_than_timeout_are_transport_errors() {
        let mut port = ScriptedPort {
            reads: VecDeque::from(vec![Err(io::Error::from(ErrorKind::BrokenPipe))]),
            ..Default::default()
        };
        let mut buf = [0u8; 2];
        let err = read_frame(&mut port, &mut buf, None).unwrap_err();
        assert!(matches!(err, MaestroError::Transport(_)));
    }

    #[test]
    fn write_retries_without_timeout_and_fails_with_one() {
        let frame = Command::SetTarget { channel: 1, value: 6000 }.encode();

        let mut port = ScriptedPort {
            writes: VecDeque::from(vec![Ok(2), Err(timed_out()), Ok(4)]),
            ..Default::default()
        };
        write_frame(&mut port, &frame, None).unwrap();
        assert_eq!(port.written, frame);

        let mut port = ScriptedPort {
            writes: VecDeque::from(vec![Ok(2), Err(timed_out())]),
            ..Default::default()
        };
        let err = write_frame(&mut port, &frame, Some(Duration::from_millis(50))).unwrap_err();
        assert!(matches!(err, MaestroError::Timeout { expected: 6, received: 2 }));
    }

    #[test]
    fn query_writes_then_decodes() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let link = Link::new(Box::new(Loopback {
            written: written.clone(),
            replies: VecDeque::from(vec![0x04, 0x00]),
        }));

        assert_eq!(link.query(&Command::GetErrors).unwrap(), 4);
        assert_eq!(*written.lock(), vec![0xAA, 0x0C, 0x21]);
    }

    #[test]
    fn short_reply_is_a_transport_error() {
        let link = Link::new(Box::new(Loopback {
            replies: VecDeque::from(vec![0x01]),
            ..Default::default()
        }));

        let err = link.query(&Command::GetPosition { channel: 0 }).unwrap_err();
        assert!(matches!(err, MaestroError::Transport(_)));
    }

    #[test]
    fn closed_link_rejects_commands() {
        let link = Link::new(Box::new(Loopback::default()));
        let shared = link.clone();
        link.close().unwrap();

        assert!(!shared.is_open());
        assert!(matches!(
            shared.send(&Command::SetTarget { channel: 0, value: 0 }),
            Err(MaestroError::InvalidState)
        ));
        assert!(matches!(link.close(), Err(MaestroError::InvalidState)));
    }
}
