use std::io;
use std::io::Read;
use std::io::Write;
use std::time::Duration;
use std::time::Instant;

use log::debug;
use log::info;
use serialport::DataBits;
use serialport::FlowControl;
use serialport::Parity;
use serialport::SerialPort;
use serialport::StopBits;
use thiserror::Error;

use crate::port_resolver::resolve_port;
use crate::port_resolver::PortEnumerator;
use crate::port_resolver::SystemPorts;
use crate::rm8_frames::frame_for;
use crate::rm8_frames::Frame;
use crate::rm8_frames::ACK;
use crate::rm8_types::InvalidChannel;
use crate::rm8_types::RelayId;
use crate::rm8_types::RelayState;

pub const BAUD_RATE: u32 = 115_200;
pub const READ_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("No serial port description contains '{marker}'")]
    PortNotFound { marker: String },

    #[error("Failed to open serial port '{port}'")]
    PortOpen {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Failed to exchange data with relay board on '{port}'")]
    Transmission {
        port: String,
        #[source]
        source: io::Error,
    },

    #[error("Unexpected response from relay board on '{port}': {response:02X?}")]
    UnexpectedResponse { port: String, response: Vec<u8> },
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error(transparent)]
    InvalidChannel(#[from] InvalidChannel),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// A byte stream to the relay board, open for a single transaction.
pub trait Connection: Read + Write {
    /// Upper bound for each following `read` call.
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

impl Connection for Box<dyn SerialPort> {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.set_timeout(timeout).map_err(io::Error::from)
    }
}

pub trait PortOpener {
    fn open(&self, port_name: &str) -> Result<Box<dyn Connection>, serialport::Error>;
}

/// Opens system serial ports with the fixed 115200 8N1 settings of the board.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialPortOpener;

impl PortOpener for SerialPortOpener {
    fn open(&self, port_name: &str) -> Result<Box<dyn Connection>, serialport::Error> {
        let port = serialport::new(port_name, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()?;
        Ok(Box::new(port))
    }
}

pub struct Rm8Control {
    marker: String,
    enumerator: Box<dyn PortEnumerator>,
    opener: Box<dyn PortOpener>,
}

impl Rm8Control {
    pub fn open<S: Into<String>>(marker: S) -> Rm8Control {
        Rm8Control::with(
            marker,
            Box::new(SystemPorts),
            Box::new(SerialPortOpener),
        )
    }

    pub fn with<S: Into<String>>(
        marker: S,
        enumerator: Box<dyn PortEnumerator>,
        opener: Box<dyn PortOpener>,
    ) -> Rm8Control {
        Rm8Control {
            marker: marker.into(),
            enumerator,
            opener,
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn enumerator(&self) -> &dyn PortEnumerator {
        self.enumerator.as_ref()
    }

    pub fn set_all(&mut self, state: RelayState) -> Vec<(RelayId, Result<(), ProtocolError>)> {
        RelayId::ALL
            .iter()
            .map(|relay| (*relay, self.set(relay, state)))
            .collect()
    }

    pub fn set(&mut self, relay: &RelayId, state: RelayState) -> Result<(), ProtocolError> {
        info!("Set '{}' to '{}'", relay, state);
        self.send_command(frame_for(relay, state))
    }

    pub fn switch_relay(&mut self, channel: u8, state: RelayState) -> Result<(), ChannelError> {
        let relay = RelayId::try_from(channel)?;
        self.set(&relay, state)?;
        Ok(())
    }

    /// Runs one complete transaction: resolve, open, write, read, close.
    ///
    /// The port is owned by this call only and is closed on every return path.
    pub fn send_command(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        let port = match resolve_port(self.enumerator.as_ref(), &self.marker) {
            Some(port) => port,
            None => {
                return Err(ProtocolError::PortNotFound {
                    marker: self.marker.clone(),
                })
            }
        };

        let mut connection = self
            .opener
            .open(&port)
            .map_err(|source| ProtocolError::PortOpen {
                port: port.clone(),
                source,
            })?;

        debug!("Sending {:02X?} to {}", frame, port);
        let response = exchange(connection.as_mut(), frame, READ_TIMEOUT);
        drop(connection);
        let response = response.map_err(|source| ProtocolError::Transmission {
            port: port.clone(),
            source,
        })?;
        debug!("Received {:02X?} from {}", response, port);

        match response.as_slice() == ACK {
            true => Ok(()),
            false => Err(ProtocolError::UnexpectedResponse { port, response }),
        }
    }
}

fn exchange(
    connection: &mut dyn Connection,
    frame: &Frame,
    timeout: Duration,
) -> io::Result<Vec<u8>> {
    connection.write_all(frame)?;
    connection.flush()?;
    read_line(connection, timeout)
}

/// Reads up to and including a `\n`, until `timeout` elapsed or the stream ended.
///
/// Each read may only block for what is left of `timeout`. Running into the
/// timeout is not an error, whatever arrived so far is returned.
fn read_line(connection: &mut dyn Connection, timeout: Duration) -> io::Result<Vec<u8>> {
    let deadline = Instant::now() + timeout;
    let mut line = Vec::new();
    let mut buf = [0u8; 1];
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        connection.set_read_timeout(remaining)?;
        match connection.read(&mut buf) {
            Ok(0) => break,
            Ok(_) => {
                line.push(buf[0]);
                if buf[0] == b'\n' {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(line)
}
