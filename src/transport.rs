//! Serial transport: the byte channel the protocol layers sit on.
//!
//! The controller shows up as an FTDI USB-serial adapter with a fixed serial
//! number, so discovery is by USB identity rather than port name.

use std::io;
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort, SerialPortType};
use thiserror::Error;

/// Baud rate the controller's port runs at.
pub const BAUD_RATE: u32 = 250_000;
/// Per-read timeout. The controller is slow relative to the bus.
pub const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// USB identity the temperature controller enumerates with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareId {
    pub vid: u16,
    pub pid: u16,
    pub serial_number: String,
}

impl Default for HardwareId {
    fn default() -> Self {
        Self {
            vid: 0x0403,
            pid: 0x6001,
            serial_number: "AI02KU1BA".into(),
        }
    }
}

/// A byte-oriented duplex channel with explicit input discard.
///
/// Exchanges carry no delimiter the transport could resynchronize on, so
/// implementations must be able to drop whatever is pending in the receive
/// buffer before a fresh exchange begins.
pub trait Transport: embedded_io::Read + embedded_io::Write {
    /// Discard any unread bytes pending in the receive buffer.
    fn discard_input(&mut self) -> Result<(), Self::Error>;
}

/// Failure to locate or open the controller's serial port.
#[derive(Error, Debug)]
pub enum OpenError {
    #[error("no serial port matches the controller hardware id")]
    NoDevice,
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// [`embedded_io`] adapter over a [`serialport`] handle.
pub struct SerialTransport(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for SerialTransport {
    type Error = IoError;
}

impl embedded_io::Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        io::Write::flush(&mut self.0).map_err(IoError)
    }
}

impl Transport for SerialTransport {
    fn discard_input(&mut self) -> Result<(), Self::Error> {
        self.0
            .clear(ClearBuffer::Input)
            .map_err(|e| IoError(io::Error::other(e)))
    }
}

/// Find the name of the port the controller is attached to, if any.
pub fn find_port(id: &HardwareId) -> Result<Option<String>, serialport::Error> {
    for port in serialport::available_ports()? {
        if let SerialPortType::UsbPort(usb) = &port.port_type {
            if usb.vid == id.vid
                && usb.pid == id.pid
                && usb.serial_number.as_deref() == Some(id.serial_number.as_str())
            {
                return Ok(Some(port.port_name));
            }
        }
    }
    Ok(None)
}

/// Open the controller's serial port, discovering it by USB identity.
pub fn open(id: &HardwareId) -> Result<SerialTransport, OpenError> {
    let name = find_port(id)?.ok_or(OpenError::NoDevice)?;
    log::info!("found temperature controller on {name}");
    open_named(&name)
}

/// Open a specific port with the controller's serial settings.
pub fn open_named(name: &str) -> Result<SerialTransport, OpenError> {
    let port = serialport::new(name, BAUD_RATE)
        .timeout(READ_TIMEOUT)
        .open()?;
    Ok(SerialTransport(port))
}
