//! This crate provides an interface for communicating with and controlling a
//! GC89800 laboratory temperature controller over a serial link, plus an
//! unattended ramp/soak profile runner built on top of it.
//!
//! The controller speaks a small framed binary protocol on a half-duplex
//! link. Three commands are used:
//! * `GVT` - read the measured temperature.
//! * `GVS` - read the active setpoint.
//! * `SVS` - write a new setpoint.
//!
//! See [`frame`] for the wire format and [`profile`] for the ramp/soak state
//! machine.
//!
//! The serial port used for controller comms should be configured like so:
//! * Baud rate: 250000
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//! * Read timeout: 500 ms

pub mod channel;
pub mod controller;
pub mod csvlog;
pub mod error;
pub mod frame;
pub mod profile;
pub mod transport;

#[cfg(test)]
mod mock_serial;
