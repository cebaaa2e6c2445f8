//! Semantic operations on the GC89800 temperature controller.
//!
//! You can drive a [`Gc89800`] over any interface which implements the
//! [`Transport`] trait; the real device sits behind
//! [`SerialTransport`](crate::transport::SerialTransport).

use crate::channel::Channel;
use crate::error::Result;
use crate::frame::{self, Command, Frame};
use crate::transport::Transport;

/// Fixed factor relating the controller's internal setpoint units to
/// engineering units. Applied when writing a setpoint (multiply) and when
/// reading the setpoint register back (divide). The measured temperature
/// register is reported uncorrected.
pub const SETPOINT_CALIBRATION: f64 = 1.002;

/// The temperature controller, addressed through an exclusively owned
/// serial channel.
pub struct Gc89800<T: Transport> {
    channel: Channel<T>,
}

impl<T: Transport> Gc89800<T> {
    pub fn new(channel: Channel<T>) -> Self {
        Self { channel }
    }

    /// Read the measured temperature in engineering units.
    ///
    /// `Ok(None)` covers both an unresponsive link and a response with no
    /// parsable numeral; callers treat the two identically.
    pub fn read_temperature(&mut self) -> Result<Option<f64>, T::Error> {
        self.query(&Command::ReadTemperature)
    }

    /// Read the active setpoint in engineering units.
    pub fn read_setpoint(&mut self) -> Result<Option<f64>, T::Error> {
        let raw = self.query(&Command::ReadSetpoint)?;
        Ok(raw.map(|value| value / SETPOINT_CALIBRATION))
    }

    /// Command a new setpoint in engineering units.
    ///
    /// Fire-and-forget: whatever the controller echoes back is not
    /// validated, and an all-silent exchange is not an error here. The
    /// control layer detects lack of progress from the readback instead.
    pub fn write_setpoint(&mut self, value: f64) -> Result<(), T::Error> {
        let command = Command::WriteSetpoint(value * SETPOINT_CALIBRATION);
        let frame = Frame::encode(&command)?;
        self.channel.exchange(&frame)?;
        Ok(())
    }

    fn query(&mut self, command: &Command) -> Result<Option<f64>, T::Error> {
        let frame = Frame::encode(command)?;
        let response = self.channel.exchange(&frame)?;
        Ok(response.as_deref().and_then(frame::decode))
    }
}
