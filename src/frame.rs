//! Wire frame construction and response parsing for the GC89800 protocol.
//!
//! Frame layout:
//!
//! ```text
//! [length][255 - length][mnemonic (3)][payload (0..n)][control][checksum][>]
//! ```
//!
//! * `length` counts every byte between the length byte and the terminator.
//! * The complement byte is the ones' complement of the length byte and acts
//!   as a self-check on the device side.
//! * The control byte is `0x01` for read commands and `0x02` for writes.
//! * The checksum is the modulo-256 sum of every frame byte before the
//!   control byte. An unreduced two-byte sum also circulates for this
//!   protocol family, but the controller only accepts the single-byte form.

use std::sync::LazyLock;

use regex::bytes::Regex;
use strum_macros::EnumIter;

use crate::error::EncodeError;

/// Terminator byte closing every frame.
pub const TERMINATOR: u8 = b'>';

/// Commands understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, EnumIter)]
pub enum Command {
    /// `GVT` - read the measured temperature.
    ReadTemperature,
    /// `GVS` - read the active setpoint.
    ReadSetpoint,
    /// `SVS` - write a new setpoint. The value is in the device's internal
    /// units and is rendered to at most two fractional digits.
    WriteSetpoint(f64),
}

impl Command {
    /// Three-character command code.
    pub fn mnemonic(&self) -> &'static [u8; 3] {
        match self {
            Command::ReadTemperature => b"GVT",
            Command::ReadSetpoint => b"GVS",
            Command::WriteSetpoint(_) => b"SVS",
        }
    }

    fn control(&self) -> u8 {
        match self {
            Command::ReadTemperature | Command::ReadSetpoint => 0x01,
            Command::WriteSetpoint(_) => 0x02,
        }
    }

    /// Decimal text payload. Reads carry none; writes carry the value rounded
    /// to two fractional digits, always with a decimal point, matching the
    /// numerals the device itself emits.
    fn payload(&self) -> Result<Vec<u8>, EncodeError> {
        match self {
            Command::ReadTemperature | Command::ReadSetpoint => Ok(Vec::new()),
            Command::WriteSetpoint(value) => {
                if !value.is_finite() {
                    return Err(EncodeError::UnrepresentableValue(*value));
                }
                let rounded = (value * 100.0).round() / 100.0;
                let text = if rounded.fract() == 0.0 {
                    format!("{rounded:.1}")
                } else {
                    format!("{rounded}")
                };
                Ok(text.into_bytes())
            }
        }
    }
}

/// A complete, checksummed wire frame. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    /// Build the wire frame for `command`.
    pub fn encode(command: &Command) -> Result<Frame, EncodeError> {
        let payload = command.payload()?;
        // Complement + mnemonic + control + checksum sit between the length
        // byte and the terminator alongside the payload.
        let length = u8::try_from(6 + payload.len())
            .map_err(|_| EncodeError::PayloadTooLong(payload.len()))?;

        let mut bytes = Vec::with_capacity(length as usize + 2);
        bytes.push(length);
        bytes.push(255 - length);
        bytes.extend_from_slice(command.mnemonic());
        bytes.extend_from_slice(&payload);
        let checksum = bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b));
        bytes.push(command.control());
        bytes.push(checksum);
        bytes.push(TERMINATOR);
        Ok(Frame { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

static NUMERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?[0-9]*\.[0-9]+|[0-9]+").expect("static pattern"));

/// Extract the first decimal numeral from a raw response buffer.
///
/// The controller pads its payload with framing bytes on both sides, so
/// responses are scanned for the first signed-or-unsigned numeral rather than
/// parsed at fixed field offsets. Returns `None` when no numeral is present;
/// callers treat that as a failed read, not a protocol error.
pub fn decode(raw: &[u8]) -> Option<f64> {
    let found = NUMERAL.find(raw)?;
    std::str::from_utf8(found.as_bytes()).ok()?.parse().ok()
}
