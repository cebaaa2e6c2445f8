//! Our error types for GC89800 communications.

use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Failure to render a command as a wire frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// The setpoint value has no decimal rendering the device accepts.
    #[error("setpoint value {0} cannot be rendered as a decimal payload")]
    UnrepresentableValue(f64),
    /// The rendered payload would overflow the one-byte frame length field.
    #[error("payload of {0} bytes overflows the frame length byte")]
    PayloadTooLong(usize),
}

/// Custom error type for GC89800 temperature controller communications.
///
/// Soft conditions (exhausted-attempt silence, responses with no parsable
/// numeral) are not errors; they surface as `Ok(None)` from the channel and
/// facade layers.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("serial communication error")]
    Serial(I),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
