//! Bounded-retry request/response exchange over the serial transport.

use std::time::Duration;

use embedded_io::{Error as _, ErrorKind};

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::transport::Transport;

/// Write attempts per exchange.
pub const DEFAULT_ATTEMPTS: usize = 2;
/// Bytes to read back after each write.
pub const DEFAULT_RESPONSE_LENGTH: usize = 15;
/// Pause between writing a frame and reading the reply. The controller has no
/// ready signal and needs this long to start answering.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

/// Request/response exchange over an exclusively owned transport.
pub struct Channel<T: Transport> {
    transport: T,
    attempts: usize,
    response_length: usize,
    settle: Duration,
}

impl<T: Transport> Channel<T> {
    pub fn new(transport: T) -> Self {
        Self::with_tuning(
            transport,
            DEFAULT_ATTEMPTS,
            DEFAULT_RESPONSE_LENGTH,
            DEFAULT_SETTLE,
        )
    }

    /// Override the exchange tuning.
    pub fn with_tuning(
        transport: T,
        attempts: usize,
        response_length: usize,
        settle: Duration,
    ) -> Self {
        Self {
            transport,
            attempts,
            response_length,
            settle,
        }
    }

    /// Send `frame` and read back up to the configured response length.
    ///
    /// Pending input is discarded before every write: exchanges are not
    /// delimited at the transport layer, so stale bytes from a prior
    /// malformed exchange would otherwise corrupt this read. Returns
    /// `Ok(None)` when every attempt produced an empty response; that is a
    /// soft failure and the caller decides whether to retry at a higher
    /// level. Hard transport errors propagate as `Err`.
    pub fn exchange(&mut self, frame: &Frame) -> Result<Option<Vec<u8>>, T::Error> {
        for _ in 0..self.attempts {
            self.transport.discard_input().map_err(Error::Serial)?;
            self.transport
                .write_all(frame.as_bytes())
                .map_err(Error::Serial)?;
            std::thread::sleep(self.settle);
            let response = self.read_response()?;
            if !response.is_empty() {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    /// Accumulate reads until the response length is reached or the device
    /// stops answering. Whatever arrived before a timeout still counts.
    fn read_response(&mut self) -> Result<Vec<u8>, T::Error> {
        let mut response = Vec::with_capacity(self.response_length);
        let mut chunk = [0u8; 16];
        while response.len() < self.response_length {
            let want = (self.response_length - response.len()).min(chunk.len());
            match self.transport.read(&mut chunk[..want]) {
                Ok(0) => break,
                Ok(n) => response.extend_from_slice(&chunk[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Other) => break,
                Err(e) => return Err(Error::Serial(e)),
            }
        }
        Ok(response)
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
