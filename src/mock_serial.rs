//! We use this mocking module in unit tests to emulate the controller's
//! serial port.

use std::collections::VecDeque;

use crate::transport::Transport;

/// Our mock type used to emulate the controller end of the link.
///
/// Canned responses are handed out one per exchange attempt: the input
/// discard that begins every attempt loads the next queued response, so a
/// test can script a different reply for each write.
pub struct MockSerial {
    /// Everything written to the mock port, across all exchanges.
    written: Vec<u8>,
    /// Responses not yet handed out.
    responses: VecDeque<Vec<u8>>,
    /// Response for the attempt in progress.
    current: Vec<u8>,
    /// Read position within `current`.
    position: usize,
    /// Number of input discards observed.
    discards: usize,
    /// Flag to simulate write errors.
    should_error_on_write: bool,
}

#[derive(Debug)]
pub enum MockSerialError {
    /// No data available; stands in for an exhausted read timeout.
    WouldBlock,
    /// Generic simulated error for testing.
    SimulatedError,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MockSerialError::WouldBlock => write!(f, "would block"),
            MockSerialError::SimulatedError => write!(f, "simulated error"),
        }
    }
}

impl core::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::WouldBlock => embedded_io::ErrorKind::TimedOut,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.position >= self.current.len() {
            return Err(MockSerialError::WouldBlock);
        }
        let available = self.current.len() - self.position;
        let count = buf.len().min(available);
        buf[..count].copy_from_slice(&self.current[self.position..self.position + count]);
        self.position += count;
        Ok(count)
    }
}

impl Transport for MockSerial {
    fn discard_input(&mut self) -> Result<(), Self::Error> {
        self.discards += 1;
        self.position = 0;
        self.current = self.responses.pop_front().unwrap_or_default();
        Ok(())
    }
}

impl MockSerial {
    pub fn new() -> Self {
        Self {
            written: Vec::new(),
            responses: VecDeque::new(),
            current: Vec::new(),
            position: 0,
            discards: 0,
            should_error_on_write: false,
        }
    }

    /// Queue the response handed out on the next exchange attempt.
    pub fn push_response(&mut self, data: &[u8]) {
        self.responses.push_back(data.to_vec());
    }

    /// Everything written to this mock port so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn clear_written(&mut self) {
        self.written.clear();
    }

    /// Number of input discards observed, one per exchange attempt.
    pub fn discards(&self) -> usize {
        self.discards
    }

    /// Configure whether write operations should fail with an error.
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Read, Write};

    #[test]
    fn writes_accumulate() {
        let mut mock = MockSerial::new();
        mock.write(b"GVT").unwrap();
        mock.write(b"23.5").unwrap();
        assert_eq!(mock.written(), b"GVT23.5");

        mock.clear_written();
        assert!(mock.written().is_empty());
    }

    #[test]
    fn read_without_a_loaded_response_would_block() {
        let mut mock = MockSerial::new();
        let mut buf = [0u8; 8];
        assert!(matches!(
            mock.read(&mut buf),
            Err(MockSerialError::WouldBlock)
        ));
    }

    #[test]
    fn discard_loads_the_next_queued_response() {
        let mut mock = MockSerial::new();
        mock.push_response(b"first");
        mock.push_response(b"second");

        let mut buf = [0u8; 8];
        mock.discard_input().unwrap();
        let n = mock.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"first");

        mock.discard_input().unwrap();
        let n = mock.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"second");
        assert_eq!(mock.discards(), 2);
    }

    #[test]
    fn discard_drops_unread_bytes() {
        let mut mock = MockSerial::new();
        mock.push_response(b"stale bytes");
        mock.discard_input().unwrap();

        let mut buf = [0u8; 5];
        mock.read(&mut buf).unwrap();

        // Next exchange: the remainder of the old response is gone.
        mock.discard_input().unwrap();
        assert!(matches!(
            mock.read(&mut buf),
            Err(MockSerialError::WouldBlock)
        ));
    }

    #[test]
    fn simulated_write_errors() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);
        assert!(matches!(
            mock.write(b"GVT"),
            Err(MockSerialError::SimulatedError)
        ));
        assert!(mock.written().is_empty());
    }
}
