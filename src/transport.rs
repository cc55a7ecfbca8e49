// src/transport.rs
//! Byte-level transport over the serial link
//!
//! The [`Transport`] trait is the seam between the device session and the
//! wire: the real implementation wraps a serial port, and
//! [`ScriptedTransport`] stands in for it with canned responses.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::time::Duration;

use log::{debug, info};
use tokio_serial::SerialPort;

use crate::error::{GpsError, Result};

/// Minimal contract the session needs from the wire.
///
/// `read_line` blocks up to the configured timeout for a line terminator and
/// returns whatever bytes arrived (possibly none). All failures after a
/// successful open surface as I/O errors or `is_open() == false`.
pub trait Transport: Send {
    fn read_line(&mut self) -> io::Result<Vec<u8>>;
    fn bytes_waiting(&mut self) -> io::Result<usize>;
    fn is_open(&self) -> bool;
    fn close(&mut self);
}

/// Serial port transport with a bounded read timeout.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open the device path at the given baud rate. This is the only place
    /// the transport layer raises `Connection`.
    pub fn open(path: &str, baudrate: u32, timeout: Duration) -> Result<Self> {
        let port = tokio_serial::new(path, baudrate)
            .timeout(timeout)
            .open()
            .map_err(|e| {
                GpsError::Connection(format!("Failed to open serial port {}: {}", path, e))
            })?;

        info!("Serial port {} opened at {} baud", path, baudrate);
        Ok(Self { port: Some(port) })
    }
}

impl Transport for SerialTransport {
    /// Read one line, byte at a time, stopping at LF or when the port's
    /// timeout expires mid-line. Timeout returns the partial line rather
    /// than an error, matching the receiver's burst-then-idle output.
    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let port = match self.port.as_mut() {
            Some(port) => port,
            None => return Err(io::Error::new(io::ErrorKind::NotConnected, "port closed")),
        };

        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e),
            }
        }
        Ok(line)
    }

    fn bytes_waiting(&mut self) -> io::Result<usize> {
        match self.port.as_ref() {
            Some(port) => port
                .bytes_to_read()
                .map(|n| n as usize)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string())),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "port closed")),
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Serial port closed");
        }
    }
}

/// Transport stand-in backed by a queue of canned lines.
///
/// Used by the test suites and useful for offline replay: push recorded
/// sentences, hand the transport to a session, drain.
#[derive(Default)]
pub struct ScriptedTransport {
    lines: VecDeque<Vec<u8>>,
    fail_next_read: bool,
    closed: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sentence; CRLF termination is appended as the wire would.
    pub fn push_line(&mut self, sentence: &str) {
        let mut raw = sentence.as_bytes().to_vec();
        raw.extend_from_slice(b"\r\n");
        self.lines.push_back(raw);
    }

    /// Queue raw bytes exactly as given (no terminator added).
    pub fn push_raw(&mut self, raw: Vec<u8>) {
        self.lines.push_back(raw);
    }

    /// Make the next read fail with an I/O error, as an unplugged device
    /// would.
    pub fn fail_next_read(&mut self) {
        self.fail_next_read = true;
    }
}

impl Transport for ScriptedTransport {
    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        if self.fail_next_read {
            self.fail_next_read = false;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        Ok(self.lines.pop_front().unwrap_or_default())
    }

    fn bytes_waiting(&mut self) -> io::Result<usize> {
        if self.fail_next_read {
            // Lure the caller into the failing read.
            return Ok(1);
        }
        Ok(self.lines.iter().map(Vec::len).sum())
    }

    fn is_open(&self) -> bool {
        !self.closed
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Enumerate serial ports visible to the host.
pub fn list_serial_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| GpsError::Other(format!("Failed to list serial ports: {}", e)))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_transport_replays_lines_in_order() {
        let mut transport = ScriptedTransport::new();
        transport.push_line("$GPGGA,1");
        transport.push_line("$GPRMC,2");

        assert_eq!(transport.bytes_waiting().unwrap(), 20);
        assert_eq!(transport.read_line().unwrap(), b"$GPGGA,1\r\n");
        assert_eq!(transport.read_line().unwrap(), b"$GPRMC,2\r\n");
        assert_eq!(transport.bytes_waiting().unwrap(), 0);
        assert!(transport.read_line().unwrap().is_empty());
    }

    #[test]
    fn test_scripted_transport_failure_fires_once() {
        let mut transport = ScriptedTransport::new();
        transport.push_line("$GPGGA,1");
        transport.fail_next_read();

        assert!(transport.bytes_waiting().unwrap() > 0);
        assert!(transport.read_line().is_err());
        // The queued line is still there afterwards.
        assert_eq!(transport.read_line().unwrap(), b"$GPGGA,1\r\n");
    }

    #[test]
    fn test_scripted_transport_close() {
        let mut transport = ScriptedTransport::new();
        assert!(transport.is_open());
        transport.close();
        assert!(!transport.is_open());
    }
}
