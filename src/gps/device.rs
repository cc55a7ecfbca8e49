// src/gps/device.rs
//! GPS device session: one transport, one decoder, one fix record

use std::io;
use std::time::Duration;

use log::{debug, error, info, warn};

use super::data::GpsFix;
use super::nmea;
use crate::error::{Result, SessionError};
use crate::transport::{SerialTransport, Transport};

/// A live session with a GPS receiver.
///
/// Owns the transport and the fix record exclusively; nothing else mutates
/// the fix. Readers take snapshots.
pub struct GpsDevice {
    transport: Box<dyn Transport>,
    fix: GpsFix,
}

impl GpsDevice {
    /// Open a session on a serial device path.
    pub fn open(port: &str, baudrate: u32, timeout: Duration) -> Result<Self> {
        let transport = SerialTransport::open(port, baudrate, timeout)?;
        info!("GPS connected on {} at {} baud", port, baudrate);
        Ok(Self::with_transport(Box::new(transport)))
    }

    /// Build a session over an arbitrary transport. Test harnesses use this
    /// to inject a scripted transport.
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            fix: GpsFix::new(),
        }
    }

    pub fn fix(&self) -> &GpsFix {
        &self.fix
    }

    /// Consistent copy of the current fix for readers.
    pub fn snapshot(&self) -> GpsFix {
        self.fix.clone()
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    pub fn close(&mut self) {
        if self.transport.is_open() {
            self.transport.close();
            debug!("GPS disconnected!");
        }
    }

    /// Consume every sentence currently buffered on the transport.
    ///
    /// The byte budget is taken from `bytes_waiting()` once at entry, so a
    /// receiver that streams faster than we drain cannot pin us in the loop.
    /// Individual bad sentences are logged and skipped; a transport I/O
    /// failure aborts the drain and must be treated as connection loss.
    pub fn drain_available(&mut self) -> std::result::Result<(), SessionError> {
        let budget = self.transport.bytes_waiting().map_err(read_failed)?;
        let mut consumed = 0usize;

        while consumed < budget && self.transport.bytes_waiting().map_err(read_failed)? > 0 {
            let raw = self.transport.read_line().map_err(read_failed)?;
            if raw.is_empty() {
                break;
            }
            consumed += raw.len();

            let line = match std::str::from_utf8(&raw) {
                Ok(text) => text.trim(),
                Err(e) => {
                    error!("Error decoding NMEA: {}", e);
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            // A single malformed sentence never aborts the drain.
            match nmea::apply_sentence(&mut self.fix, line) {
                Ok(true) => debug!("applied sentence: {}", line),
                Ok(false) => debug!("ignored non-GPS sentence: {}", line),
                Err(e) => warn!("dropped sentence: {}", e),
            }
        }
        Ok(())
    }
}

impl Drop for GpsDevice {
    fn drop(&mut self) {
        self.close();
    }
}

fn read_failed(e: io::Error) -> SessionError {
    SessionError::ReadFailed(e.to_string())
}
