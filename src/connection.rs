// src/connection.rs
//! Connection lifecycle state machine

use std::time::Duration;

use log::{debug, error, info, warn};

use crate::gps::device::GpsDevice;
use crate::status::{StatusKind, StatusSender};

/// Read timeout handed to the serial transport.
pub const SERIAL_READ_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// Transient: a reconnect attempt is in flight. Guards against
    /// re-entrant reconnects, never persisted.
    Reconnecting,
}

/// Owns zero-or-one live device session and the connect/disconnect/reconnect
/// transitions around it.
pub struct ConnectionManager {
    port: String,
    baudrate: u32,
    device: Option<GpsDevice>,
    reconnecting: bool,
    status: StatusSender,
}

impl ConnectionManager {
    pub fn new(port: impl Into<String>, baudrate: u32, status: StatusSender) -> Self {
        Self {
            port: port.into(),
            baudrate,
            device: None,
            reconnecting: false,
            status,
        }
    }

    pub fn state(&self) -> ConnectionState {
        if self.reconnecting {
            ConnectionState::Reconnecting
        } else if self.device.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    pub fn is_reconnecting(&self) -> bool {
        self.reconnecting
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn baudrate(&self) -> u32 {
        self.baudrate
    }

    pub fn device(&self) -> Option<&GpsDevice> {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> Option<&mut GpsDevice> {
        self.device.as_mut()
    }

    /// Install a pre-built session, bypassing `connect()`. Test harnesses
    /// use this for deterministic sessions over scripted transports.
    pub fn inject_device(&mut self, device: GpsDevice) {
        self.device = Some(device);
    }

    /// Try to open a session with the current parameters. Failure is
    /// reported through the status channel and the return value; it never
    /// propagates as an error.
    pub fn connect(&mut self) -> bool {
        match GpsDevice::open(&self.port, self.baudrate, SERIAL_READ_TIMEOUT) {
            Ok(device) => {
                self.device = Some(device);
                info!("GPS connected on {} at {} baud", self.port, self.baudrate);
                self.status
                    .emit(StatusKind::Connected, "GPS connected successfully!");
                true
            }
            Err(e) => {
                error!("Failed to connect to GPS: {}", e);
                self.status
                    .emit(StatusKind::ConnectFailed, format!("GPS connection failed: {}", e));
                self.device = None;
                false
            }
        }
    }

    pub fn disconnect(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.close();
            info!("GPS disconnected");
            self.status.emit(StatusKind::Disconnected, "GPS disconnected");
        }
    }

    /// Tear down any existing session and connect fresh. A no-op returning
    /// `false` while another reconnect is in flight.
    pub fn reconnect(&mut self) -> bool {
        if self.reconnecting {
            debug!("Reconnection already in progress");
            return false;
        }

        self.reconnecting = true;
        self.status
            .emit(StatusKind::Reconnecting, "Attempting to reconnect to GPS...");
        info!("Attempting GPS reconnection...");

        self.disconnect();
        let success = self.connect();
        self.reconnecting = false;

        if success {
            info!("GPS reconnection successful");
            self.status
                .emit(StatusKind::Reconnected, "GPS reconnected successfully!");
        } else {
            warn!("GPS reconnection failed");
            self.status
                .emit(StatusKind::ReconnectFailed, "GPS reconnection failed");
        }
        success
    }

    #[cfg(test)]
    pub(crate) fn set_reconnecting(&mut self, value: bool) {
        self.reconnecting = value;
    }

    /// Apply parameter overrides; changing connection parameters always
    /// forces a fresh connection.
    pub fn update_params(&mut self, port: Option<&str>, baudrate: Option<u32>) -> bool {
        if let Some(port) = port {
            self.port = port.to_string();
        }
        if let Some(baudrate) = baudrate {
            self.baudrate = baudrate;
        }
        info!(
            "Connection parameters updated: {} @ {} baud",
            self.port, self.baudrate
        );
        self.reconnect()
    }
}
