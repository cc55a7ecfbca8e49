// src/controller.rs
//! Data controller: orchestration between connection manager and readers

use log::error;

use crate::connection::ConnectionManager;
use crate::error::ValidationError;
use crate::gps::data::{GpsFix, GpsQuality};
use crate::status::{StatusKind, StatusSender};

/// Position fields of the current fix, as a detached copy.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionInfo {
    pub latitude: f64,
    pub longitude: f64,
    pub lat_dir: String,
    pub lon_dir: String,
    pub height: f64,
}

/// Satellite fields of the current fix, as a detached copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SatelliteInfo {
    pub num_sats: u32,
    pub gps_quality: GpsQuality,
}

/// Thin facade over the connection manager: runs read cycles, captures the
/// last error, and exposes snapshot queries. Holds no state beyond
/// `last_error`.
pub struct DataController {
    connection: ConnectionManager,
    last_error: Option<String>,
    status: StatusSender,
}

impl DataController {
    pub fn new(connection: ConnectionManager, status: StatusSender) -> Self {
        Self {
            connection,
            last_error: None,
            status,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn is_reconnecting(&self) -> bool {
        self.connection.is_reconnecting()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connection
    }

    /// Snapshot of the current fix, or `None` when disconnected.
    pub fn current_data(&self) -> Option<GpsFix> {
        self.connection.device().map(|device| device.snapshot())
    }

    pub fn position_info(&self) -> Option<PositionInfo> {
        self.connection.device().map(|device| {
            let fix = device.fix();
            PositionInfo {
                latitude: fix.latitude,
                longitude: fix.longitude,
                lat_dir: fix.lat_dir.clone(),
                lon_dir: fix.lon_dir.clone(),
                height: fix.height,
            }
        })
    }

    pub fn satellite_info(&self) -> Option<SatelliteInfo> {
        self.connection.device().map(|device| {
            let fix = device.fix();
            SatelliteInfo {
                num_sats: fix.num_sats,
                gps_quality: fix.gps_quality,
            }
        })
    }

    /// Run one read cycle: drain everything the device has buffered.
    ///
    /// A session read failure is treated as connection loss, not merely
    /// reported: the manager disconnects so the scheduler's reconnect path
    /// becomes the single recovery mechanism.
    pub fn update_gps_data(&mut self) -> bool {
        self.last_error = None;

        let result = match self.connection.device_mut() {
            Some(device) => device.drain_available(),
            None => {
                self.last_error = Some("The GPS Module is not connected.".to_string());
                return false;
            }
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                let message = format!("GPS Error: {}", e);
                error!("GPS read error: {}", e);
                self.status.emit(StatusKind::ReadError, message.clone());
                self.last_error = Some(message);
                self.connection.disconnect();
                false
            }
        }
    }

    /// User-initiated refresh, bypassing the scheduler: read when connected,
    /// reconnect immediately when not.
    pub fn manual_refresh(&mut self) -> bool {
        if self.connection.is_connected() {
            self.status
                .emit(StatusKind::Refreshing, "Refreshing GPS data...");
            self.update_gps_data()
        } else {
            self.status.emit(
                StatusKind::Reconnecting,
                "GPS not connected. Attempting reconnection...",
            );
            self.connection.reconnect()
        }
    }

    /// Check that a usable position exists before handing data to the
    /// exporter. No state change either way.
    pub fn validate_export_data(&self) -> Result<(), ValidationError> {
        match self.connection.device() {
            None => Err(ValidationError::NotConnected),
            Some(device) if !device.fix().has_position() => Err(ValidationError::NoPosition),
            Some(_) => Ok(()),
        }
    }
}
