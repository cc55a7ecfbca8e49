// src/lib.rs
//! GPS Link Library
//!
//! Acquires positioning data from a serial GPS receiver, decodes NMEA
//! sentences into a queryable fix snapshot, and keeps the connection alive
//! through timer-driven polling and reconnection.

pub mod config;
pub mod connection;
pub mod controller;
pub mod error;
pub mod gps;
pub mod monitor;
pub mod scheduler;
pub mod stats;
pub mod status;
pub mod transport;

// Re-export main types for convenience
pub use config::Settings;
pub use connection::{ConnectionManager, ConnectionState};
pub use controller::{DataController, PositionInfo, SatelliteInfo};
pub use error::{DecodeError, GpsError, Result, SessionError, ValidationError};
pub use gps::{GpsDevice, GpsFix, GpsQuality};
pub use monitor::GpsMonitor;
pub use scheduler::UpdateScheduler;
pub use stats::{FieldStats, GpsStatistics};
pub use status::{StatusEvent, StatusKind};
