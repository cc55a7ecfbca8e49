// src/gps/mod.rs
//! GPS data handling: fix record, NMEA decoding, device session

pub mod data;
pub mod device;
pub mod nmea;

pub use data::{GpsFix, GpsQuality};
pub use device::GpsDevice;
