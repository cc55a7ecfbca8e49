// src/gps/data.rs
//! GPS fix record and derived predicates

use serde::Serialize;

/// Fix quality reported in GGA sentences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum GpsQuality {
    #[default]
    Invalid,
    GpsFix,
    DgpsFix,
}

impl GpsQuality {
    /// Map the raw GGA quality field. Values beyond DGPS are not part of
    /// this receiver's vocabulary and are rejected by the decoder.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(GpsQuality::Invalid),
            1 => Some(GpsQuality::GpsFix),
            2 => Some(GpsQuality::DgpsFix),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> u8 {
        match self {
            GpsQuality::Invalid => 0,
            GpsQuality::GpsFix => 1,
            GpsQuality::DgpsFix => 2,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GpsQuality::Invalid => "No fix",
            GpsQuality::GpsFix => "GPS",
            GpsQuality::DgpsFix => "DGPS",
        }
    }
}

/// The latest decoded position/status record.
///
/// One live instance exists per device session and is mutated only by the
/// sentence decoder; every other component works on a snapshot (clone).
/// A sentence that supplies only a subset of fields updates only those
/// fields, so the record accumulates state across sentences.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GpsFix {
    /// Decimal degrees, unsigned; hemisphere is carried in `lat_dir`.
    pub latitude: f64,
    /// Decimal degrees, unsigned; hemisphere is carried in `lon_dir`.
    pub longitude: f64,
    /// "N"/"S", or empty before the first position sentence.
    pub lat_dir: String,
    /// "E"/"W", or empty before the first position sentence.
    pub lon_dir: String,
    /// Altitude above mean sea level, meters.
    pub height: f64,
    /// Number of satellites used in the fix.
    pub num_sats: u32,
    pub gps_quality: GpsQuality,
}

impl GpsFix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if GPS has a valid fix.
    pub fn is_valid(&self) -> bool {
        self.gps_quality != GpsQuality::Invalid && self.num_sats > 0
    }

    /// Check if position data is available.
    ///
    /// Known limitation carried over from the device protocol: a true fix at
    /// exactly (0.0, 0.0) is indistinguishable from "no position yet".
    pub fn has_position(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_no_position_and_no_fix() {
        let fix = GpsFix::new();
        assert!(!fix.has_position());
        assert!(!fix.is_valid());
        assert_eq!(fix.gps_quality, GpsQuality::Invalid);
        assert_eq!(fix.lat_dir, "");
    }

    #[test]
    fn test_is_valid_requires_quality_and_sats() {
        let mut fix = GpsFix::new();
        fix.gps_quality = GpsQuality::GpsFix;
        assert!(!fix.is_valid());
        fix.num_sats = 4;
        assert!(fix.is_valid());
        fix.gps_quality = GpsQuality::Invalid;
        assert!(!fix.is_valid());
    }

    #[test]
    fn test_zero_zero_reads_as_absent() {
        let mut fix = GpsFix::new();
        fix.latitude = 0.0;
        fix.longitude = 0.0;
        assert!(!fix.has_position());
        fix.longitude = 11.5167;
        assert!(fix.has_position());
    }

    #[test]
    fn test_quality_from_raw() {
        assert_eq!(GpsQuality::from_raw(0), Some(GpsQuality::Invalid));
        assert_eq!(GpsQuality::from_raw(1), Some(GpsQuality::GpsFix));
        assert_eq!(GpsQuality::from_raw(2), Some(GpsQuality::DgpsFix));
        assert_eq!(GpsQuality::from_raw(3), None);
    }

    #[test]
    fn test_serialize_shape_for_export() {
        let mut fix = GpsFix::new();
        fix.latitude = 48.1173;
        fix.lat_dir = "N".to_string();
        fix.num_sats = 8;
        let json = serde_json::to_value(&fix).unwrap();
        assert_eq!(json["latitude"], 48.1173);
        assert_eq!(json["lat_dir"], "N");
        assert_eq!(json["num_sats"], 8);
    }
}
