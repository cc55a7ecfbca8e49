// src/gps/nmea.rs
//! NMEA sentence decoding
//!
//! Accepts `$GP`-talker GGA and RMC sentences and applies their fields to a
//! [`GpsFix`]. A sentence either validates completely and is applied, or the
//! fix is left untouched.

use log::trace;

use super::data::{GpsFix, GpsQuality};
use crate::error::DecodeError;

/// Talker prefix accepted by this decoder. Sentences from other
/// constellations (`$GL`, `$GA`, ...) are filtered out, not decoded.
pub const GPS_TALKER_PREFIX: &str = "$GP";

/// Decode one sentence and apply its fields to `fix`.
///
/// Returns `Ok(false)` when the sentence is empty or carries a foreign
/// talker id, `Ok(true)` when it validated (GGA/RMC mutate the fix; other
/// `$GP` sentence types validate as no-ops). A checksum mismatch, wrong
/// field count or unparsable numeric field yields `Err` with the fix
/// unchanged.
pub fn apply_sentence(fix: &mut GpsFix, sentence: &str) -> Result<bool, DecodeError> {
    if sentence.is_empty() || !sentence.starts_with(GPS_TALKER_PREFIX) {
        return Ok(false);
    }

    trace!("NMEA: {}", sentence);
    let payload = validate_checksum(sentence)?;
    let parts: Vec<&str> = payload.split(',').collect();

    // parts[0] is e.g. "GPGGA"; dispatch on the sentence type suffix.
    let mut staged = fix.clone();
    match &parts[0][2..] {
        "GGA" => parse_gga(&mut staged, &parts)?,
        "RMC" => parse_rmc(&mut staged, &parts)?,
        // Valid sentence of a type we extract nothing from.
        _ => return Ok(true),
    }

    *fix = staged;
    Ok(true)
}

/// Verify the trailing `*HH` XOR checksum and return the payload between
/// `$` and `*`.
fn validate_checksum(sentence: &str) -> Result<&str, DecodeError> {
    let body = &sentence[1..];
    let (payload, given) = body
        .split_once('*')
        .ok_or_else(|| DecodeError::Malformed("missing checksum".to_string()))?;

    let given = u8::from_str_radix(given.trim(), 16)
        .map_err(|_| DecodeError::Malformed(format!("bad checksum field: {:?}", given)))?;
    let computed = payload.bytes().fold(0u8, |acc, b| acc ^ b);

    if computed != given {
        return Err(DecodeError::Malformed(format!(
            "checksum mismatch: computed {:02X}, sentence says {:02X}",
            computed, given
        )));
    }
    Ok(payload)
}

/// GGA: position, altitude, satellite count and fix quality.
fn parse_gga(fix: &mut GpsFix, parts: &[&str]) -> Result<(), DecodeError> {
    if parts.len() < 15 {
        return Err(DecodeError::Malformed(format!(
            "GGA field count {} (want 15)",
            parts.len()
        )));
    }

    apply_position(fix, parts[2], parts[3], parts[4], parts[5])?;

    let raw_quality = parse_field::<u8>(parts[6], "fix quality")?;
    fix.gps_quality = GpsQuality::from_raw(raw_quality)
        .ok_or_else(|| DecodeError::Malformed(format!("unknown fix quality {}", raw_quality)))?;
    fix.num_sats = parse_field::<u32>(parts[7], "satellite count")?;

    // Altitude is optional; an empty field leaves the previous height.
    if !parts[9].is_empty() {
        fix.height = parse_field::<f64>(parts[9], "altitude")?;
    }
    Ok(())
}

/// RMC: recommended minimum, position fields only.
fn parse_rmc(fix: &mut GpsFix, parts: &[&str]) -> Result<(), DecodeError> {
    if parts.len() < 12 {
        return Err(DecodeError::Malformed(format!(
            "RMC field count {} (want 12)",
            parts.len()
        )));
    }
    apply_position(fix, parts[3], parts[4], parts[5], parts[6])
}

/// Latitude/longitude come as a pair and are written together. Empty
/// coordinate fields decode as 0.0 with the direction taken as-is, matching
/// the receiver's own no-fix output.
fn apply_position(
    fix: &mut GpsFix,
    lat: &str,
    lat_dir: &str,
    lon: &str,
    lon_dir: &str,
) -> Result<(), DecodeError> {
    fix.latitude = if lat.is_empty() {
        0.0
    } else {
        ddmm_to_degrees(parse_field::<f64>(lat, "latitude")?)
    };
    fix.longitude = if lon.is_empty() {
        0.0
    } else {
        ddmm_to_degrees(parse_field::<f64>(lon, "longitude")?)
    };
    fix.lat_dir = lat_dir.to_string();
    fix.lon_dir = lon_dir.to_string();
    Ok(())
}

/// Convert the wire encoding DDMM.MMMM (DDDMM.MMMM for longitude) to
/// decimal degrees. The value stays unsigned; hemisphere is tracked in the
/// direction fields.
fn ddmm_to_degrees(value: f64) -> f64 {
    let degrees = (value / 100.0).trunc();
    let minutes = value - degrees * 100.0;
    degrees + minutes / 60.0
}

fn parse_field<T: std::str::FromStr>(field: &str, name: &str) -> Result<T, DecodeError> {
    field
        .parse::<T>()
        .map_err(|_| DecodeError::Malformed(format!("unparsable {} field: {:?}", name, field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,47.0,M,,*4F";
    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

    #[test]
    fn test_gga_extracts_all_fields() {
        let mut fix = GpsFix::new();
        assert_eq!(apply_sentence(&mut fix, GGA), Ok(true));

        assert!((fix.latitude - 48.1173).abs() < 1e-4);
        assert!((fix.longitude - 11.5167).abs() < 1e-4);
        assert_eq!(fix.lat_dir, "N");
        assert_eq!(fix.lon_dir, "E");
        assert_eq!(fix.num_sats, 8);
        assert_eq!(fix.gps_quality, GpsQuality::GpsFix);
        assert!((fix.height - 545.4).abs() < 1e-9);
        assert!(fix.is_valid());
    }

    #[test]
    fn test_rmc_updates_position_only() {
        let mut fix = GpsFix::new();
        fix.height = 120.0;
        fix.num_sats = 5;
        fix.gps_quality = GpsQuality::DgpsFix;

        let rmc = "$GPRMC,123519,A,5533.000,S,03736.000,W,022.4,084.4,230394,003.1,W*66";
        assert_eq!(apply_sentence(&mut fix, rmc), Ok(true));

        assert!((fix.latitude - 55.55).abs() < 1e-6);
        assert!((fix.longitude - 37.6).abs() < 1e-6);
        assert_eq!(fix.lat_dir, "S");
        assert_eq!(fix.lon_dir, "W");
        // Non-position fields retain their previous values.
        assert_eq!(fix.num_sats, 5);
        assert_eq!(fix.gps_quality, GpsQuality::DgpsFix);
        assert!((fix.height - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_sentence_is_filtered() {
        let mut fix = GpsFix::new();
        assert_eq!(apply_sentence(&mut fix, ""), Ok(false));
        assert_eq!(fix, GpsFix::new());
    }

    #[test]
    fn test_foreign_talker_is_filtered() {
        let mut fix = GpsFix::new();
        let glonass = "$GLGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M*47";
        assert_eq!(apply_sentence(&mut fix, glonass), Ok(false));
        assert_eq!(fix, GpsFix::new());
    }

    #[test]
    fn test_checksum_mismatch_leaves_fix_untouched() {
        let mut fix = GpsFix::new();
        apply_sentence(&mut fix, GGA).unwrap();
        let before = fix.clone();

        let corrupted = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,47.0,M,,*00";
        assert!(apply_sentence(&mut fix, corrupted).is_err());
        assert_eq!(fix, before);
    }

    #[test]
    fn test_missing_checksum_is_malformed() {
        let mut fix = GpsFix::new();
        let result = apply_sentence(&mut fix, "$GPGGA,123519,4807.038,N");
        assert!(result.is_err());
        assert_eq!(fix, GpsFix::new());
    }

    #[test]
    fn test_bad_numeric_field_rolls_back_everything() {
        let mut fix = GpsFix::new();
        // Checksum is valid but the satellite count is garbage; the already
        // staged position must not leak into the fix.
        let bad = "$GPGGA,123519,4807.038,N,01131.000,E,1,XX,0.9,545.4,M,47.0,M,,*47";
        assert!(apply_sentence(&mut fix, bad).is_err());
        assert_eq!(fix, GpsFix::new());
    }

    #[test]
    fn test_quality_out_of_range_is_malformed() {
        let mut fix = GpsFix::new();
        let bad = "$GPGGA,123519,4807.038,N,01131.000,E,9,08,0.9,545.4,M,47.0,M,,*47";
        assert!(apply_sentence(&mut fix, bad).is_err());
        assert_eq!(fix, GpsFix::new());
    }

    #[test]
    fn test_no_fix_gga_clears_position() {
        let mut fix = GpsFix::new();
        apply_sentence(&mut fix, GGA).unwrap();
        assert!(fix.has_position());

        let no_fix = "$GPGGA,123519,,,,,0,00,,,M,,M,,*6B";
        assert_eq!(apply_sentence(&mut fix, no_fix), Ok(true));
        assert!(!fix.has_position());
        assert_eq!(fix.gps_quality, GpsQuality::Invalid);
        // Empty altitude field keeps the previous height.
        assert!((fix.height - 545.4).abs() < 1e-9);
    }

    #[test]
    fn test_empty_altitude_keeps_height() {
        let mut fix = GpsFix::new();
        fix.height = 99.0;
        let gga = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,,M,47.0,M,,*61";
        assert_eq!(apply_sentence(&mut fix, gga), Ok(true));
        assert!((fix.height - 99.0).abs() < 1e-9);
        assert_eq!(fix.num_sats, 8);
    }

    #[test]
    fn test_other_gps_sentence_type_is_a_valid_noop() {
        let mut fix = GpsFix::new();
        let gsv = "$GPGSV,3,1,12,01,40,083,46,02,17,308,41,12,07,344,39,14,22,228,45*7F";
        assert_eq!(apply_sentence(&mut fix, gsv), Ok(true));
        assert_eq!(fix, GpsFix::new());
    }

    #[test]
    fn test_invalid_quality_zero_gives_invalid_fix() {
        let mut fix = GpsFix::new();
        let gga = "$GPGGA,123519,4807.038,N,01131.000,E,0,00,0.9,545.4,M,47.0,M,,*46";
        apply_sentence(&mut fix, gga).unwrap();
        assert!(!fix.is_valid());
    }

    #[test]
    fn test_rmc_then_gga_accumulates() {
        let mut fix = GpsFix::new();
        apply_sentence(&mut fix, RMC).unwrap();
        assert!(fix.has_position());
        assert!(!fix.is_valid());

        apply_sentence(&mut fix, GGA).unwrap();
        assert!(fix.is_valid());
    }

    #[test]
    fn test_ddmm_conversion() {
        assert!((ddmm_to_degrees(4807.038) - 48.1173).abs() < 1e-6);
        assert!((ddmm_to_degrees(1131.000) - 11.516_666_6).abs() < 1e-6);
        assert!((ddmm_to_degrees(0.0)).abs() < 1e-12);
    }
}
