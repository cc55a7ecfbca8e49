// src/config.rs
//! Settings persistence and environment overrides

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GpsError, Result};

pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUDRATE: u32 = 9600;
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 100;
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 5000;

/// Connection and polling parameters, applied as one transaction via
/// [`crate::monitor::GpsMonitor::apply_settings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub port: String,
    pub baudrate: u32,
    pub update_interval_ms: u64,
    pub reconnect_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
        }
    }
}

impl Settings {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Overlay values from `GPS_LINK_*` environment variables. Unset or
    /// unparsable variables leave the current value.
    pub fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("GPS_LINK_PORT") {
            self.port = port;
        }
        if let Some(baudrate) = env_parse("GPS_LINK_BAUDRATE") {
            self.baudrate = baudrate;
        }
        if let Some(interval) = env_parse("GPS_LINK_UPDATE_INTERVAL_MS") {
            self.update_interval_ms = interval;
        }
        if let Some(interval) = env_parse("GPS_LINK_RECONNECT_INTERVAL_MS") {
            self.reconnect_interval_ms = interval;
        }
    }

    /// Load from the config file, falling back to defaults when it does not
    /// exist yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| GpsError::Other(format!("Failed to read config file: {}", e)))?;
        let settings: Self = serde_json::from_str(&contents)
            .map_err(|e| GpsError::Other(format!("Failed to parse config file: {}", e)))?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GpsError::Other(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| GpsError::Other(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, contents)
            .map_err(|e| GpsError::Other(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| GpsError::Other("HOME environment variable not set".to_string()))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("gps-link")
            .join("config.json"))
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.baudrate, 9600);
        assert_eq!(settings.update_interval(), Duration::from_millis(100));
        assert_eq!(settings.reconnect_interval(), Duration::from_millis(5000));
    }

    #[test]
    fn test_roundtrip_through_json() {
        let settings = Settings {
            port: "/dev/ttyACM3".to_string(),
            baudrate: 115_200,
            update_interval_ms: 250,
            reconnect_interval_ms: 10_000,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
