// src/error.rs
//! Error types for the GPS link engine

use std::fmt;

pub type Result<T> = std::result::Result<T, GpsError>;

/// A single protocol sentence was rejected. The fix is never modified
/// when this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    Malformed(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed(detail) => write!(f, "malformed sentence: {}", detail),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Transport-level failure during a drain cycle. Callers must treat this
/// as connection loss.
#[derive(Debug)]
pub enum SessionError {
    ReadFailed(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::ReadFailed(detail) => {
                write!(f, "failed to read GPS serial port: {}", detail)
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Export preconditions not met. Reported to the caller, no state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NotConnected,
    NoPosition,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NotConnected => write!(f, "No GPS data available to export."),
            ValidationError::NoPosition => {
                write!(f, "GPS data is not valid or has no position information.")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug)]
pub enum GpsError {
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Json(serde_json::Error),
    Connection(String),
    Decode(DecodeError),
    Session(SessionError),
    Validation(ValidationError),
    Other(String),
}

impl fmt::Display for GpsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpsError::Io(e) => write!(f, "IO error: {}", e),
            GpsError::Serial(e) => write!(f, "Serial error: {}", e),
            GpsError::Json(e) => write!(f, "JSON error: {}", e),
            GpsError::Connection(msg) => write!(f, "Connection error: {}", msg),
            GpsError::Decode(e) => write!(f, "Decode error: {}", e),
            GpsError::Session(e) => write!(f, "Session error: {}", e),
            GpsError::Validation(e) => write!(f, "Validation error: {}", e),
            GpsError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for GpsError {}

impl From<std::io::Error> for GpsError {
    fn from(error: std::io::Error) -> Self {
        GpsError::Io(error)
    }
}

impl From<tokio_serial::Error> for GpsError {
    fn from(error: tokio_serial::Error) -> Self {
        GpsError::Serial(error)
    }
}

impl From<serde_json::Error> for GpsError {
    fn from(error: serde_json::Error) -> Self {
        GpsError::Json(error)
    }
}

impl From<DecodeError> for GpsError {
    fn from(error: DecodeError) -> Self {
        GpsError::Decode(error)
    }
}

impl From<SessionError> for GpsError {
    fn from(error: SessionError) -> Self {
        GpsError::Session(error)
    }
}

impl From<ValidationError> for GpsError {
    fn from(error: ValidationError) -> Self {
        GpsError::Validation(error)
    }
}

impl From<anyhow::Error> for GpsError {
    fn from(error: anyhow::Error) -> Self {
        GpsError::Other(error.to_string())
    }
}
