//! Gatekeeper error types
//!
//! Everything that can end a gatekeeper run. A quiet wait window is not an
//! error and never shows up here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    /// Enumeration produced no device matching the naming pattern
    #[error("no serial port found matching '{pattern}'")]
    NoDeviceFound { pattern: String },

    /// Device located but could not be opened (busy, removed, permissions)
    #[error("failed to open serial port {path}: {source}")]
    PortOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Inbound line was not valid UTF-8
    #[error("received line is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    /// Session became unusable
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GateError>;
