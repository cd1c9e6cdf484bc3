//! # Error Types
//!
//! Custom error types for PowerShell Pad using `thiserror`.
//!
//! Each boundary gets its own small enum so callers can branch on the
//! outcome; [`PadError`] wraps them for the application layer.

use thiserror::Error;

/// Report decoding errors. Always recoverable: the report is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Report length differs from the fixed protocol length
    #[error("report length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Errors opening the transport behind the virtual device
#[derive(Debug, Error)]
pub enum OpenError {
    /// The transport refused to open I/O
    #[error("transport open failed: {0}")]
    Transport(#[source] std::io::Error),
}

/// Errors registering the virtual input device
#[derive(Debug, Error)]
pub enum RegisterError {
    /// `register` was called on a publisher that is already registered
    #[error("virtual device already registered")]
    AlreadyRegistered,

    /// The input-event backend could not create the device
    #[error("input backend rejected device: {0}")]
    Backend(#[source] std::io::Error),
}

/// Errors binding a physical device to the driver
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Transport could not describe the physical device
    #[error("parse failed: {0}")]
    ParseFailed(#[source] std::io::Error),

    /// Virtual device registration failed
    #[error("failed to register interfaces: {0}")]
    RegisterFailed(#[from] RegisterError),

    /// Transport refused to start report delivery
    #[error("hw start failed: {0}")]
    StartFailed(#[source] std::io::Error),

    /// Identity is not in the driver's id table
    #[error("unsupported device {vendor_id:04x}:{product_id:04x}")]
    Unsupported { vendor_id: u16, product_id: u16 },

    /// A device is already bound
    #[error("driver already bound")]
    AlreadyBound,
}

/// Main error type for PowerShell Pad
#[derive(Debug, Error)]
pub enum PadError {
    /// Report protocol errors
    #[error("protocol error: {0}")]
    Decode(#[from] DecodeError),

    /// Probe/bind errors
    #[error("probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Transport open errors
    #[error("open error: {0}")]
    Open(#[from] OpenError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for PowerShell Pad
pub type Result<T> = std::result::Result<T, PadError>;
