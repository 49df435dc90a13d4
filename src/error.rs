//! # Error Types
//!
//! Custom error types for the delta arm client using `thiserror`.

use std::time::Duration;

use thiserror::Error;

/// Main error type for the delta arm client
#[derive(Debug, Error)]
pub enum DeltaError {
    /// The connection attempt to the arm failed outright
    #[error("Dial error: {0}")]
    Dial(String),

    /// An operation did not complete before its deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Socket options could not be applied to a fresh connection
    #[error("Session configuration error: {0}")]
    Configuration(String),

    /// Writing a frame to the arm failed
    #[error("Write error: {0}")]
    Write(#[source] std::io::Error),

    /// Reading from the arm failed or the peer hung up
    #[error("Read error: {0}")]
    Read(#[source] std::io::Error),

    /// Length header inconsistent with the frame, or body inconsistent with its variant
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Payload discriminant outside the known message set
    #[error("Unknown message variant: 0x{0:02X}")]
    UnknownVariant(u8),

    /// The arm answered with an unexpected message
    #[error("Protocol error: expected {expected}, received {received}")]
    Protocol {
        expected: &'static str,
        received: &'static str,
    },

    /// I/O attempted on a session that is idle or already closed
    #[error("Session is not open")]
    SessionClosed,

    /// No controller with the expected vendor/product pair is attached
    #[error("Controller 0x{vendor:04x}:0x{product:04x} not found")]
    DeviceNotFound { vendor: u16, product: u16 },

    /// More than one matching controller is attached
    #[error("Found {0} matching controllers, want exactly 1")]
    AmbiguousDevice(usize),

    /// HID layer errors
    #[error("HID error: {0}")]
    Hid(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hidapi::HidError> for DeltaError {
    fn from(err: hidapi::HidError) -> Self {
        DeltaError::Hid(err.to_string())
    }
}

/// Result type alias for the delta arm client
pub type Result<T> = std::result::Result<T, DeltaError>;
