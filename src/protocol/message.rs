//! # Arm Protocol Constants and Types
//!
//! Core definitions for the delta arm command link.
//!
//! ## Frame Layout
//!
//! ```text
//! +----------------+------+----------------------+
//! | length (u32 BE)| tag  | body (variant-sized) |
//! +----------------+------+----------------------+
//!                  |<------- length bytes ------>|
//! ```

/// Size of the frame length header in bytes
pub const FRAME_HEADER_LEN: usize = 4;

/// Largest payload accepted on the wire (64 KiB)
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024;

/// Payload discriminant for [`Message::Ping`]
pub const TAG_PING: u8 = 0x01;

/// Payload discriminant for [`Message::Start`]
pub const TAG_START: u8 = 0x02;

/// Payload discriminant for [`Message::Stop`]
pub const TAG_STOP: u8 = 0x03;

/// Payload discriminant for [`Message::Get`]
pub const TAG_GET: u8 = 0x04;

/// Payload discriminant for [`Message::Point`]
pub const TAG_POINT: u8 = 0x05;

/// Payload discriminant for [`Message::Info`]
pub const TAG_INFO: u8 = 0x06;

/// Point body size: three big-endian f64 coordinates
pub const POINT_BODY_LEN: usize = 3 * 8;

/// A single command exchanged with the arm
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Liveness probe, echoed back by the arm
    Ping,

    /// Arm starts accepting motor positioning commands
    Start,

    /// Arm ignores motor positioning commands
    Stop,

    /// Request motor data
    Get,

    /// Move the effector to the given target (meters)
    Point { x: f64, y: f64, z: f64 },

    /// Free-form text
    Info { text: String },
}

impl Message {
    /// Build a point message from a coordinate triple
    pub fn point(x: f64, y: f64, z: f64) -> Self {
        Message::Point { x, y, z }
    }

    /// Wire discriminant of this message
    pub fn tag(&self) -> u8 {
        match self {
            Message::Ping => TAG_PING,
            Message::Start => TAG_START,
            Message::Stop => TAG_STOP,
            Message::Get => TAG_GET,
            Message::Point { .. } => TAG_POINT,
            Message::Info { .. } => TAG_INFO,
        }
    }

    /// Variant name, used in logs and protocol errors
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Ping => "PING",
            Message::Start => "START",
            Message::Stop => "STOP",
            Message::Get => "GET",
            Message::Point { .. } => "POINT",
            Message::Info { .. } => "INFO",
        }
    }
}
