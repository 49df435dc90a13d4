//! # Arm Protocol Module
//!
//! Command vocabulary and wire encoding for the delta arm link.
//!
//! This module handles:
//! - The closed set of command messages (ping, start, stop, get, point, info)
//! - Payload serialization with a one-byte discriminant
//! - Length-prefixed framing for stream sockets
//! - Frame validation (length header, variant, body size)

pub mod message;
pub mod encoder;
pub mod decoder;

pub use message::Message;
