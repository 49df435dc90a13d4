//! # Arm Frame Encoder
//!
//! Serializes [`Message`] values into length-prefixed frames.

use bytes::{BufMut, Bytes, BytesMut};

use super::message::*;
use crate::error::{DeltaError, Result};

/// Encode a message into a complete frame
///
/// # Arguments
///
/// * `message` - Message to serialize
///
/// # Returns
///
/// * `Result<Bytes>` - Length header (u32 big-endian) followed by the payload
///
/// # Errors
///
/// Returns `MalformedFrame` if the payload would exceed [`MAX_PAYLOAD_LEN`],
/// the largest frame the decoder accepts
///
/// # Examples
///
/// ```
/// use delta_arm::protocol::encoder::encode_frame;
/// use delta_arm::protocol::Message;
///
/// let frame = encode_frame(&Message::Ping)?;
/// assert_eq!(&frame[..], &[0x00, 0x00, 0x00, 0x01, 0x01]);
/// # Ok::<(), delta_arm::error::DeltaError>(())
/// ```
pub fn encode_frame(message: &Message) -> Result<Bytes> {
    let payload = encode_payload(message)?;

    // MAX_PAYLOAD_LEN fits in the u32 header
    let mut frame = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.put_u32(payload.len() as u32);
    frame.extend_from_slice(&payload);

    Ok(frame.freeze())
}

/// Encode a message into its payload (discriminant + body)
///
/// # Layout
///
/// ```text
/// Ping/Start/Stop/Get: [tag]
/// Point:               [tag][x: f64 BE][y: f64 BE][z: f64 BE]
/// Info:                [tag][UTF-8 text...]
/// ```
///
/// # Errors
///
/// Returns `MalformedFrame` if tag and body exceed [`MAX_PAYLOAD_LEN`]
pub fn encode_payload(message: &Message) -> Result<Bytes> {
    let payload_len = 1 + body_len(message);
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(DeltaError::MalformedFrame(format!(
            "{} payload is {} bytes, maximum {}",
            message.kind(),
            payload_len,
            MAX_PAYLOAD_LEN
        )));
    }

    let mut payload = BytesMut::with_capacity(payload_len);
    payload.put_u8(message.tag());

    match message {
        Message::Ping | Message::Start | Message::Stop | Message::Get => {}
        Message::Point { x, y, z } => {
            payload.put_f64(*x);
            payload.put_f64(*y);
            payload.put_f64(*z);
        }
        Message::Info { text } => payload.extend_from_slice(text.as_bytes()),
    }

    Ok(payload.freeze())
}

fn body_len(message: &Message) -> usize {
    match message {
        Message::Point { .. } => POINT_BODY_LEN,
        Message::Info { text } => text.len(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_type_messages() {
        for (message, tag) in [
            (Message::Ping, TAG_PING),
            (Message::Start, TAG_START),
            (Message::Stop, TAG_STOP),
            (Message::Get, TAG_GET),
        ] {
            let frame = encode_frame(&message).unwrap();
            assert_eq!(&frame[..], &[0, 0, 0, 1, tag]);
        }
    }

    #[test]
    fn test_encode_point_layout() {
        let frame = encode_frame(&Message::point(1.0, -2.0, 0.5)).unwrap();

        // Header + tag + 24 byte body
        assert_eq!(frame.len(), FRAME_HEADER_LEN + 1 + POINT_BODY_LEN);
        assert_eq!(&frame[..4], &[0, 0, 0, 25]);
        assert_eq!(frame[4], TAG_POINT);
        assert_eq!(&frame[5..13], &1.0f64.to_be_bytes());
        assert_eq!(&frame[13..21], &(-2.0f64).to_be_bytes());
        assert_eq!(&frame[21..29], &0.5f64.to_be_bytes());
    }

    #[test]
    fn test_encode_info_layout() {
        let payload = encode_payload(&Message::Info {
            text: "Hello, world!".to_string(),
        })
        .unwrap();

        assert_eq!(payload[0], TAG_INFO);
        assert_eq!(&payload[1..], b"Hello, world!");
    }

    #[test]
    fn test_encode_empty_info() {
        let frame = encode_frame(&Message::Info { text: String::new() }).unwrap();
        assert_eq!(&frame[..], &[0, 0, 0, 1, TAG_INFO]);
    }

    #[test]
    fn test_header_matches_payload_length() {
        let message = Message::Info {
            text: "x".repeat(300),
        };
        let frame = encode_frame(&message).unwrap();
        let declared = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(declared, frame.len() - FRAME_HEADER_LEN);
        assert_eq!(declared, 301);
    }

    #[test]
    fn test_info_at_payload_limit() {
        // Tag byte plus text fills the payload exactly
        let message = Message::Info {
            text: "x".repeat(MAX_PAYLOAD_LEN - 1),
        };
        let frame = encode_frame(&message).unwrap();
        assert_eq!(frame.len(), FRAME_HEADER_LEN + MAX_PAYLOAD_LEN);
    }

    #[test]
    fn test_info_over_payload_limit() {
        let message = Message::Info {
            text: "x".repeat(MAX_PAYLOAD_LEN),
        };

        assert!(matches!(
            encode_payload(&message),
            Err(DeltaError::MalformedFrame(_))
        ));
        assert!(matches!(
            encode_frame(&message),
            Err(DeltaError::MalformedFrame(_))
        ));
    }
}
