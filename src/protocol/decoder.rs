//! # Arm Frame Decoder
//!
//! Parses length-prefixed frames back into [`Message`] values.

use bytes::{Buf, BytesMut};

use super::message::*;
use crate::error::{DeltaError, Result};

/// Decode one complete frame from the front of `frame`
///
/// # Arguments
///
/// * `frame` - Bytes starting at a length header
///
/// # Returns
///
/// * `Result<(Message, usize)>` - Decoded message and the number of bytes consumed
///
/// # Errors
///
/// Returns error if:
/// - Fewer than 4 bytes are available for the header
/// - The declared length exceeds [`MAX_PAYLOAD_LEN`] or the bytes available
/// - The payload is invalid (see [`decode_payload`])
pub fn decode_frame(frame: &[u8]) -> Result<(Message, usize)> {
    if frame.len() < FRAME_HEADER_LEN {
        return Err(DeltaError::MalformedFrame(format!(
            "Frame too short: {} bytes, header needs {}",
            frame.len(),
            FRAME_HEADER_LEN
        )));
    }

    let length = declared_length(frame)?;

    if frame.len() < FRAME_HEADER_LEN + length {
        return Err(DeltaError::MalformedFrame(format!(
            "Header declares {} payload bytes, only {} available",
            length,
            frame.len() - FRAME_HEADER_LEN
        )));
    }

    let end = FRAME_HEADER_LEN + length;
    let message = decode_payload(&frame[FRAME_HEADER_LEN..end])?;

    Ok((message, end))
}

/// Decode a frame from a stream buffer, if a complete one is buffered
///
/// Returns `Ok(None)` while the header or payload is still incomplete. On
/// success the frame's bytes are consumed from `buf`. A frame with an unknown
/// discriminant is consumed as well, so the buffer stays aligned on the next
/// frame boundary.
pub fn try_decode(buf: &mut BytesMut) -> Result<Option<Message>> {
    if buf.len() < FRAME_HEADER_LEN {
        return Ok(None);
    }

    let length = declared_length(buf)?;

    if buf.len() < FRAME_HEADER_LEN + length {
        buf.reserve(FRAME_HEADER_LEN + length - buf.len());
        return Ok(None);
    }

    buf.advance(FRAME_HEADER_LEN);
    let payload = buf.split_to(length);

    decode_payload(&payload).map(Some)
}

/// Decode a payload (discriminant + body)
///
/// # Errors
///
/// - `MalformedFrame` if the payload is empty, the body size does not match
///   the variant, or `Info` text is not UTF-8
/// - `UnknownVariant` if the discriminant is not one of the known tags
pub fn decode_payload(payload: &[u8]) -> Result<Message> {
    let (&tag, body) = payload
        .split_first()
        .ok_or_else(|| DeltaError::MalformedFrame("Empty payload".to_string()))?;

    match tag {
        TAG_PING => expect_empty(body, Message::Ping),
        TAG_START => expect_empty(body, Message::Start),
        TAG_STOP => expect_empty(body, Message::Stop),
        TAG_GET => expect_empty(body, Message::Get),
        TAG_POINT => {
            if body.len() != POINT_BODY_LEN {
                return Err(DeltaError::MalformedFrame(format!(
                    "Point body is {} bytes, expected {}",
                    body.len(),
                    POINT_BODY_LEN
                )));
            }
            let mut body = body;
            Ok(Message::Point {
                x: body.get_f64(),
                y: body.get_f64(),
                z: body.get_f64(),
            })
        }
        TAG_INFO => {
            let text = std::str::from_utf8(body)
                .map_err(|e| DeltaError::MalformedFrame(format!("Info text is not UTF-8: {}", e)))?;
            Ok(Message::Info {
                text: text.to_string(),
            })
        }
        other => Err(DeltaError::UnknownVariant(other)),
    }
}

fn declared_length(frame: &[u8]) -> Result<usize> {
    let length = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;

    if length > MAX_PAYLOAD_LEN {
        return Err(DeltaError::MalformedFrame(format!(
            "Declared length {} exceeds maximum {}",
            length, MAX_PAYLOAD_LEN
        )));
    }

    Ok(length)
}

fn expect_empty(body: &[u8], message: Message) -> Result<Message> {
    if !body.is_empty() {
        return Err(DeltaError::MalformedFrame(format!(
            "{} carries {} unexpected body bytes",
            message.kind(),
            body.len()
        )));
    }
    Ok(message)
}
