//! Frame-level reads and writes over any async byte stream.

use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{DeltaError, Result};
use crate::protocol::decoder::try_decode;
use crate::protocol::encoder::encode_frame;
use crate::protocol::Message;

/// Read exactly one frame, buffering partial data in `buf`
///
/// Bytes are accumulated with `read_buf`, so dropping this future (for example
/// when a read deadline fires) never loses data: the next call resumes from
/// whatever is already buffered.
///
/// # Errors
///
/// - `Read` if the stream fails, or the peer closes between frames
/// - `MalformedFrame` if the peer closes in the middle of a frame, or the
///   header is invalid
/// - `UnknownVariant` if a complete frame carries an unknown discriminant
pub async fn read_frame<R>(reader: &mut R, buf: &mut BytesMut) -> Result<Message>
where
    R: AsyncRead + Unpin,
{
    loop {
        if let Some(message) = try_decode(buf)? {
            return Ok(message);
        }

        let n = reader.read_buf(buf).await.map_err(DeltaError::Read)?;

        if n == 0 {
            if buf.is_empty() {
                return Err(DeltaError::Read(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by peer",
                )));
            }
            return Err(DeltaError::MalformedFrame(format!(
                "connection closed with {} bytes of an incomplete frame",
                buf.len()
            )));
        }
    }
}

/// Encode and write one complete frame, then flush
///
/// # Returns
///
/// * `Result<usize>` - Number of bytes written
///
/// # Errors
///
/// - `MalformedFrame` if the message is too large to frame; nothing is written
/// - `Write` if the stream fails
pub async fn write_frame<W>(writer: &mut W, message: &Message) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(message)?;

    writer.write_all(&frame).await.map_err(DeltaError::Write)?;
    writer.flush().await.map_err(DeltaError::Write)?;

    Ok(frame.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_frame_across_fragmented_reads() {
        let frame = encode_frame(&Message::point(0.01, -0.01, 0.0)).unwrap();
        let mut mock = Builder::new()
            .read(&frame[..3])
            .read(&frame[3..10])
            .read(&frame[10..])
            .build();
        let mut buf = BytesMut::new();

        let message = read_frame(&mut mock, &mut buf).await.unwrap();
        assert_eq!(message, Message::point(0.01, -0.01, 0.0));
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_read_frame_keeps_trailing_bytes() {
        let mut bytes = encode_frame(&Message::Ping).unwrap().to_vec();
        bytes.extend_from_slice(&encode_frame(&Message::Start).unwrap());
        let mut mock = Builder::new().read(&bytes).build();
        let mut buf = BytesMut::new();

        assert_eq!(read_frame(&mut mock, &mut buf).await.unwrap(), Message::Ping);
        assert_eq!(read_frame(&mut mock, &mut buf).await.unwrap(), Message::Start);
    }

    #[tokio::test]
    async fn test_read_frame_eof_between_frames() {
        let mut mock = Builder::new().build();
        let mut buf = BytesMut::new();

        let result = read_frame(&mut mock, &mut buf).await;
        assert!(matches!(result, Err(DeltaError::Read(_))));
    }

    #[tokio::test]
    async fn test_read_frame_eof_mid_frame() {
        // Header promises 25 bytes, only 3 arrive before EOF
        let mut mock = Builder::new().read(&[0, 0, 0, 25, 0x05, 0x00, 0x00]).build();
        let mut buf = BytesMut::new();

        let result = read_frame(&mut mock, &mut buf).await;
        assert!(matches!(result, Err(DeltaError::MalformedFrame(_))));
    }

    #[tokio::test]
    async fn test_read_frame_stream_error() {
        let mut mock = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let mut buf = BytesMut::new();

        let result = read_frame(&mut mock, &mut buf).await;
        assert!(matches!(result, Err(DeltaError::Read(_))));
    }

    #[tokio::test]
    async fn test_write_frame_writes_whole_frame() {
        let expected = encode_frame(&Message::Stop).unwrap();
        let mut mock = Builder::new().write(&expected).build();

        let written = write_frame(&mut mock, &Message::Stop).await.unwrap();
        assert_eq!(written, expected.len());
    }

    #[tokio::test]
    async fn test_write_frame_broken_pipe() {
        let mut mock = Builder::new()
            .write_error(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
            .build();

        let result = write_frame(&mut mock, &Message::Start).await;
        assert!(matches!(result, Err(DeltaError::Write(_))));
    }

    #[tokio::test]
    async fn test_write_frame_oversized_writes_nothing() {
        // No write is scripted, so any byte reaching the mock fails the test
        let mut mock = Builder::new().build();
        let message = Message::Info {
            text: "x".repeat(crate::protocol::message::MAX_PAYLOAD_LEN),
        };

        let result = write_frame(&mut mock, &message).await;
        assert!(matches!(result, Err(DeltaError::MalformedFrame(_))));
    }
}
