//! # Arm Link Module
//!
//! Owns the single TCP session to the delta arm.
//!
//! This module handles:
//! - Dialing the arm with a hard timeout
//! - Configuring keep-alive on the established socket
//! - Sending and receiving length-prefixed command frames
//! - Read deadlines so a silent peer cannot hang the caller
//! - Idempotent teardown, also run on drop

pub mod dial;
pub mod framing;

use bytes::BytesMut;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::config::ArmConfig;
use crate::error::{DeltaError, Result};
use crate::protocol::Message;

/// Dial timeout used by the reference arm setup
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(4);

/// Initial receive buffer capacity
const RX_BUFFER_CAPACITY: usize = 256;

/// Where and how to reach the arm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    /// `host:port` of the arm
    pub address: String,
    /// Upper bound on resolving and connecting
    pub dial_timeout: Duration,
    /// TCP keep-alive probe period
    pub keepalive: Duration,
    /// Deadline for one `receive` call
    pub read_timeout: Duration,
}

impl LinkSettings {
    /// Settings with the reference timing: 4 s dial, keep-alive and read deadline
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            keepalive: DEFAULT_DIAL_TIMEOUT,
            read_timeout: DEFAULT_DIAL_TIMEOUT,
        }
    }
}

impl From<&ArmConfig> for LinkSettings {
    fn from(config: &ArmConfig) -> Self {
        Self {
            address: config.address(),
            dial_timeout: Duration::from_millis(config.dial_timeout_ms),
            keepalive: Duration::from_millis(config.keepalive_ms),
            read_timeout: Duration::from_millis(config.read_timeout_ms),
        }
    }
}

/// Lifecycle of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Never connected
    Idle,
    /// Connected, keep-alive configured, usable
    Open,
    /// Torn down; never reused
    Closed,
}

/// The single connection to the arm
///
/// A `Session` returned by [`Session::connect`] is always fully established.
/// Any write failure, read failure or framing error closes it, after which
/// every I/O call fails with [`DeltaError::SessionClosed`]; a fresh `connect`
/// is needed to resume.
///
/// `send` and `receive` take `&mut self`, so one session can never see two
/// interleaved operations.
pub struct Session {
    stream: Option<TcpStream>,
    state: SessionState,
    peer: Option<SocketAddr>,
    read_timeout: Duration,
    rx: BytesMut,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("peer", &self.peer)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// A session that was never connected
    ///
    /// Useful as a placeholder; every I/O call fails and `close` is a no-op.
    pub fn idle() -> Self {
        Self {
            stream: None,
            state: SessionState::Idle,
            peer: None,
            read_timeout: DEFAULT_DIAL_TIMEOUT,
            rx: BytesMut::new(),
        }
    }

    /// Connect to the arm
    ///
    /// # Errors
    ///
    /// - `Timeout` if the connection is not established within `dial_timeout`
    /// - `Dial` if resolution or the TCP handshake fails
    /// - `Configuration` if keep-alive cannot be enabled; the socket is
    ///   dropped before returning
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use delta_arm::link::{LinkSettings, Session};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let mut session = Session::connect(&LinkSettings::new("192.168.1.10:80")).await?;
    ///     session.close();
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(settings: &LinkSettings) -> Result<Self> {
        let stream = dial::dial(&settings.address, settings.dial_timeout).await?;
        dial::configure(&stream, settings.keepalive)?;

        let peer = stream.peer_addr().ok();
        info!(
            "Connected to arm at {} (keep-alive {:?})",
            settings.address, settings.keepalive
        );

        Ok(Self {
            stream: Some(stream),
            state: SessionState::Open,
            peer,
            read_timeout: settings.read_timeout,
            rx: BytesMut::with_capacity(RX_BUFFER_CAPACITY),
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session can carry traffic
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Remote address, if the session was ever connected
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Send one message as a complete frame
    ///
    /// Not retried on failure: the arm may already have applied part of a
    /// motion command. The session is closed instead.
    ///
    /// # Errors
    ///
    /// - `SessionClosed` if the session is not open
    /// - `MalformedFrame` if the message is too large to frame; nothing is
    ///   sent and the session stays open
    /// - `Write` on short write or broken pipe
    pub async fn send(&mut self, message: &Message) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(DeltaError::SessionClosed)?;

        match framing::write_frame(stream, message).await {
            Ok(written) => {
                debug!("Sent {} frame ({} bytes)", message.kind(), written);
                Ok(())
            }
            Err(e @ DeltaError::MalformedFrame(_)) => {
                warn!("Refusing to send {}: {}", message.kind(), e);
                Err(e)
            }
            Err(e) => {
                warn!("Send of {} failed: {}", message.kind(), e);
                self.close();
                Err(e)
            }
        }
    }

    /// Receive one message, waiting at most the configured read deadline
    ///
    /// On `Timeout` the session stays open and any partially received frame
    /// stays buffered for the next call.
    ///
    /// # Errors
    ///
    /// - `SessionClosed` if the session is not open
    /// - `Timeout` if no complete frame arrives in time
    /// - `Read` / `MalformedFrame` on stream failure; the session is closed
    /// - `UnknownVariant` for a frame with an unknown discriminant; the frame
    ///   is dropped and the session stays usable
    pub async fn receive(&mut self) -> Result<Message> {
        let read_timeout = self.read_timeout;
        let stream = self.stream.as_mut().ok_or(DeltaError::SessionClosed)?;

        let result =
            match tokio::time::timeout(read_timeout, framing::read_frame(stream, &mut self.rx)).await {
                Ok(result) => result,
                Err(_) => return Err(DeltaError::Timeout(read_timeout)),
            };

        match result {
            Ok(message) => {
                debug!("Received {} frame", message.kind());
                Ok(message)
            }
            Err(e @ DeltaError::UnknownVariant(_)) => Err(e),
            Err(e) => {
                warn!("Receive failed: {}", e);
                self.close();
                Err(e)
            }
        }
    }

    /// Tear the session down
    ///
    /// Safe to call any number of times, on an idle session, and from `Drop`.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            match self.peer {
                Some(peer) => info!("Closed session to {}", peer),
                None => info!("Closed session"),
            }
        }
        self.rx.clear();
        self.state = SessionState::Closed;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
