//! # Arm Command Module
//!
//! High-level commands for the delta arm, one per message type.
//!
//! Only `ping` waits for an answer; every other command is fire-and-forget,
//! matching the arm's one-way acknowledgment model.

mod listener;

pub use listener::Listener;

use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{DeltaError, Result};
use crate::link::{LinkSettings, Session};
use crate::protocol::Message;

/// Radius of the demo circle, matching the arm's reachable envelope (meters)
pub const CIRCLE_RADIUS: f64 = 0.04;

/// Time spent tracing the demo circle: 4π seconds, two revolutions
pub const CIRCLE_DURATION: Duration = Duration::from_millis(12_566);

/// Delay between consecutive circle points
pub const CIRCLE_STEP: Duration = Duration::from_millis(3);

/// Command client for the delta arm
///
/// Owns the [`Session`]; dropping the client closes the connection.
///
/// # Examples
///
/// ```no_run
/// use delta_arm::arm::ArmClient;
/// use delta_arm::link::LinkSettings;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut arm = ArmClient::connect(&LinkSettings::new("192.168.1.10:80")).await?;
///     let rtt = arm.ping().await?;
///     println!("pong [{:?}]", rtt);
///     arm.start().await?;
///     arm.move_to(0.02, 0.02, 0.0).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct ArmClient {
    session: Session,
}

impl ArmClient {
    /// Connect to the arm and wrap the session
    pub async fn connect(settings: &LinkSettings) -> Result<Self> {
        Ok(Self::from_session(Session::connect(settings).await?))
    }

    /// Wrap an already established session
    pub fn from_session(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send a `Ping` and wait for the echo
    ///
    /// # Returns
    ///
    /// * `Result<Duration>` - Round-trip time
    ///
    /// # Errors
    ///
    /// - `Protocol` if the arm answers with anything other than `Ping`
    /// - Any send/receive error from the session
    pub async fn ping(&mut self) -> Result<Duration> {
        let started = Instant::now();

        self.session.send(&Message::Ping).await?;
        let response = self.session.receive().await?;
        let elapsed = started.elapsed();

        if response != Message::Ping {
            return Err(DeltaError::Protocol {
                expected: Message::Ping.kind(),
                received: response.kind(),
            });
        }

        info!("pong [{:?}]", elapsed);
        Ok(elapsed)
    }

    /// Allow motor positioning commands
    pub async fn start(&mut self) -> Result<()> {
        self.session.send(&Message::Start).await
    }

    /// Ignore motor positioning commands
    pub async fn stop(&mut self) -> Result<()> {
        self.session.send(&Message::Stop).await
    }

    /// Request motor data; the reply, if any, arrives through [`ArmClient::listen`]
    pub async fn get_status(&mut self) -> Result<()> {
        self.session.send(&Message::Get).await
    }

    /// Move the effector to `(x, y, z)`
    ///
    /// Coordinates are forwarded as given; callers keep them inside the
    /// arm's envelope.
    pub async fn move_to(&mut self, x: f64, y: f64, z: f64) -> Result<()> {
        debug!("POINT({:.6}, {:.6}, {:.6})", x, y, z);
        self.session.send(&Message::point(x, y, z)).await
    }

    /// Unsolicited messages from the arm, as a lazy unbounded sequence
    pub fn listen(&mut self) -> Listener<'_> {
        Listener::new(&mut self.session)
    }

    /// Trace a circle of `radius` in the z = 0 plane for `duration`, then
    /// return to the origin
    ///
    /// One point is sent every `step`; the angle is the elapsed time in
    /// seconds, so the effector turns one radian per second.
    pub async fn trace_circle(
        &mut self,
        radius: f64,
        duration: Duration,
        step: Duration,
    ) -> Result<usize> {
        let started = tokio::time::Instant::now();
        let mut points = 0usize;

        loop {
            let t = started.elapsed();
            if t >= duration {
                break;
            }
            let t = t.as_secs_f64();
            self.move_to(t.sin() * radius, t.cos() * radius, 0.0).await?;
            points += 1;
            tokio::time::sleep(step).await;
        }

        self.move_to(0.0, 0.0, 0.0).await?;
        info!("Circle traced with {} points", points);
        Ok(points)
    }

    /// Close the session
    pub fn close(&mut self) {
        self.session.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::framing::{read_frame, write_frame};
    use bytes::BytesMut;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    fn settings_for(address: String) -> LinkSettings {
        LinkSettings {
            address,
            dial_timeout: Duration::from_secs(4),
            keepalive: Duration::from_secs(4),
            read_timeout: Duration::from_secs(2),
        }
    }

    /// Loopback arm that answers every `Ping` with `reply`
    async fn spawn_ping_peer(reply: Message) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = BytesMut::new();
            while let Ok(message) = read_frame(&mut socket, &mut buf).await {
                if message == Message::Ping {
                    write_frame(&mut socket, &reply).await.unwrap();
                }
            }
        });
        address
    }

    /// Loopback arm that forwards every received message to a channel
    async fn spawn_recording_peer() -> (String, mpsc::UnboundedReceiver<Message>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = BytesMut::new();
            while let Ok(message) = read_frame(&mut socket, &mut buf).await {
                if tx.send(message).is_err() {
                    break;
                }
            }
        });
        (address, rx)
    }

    #[tokio::test]
    async fn test_ping_round_trip() {
        let address = spawn_ping_peer(Message::Ping).await;
        let mut arm = ArmClient::connect(&settings_for(address)).await.unwrap();

        let rtt = arm.ping().await.unwrap();
        assert!(rtt >= Duration::ZERO);
    }

    #[tokio::test]
    async fn test_ping_unexpected_reply() {
        let address = spawn_ping_peer(Message::Start).await;
        let mut arm = ArmClient::connect(&settings_for(address)).await.unwrap();

        match arm.ping().await {
            Err(DeltaError::Protocol { expected, received }) => {
                assert_eq!(expected, "PING");
                assert_eq!(received, "START");
            }
            other => panic!("Expected Protocol error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fire_and_forget_commands() {
        let (address, mut rx) = spawn_recording_peer().await;
        let mut arm = ArmClient::connect(&settings_for(address)).await.unwrap();

        arm.start().await.unwrap();
        arm.get_status().await.unwrap();
        arm.move_to(0.02, 0.02, 0.0).await.unwrap();
        arm.stop().await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), Message::Start);
        assert_eq!(rx.recv().await.unwrap(), Message::Get);
        assert_eq!(rx.recv().await.unwrap(), Message::point(0.02, 0.02, 0.0));
        assert_eq!(rx.recv().await.unwrap(), Message::Stop);
    }

    #[tokio::test]
    async fn test_trace_circle_ends_at_origin() {
        let (address, mut rx) = spawn_recording_peer().await;
        let mut arm = ArmClient::connect(&settings_for(address)).await.unwrap();

        let points = arm
            .trace_circle(CIRCLE_RADIUS, Duration::from_millis(30), Duration::from_millis(3))
            .await
            .unwrap();
        assert!(points >= 1);

        // First point starts at angle zero: (0, r)
        match rx.recv().await.unwrap() {
            Message::Point { x, y, z } => {
                assert!(x.abs() < 1e-3);
                assert!((y - CIRCLE_RADIUS).abs() < 1e-4);
                assert_eq!(z, 0.0);
            }
            other => panic!("Expected point, got: {:?}", other),
        }

        let mut last = None;
        for _ in 1..=points {
            last = rx.recv().await;
        }
        assert_eq!(last, Some(Message::point(0.0, 0.0, 0.0)));
    }

    #[tokio::test]
    async fn test_commands_fail_after_close() {
        let (address, _rx) = spawn_recording_peer().await;
        let mut arm = ArmClient::connect(&settings_for(address)).await.unwrap();

        arm.close();
        assert!(matches!(arm.start().await, Err(DeltaError::SessionClosed)));
        assert!(!arm.session().is_open());
    }

    #[test]
    fn test_circle_constants() {
        assert_eq!(CIRCLE_RADIUS, 0.04);
        let expected = (4.0 * std::f64::consts::PI * 1000.0) as u128;
        assert_eq!(CIRCLE_DURATION.as_millis(), expected);
        assert_eq!(CIRCLE_STEP, Duration::from_millis(3));
    }
}
