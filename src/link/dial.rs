//! Connection establishment: the dial race and socket options.

use socket2::{SockRef, TcpKeepalive};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{DeltaError, Result};

/// Race `attempt` against a timer of length `timeout`
///
/// Both branches start together and the first one to finish decides the
/// outcome; the loser is dropped on the spot. A dropped connect attempt never
/// produces a stream, and a timer that loses simply never fires, so neither can
/// touch state after the race is decided. When both are ready on the same poll
/// the timer wins.
pub async fn race_timeout<F, T>(attempt: F, timeout: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = tokio::time::sleep(timeout) => Err(DeltaError::Timeout(timeout)),
        result = attempt => result,
    }
}

/// Open a TCP connection to `address`, giving up after `timeout`
///
/// Name resolution runs inside the race, so a slow resolver is bounded by the
/// same deadline.
pub async fn dial(address: &str, timeout: Duration) -> Result<TcpStream> {
    debug!("Dialing {} (timeout {:?})", address, timeout);

    let attempt = async {
        TcpStream::connect(address)
            .await
            .map_err(|e| DeltaError::Dial(format!("{}: {}", address, e)))
    };

    race_timeout(attempt, timeout).await
}

/// Enable keep-alive probing with the given period and disable Nagle
///
/// Command frames are tiny and latency sensitive, hence `TCP_NODELAY`.
pub fn configure(stream: &TcpStream, keepalive: Duration) -> Result<()> {
    let params = TcpKeepalive::new().with_time(keepalive);

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    let params = params.with_interval(keepalive);

    SockRef::from(stream)
        .set_tcp_keepalive(&params)
        .map_err(|e| DeltaError::Configuration(format!("Failed to enable keep-alive: {}", e)))?;

    stream
        .set_nodelay(true)
        .map_err(|e| DeltaError::Configuration(format!("Failed to set TCP_NODELAY: {}", e)))?;

    Ok(())
}
