//! Listen mode: yields whatever the arm sends, unprompted.

use tracing::{debug, info, warn};

use crate::error::{DeltaError, Result};
use crate::link::Session;
use crate::protocol::Message;

/// Lazy, unbounded sequence of messages received from the arm
///
/// Read deadlines are treated as idle time and frames with an unknown
/// discriminant are skipped. Any other failure is yielded once, after which
/// the sequence is exhausted; it also ends once the session is closed.
///
/// # Examples
///
/// ```no_run
/// # use delta_arm::arm::ArmClient;
/// # async fn run(arm: &mut ArmClient) {
/// let mut listener = arm.listen();
/// while let Some(message) = listener.next().await {
///     match message {
///         Ok(message) => println!("Got type: {}", message.kind()),
///         Err(e) => eprintln!("Listen stopped: {}", e),
///     }
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct Listener<'a> {
    session: &'a mut Session,
    finished: bool,
}

impl<'a> Listener<'a> {
    pub(crate) fn new(session: &'a mut Session) -> Self {
        Self {
            session,
            finished: false,
        }
    }

    /// Wait for the next message
    ///
    /// Returns `None` when the sequence is exhausted.
    pub async fn next(&mut self) -> Option<Result<Message>> {
        loop {
            if self.finished || !self.session.is_open() {
                return None;
            }

            match self.session.receive().await {
                Ok(message) => {
                    info!("Listen: got type {}", message.kind());
                    return Some(Ok(message));
                }
                Err(DeltaError::Timeout(idle)) => {
                    debug!("Listen: nothing received for {:?}", idle);
                }
                Err(DeltaError::UnknownVariant(tag)) => {
                    warn!("Listen: skipping frame with unknown variant 0x{:02X}", tag);
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
