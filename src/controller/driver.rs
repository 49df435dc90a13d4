//! # Controller Driver
//!
//! Turns controller reports into arm motion.
//!
//! ## Control Flow
//!
//! 1. **Slot assignment**
//!    - Lamp off, wait for the controller to settle
//!    - Play the spin animation ending on the configured player lamp
//!    - Drain reports queued while the animation ran
//!
//! 2. **Polling loop** (one iteration per `poll_interval`)
//!    - Read at most one report; no report within the read timeout is fine
//!    - Decode it and log button/trigger transitions
//!    - Send `move_to` for the latest left stick position, every iteration
//!
//! 3. **Shutdown**
//!    - The caller's shutdown future completes, or
//!    - The arm session fails; that error is returned, or
//!    - The controller fails [`MAX_CONSECUTIVE_READ_ERRORS`] reads in a row
//!      (typically unplugged)

use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::hid_io::ReportIo;
use super::indicator::{self, AnimationTiming, LampPattern, SpinAnimation};
use super::report::{transitions, InputEvent, Snapshot};
use super::stick::StickMapper;
use crate::arm::ArmClient;
use crate::config::Config;
use crate::error::{DeltaError, Result};

/// Read buffer size; larger than any report so oversized ones are detected
const READ_BUFFER_LEN: usize = 64;

/// Upper bound on reads when discarding queued reports
const MAX_DRAIN_READS: usize = 64;

/// Failed reads in a row after which the controller is considered gone
pub const MAX_CONSECUTIVE_READ_ERRORS: u32 = 100;

/// Number of iterations between status log messages
const LOG_INTERVAL_ITERATIONS: u64 = 1000;

/// Driver parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverSettings {
    pub poll_interval: Duration,
    pub radius: f64,
    pub player_slot: u8,
    pub settle: Duration,
    pub timing: AnimationTiming,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for DriverSettings {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.controller.poll_interval_ms),
            radius: config.controller.radius,
            player_slot: config.controller.player_slot,
            settle: Duration::from_millis(config.indicator.settle_ms),
            timing: AnimationTiming::from(&config.indicator),
        }
    }
}

/// Polling driver for one controller
///
/// Keeps the two most recent snapshots; after every accepted report they are
/// swapped, so [`Driver::latest`] always returns the newest state.
pub struct Driver<D: ReportIo> {
    device: D,
    previous: Snapshot,
    current: Snapshot,
    mapper: StickMapper,
    settings: DriverSettings,
    read_errors: u32,
}

impl<D: ReportIo> std::fmt::Debug for Driver<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("latest", &self.previous)
            .field("mapper", &self.mapper)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<D: ReportIo> Driver<D> {
    pub fn new(device: D, settings: DriverSettings) -> Self {
        Self {
            device,
            previous: Snapshot::default(),
            current: Snapshot::default(),
            mapper: StickMapper::new(settings.radius),
            settings,
            read_errors: 0,
        }
    }

    /// Most recently accepted controller state
    pub fn latest(&self) -> Snapshot {
        self.previous
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Failed reads since the last successful one
    pub fn consecutive_read_errors(&self) -> u32 {
        self.read_errors
    }

    /// Read and process at most one report
    ///
    /// # Returns
    ///
    /// * `Some(events)` - A valid report was accepted; `events` are its
    ///   transitions from the previous state (possibly none)
    /// * `None` - No report arrived, the read failed, or the report was
    ///   malformed; the latest state is unchanged
    pub async fn poll_once(&mut self) -> Option<Vec<InputEvent>> {
        let mut buf = [0u8; READ_BUFFER_LEN];

        let n = match self.device.read_report(&mut buf).await {
            Ok(n) => {
                self.read_errors = 0;
                n
            }
            Err(e) => {
                self.read_errors += 1;
                if self.read_errors == 1 {
                    warn!("Controller read failed: {}", e);
                } else {
                    debug!("Controller read failed ({} in a row): {}", self.read_errors, e);
                }
                return None;
            }
        };

        if n == 0 {
            return None;
        }

        let Some(snapshot) = Snapshot::decode(&buf[..n]) else {
            warn!("Skipping controller report with {} bytes", n);
            return None;
        };

        self.current = snapshot;
        let events = transitions(&self.previous, &self.current);
        for event in &events {
            debug!("{}", event);
        }

        std::mem::swap(&mut self.previous, &mut self.current);
        Some(events)
    }

    /// Show the slot animation and settle on the player lamp
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the player slot is not 1-4
    pub async fn assign_slot(&mut self) -> Result<()> {
        let target = LampPattern::for_player(self.settings.player_slot).ok_or_else(|| {
            DeltaError::Configuration(format!(
                "player slot {} is not between 1 and 4",
                self.settings.player_slot
            ))
        })?;

        indicator::set_lamp(&mut self.device, LampPattern::Off).await;
        tokio::time::sleep(self.settings.settle).await;

        let animation = SpinAnimation::new(target, self.settings.timing);
        indicator::play(&mut self.device, &animation).await;
        info!("Controller assigned to player {}", self.settings.player_slot);

        let drained = self.drain().await;
        if drained > 0 {
            debug!("Discarded {} queued reports", drained);
        }

        Ok(())
    }

    /// Discard queued reports until a read returns nothing
    ///
    /// Returns the number of reports discarded.
    pub async fn drain(&mut self) -> usize {
        let mut buf = [0u8; READ_BUFFER_LEN];
        let mut drained = 0;

        while drained < MAX_DRAIN_READS {
            match self.device.read_report(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    debug!("Drained report: {:02X?}", &buf[..n]);
                    drained += 1;
                }
                Err(e) => {
                    warn!("Controller read failed while draining: {}", e);
                    break;
                }
            }
        }

        drained
    }

    /// Poll the controller and steer the arm until `shutdown` completes
    ///
    /// # Arguments
    ///
    /// * `arm` - Arm to steer; receives one `move_to` per iteration
    /// * `shutdown` - Checked between iterations
    ///
    /// # Returns
    ///
    /// * `Result<u64>` - Number of completed iterations
    ///
    /// # Errors
    ///
    /// - The first arm error; the loop stops there
    /// - `Hid` once [`MAX_CONSECUTIVE_READ_ERRORS`] controller reads have
    ///   failed in a row
    pub async fn run<F>(&mut self, arm: &mut ArmClient, shutdown: F) -> Result<u64>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Polling controller every {:?}", self.settings.poll_interval);

        let mut iterations: u64 = 0;

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Controller loop stopped after {} iterations", iterations);
                    return Ok(iterations);
                }
                _ = ticker.tick() => {}
            }

            self.poll_once().await;
            if self.read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                warn!("Controller stopped responding, ending loop");
                return Err(DeltaError::Hid(format!(
                    "controller read failed {} times in a row",
                    self.read_errors
                )));
            }

            let target = self.mapper.target(&self.latest());
            arm.move_to(target.x, target.y, target.z).await?;

            iterations += 1;
            if iterations % LOG_INTERVAL_ITERATIONS == 0 {
                debug!("Sent {} positions", iterations);
            }
        }
    }

    /// Assign the slot, then run the polling loop
    pub async fn start<F>(&mut self, arm: &mut ArmClient, shutdown: F) -> Result<u64>
    where
        F: Future<Output = ()>,
    {
        self.assign_slot().await?;
        self.run(arm, shutdown).await
    }
}
