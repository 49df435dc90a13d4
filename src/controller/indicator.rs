//! # Status Indicator Module
//!
//! Drives the ring of four lamps around the controller's Guide button.
//!
//! The lamps are set with a 3-byte output report `[0x01, 0x03, pattern]`.
//! Pattern codes are fixed by the controller firmware; see [`LampPattern`].
//!
//! ## Slot Animation
//!
//! On startup the driver plays a short "spin" before settling on its player
//! slot:
//!
//! 1. `Booting`, held briefly
//! 2. Spin through the ring in physical order (1, 2, 4, 3), starting slow and
//!    speeding up by a fixed step per lamp until the floor delay is reached
//! 3. Keep spinning at the floor delay until the assigned slot's lamp is
//!    shown, giving up after a bounded number of steps
//!
//! The animation is computed up front as a list of [`LampStep`]s, so its
//! timing can be checked without a device.

use std::time::Duration;
use tracing::{debug, warn};

use super::hid_io::ReportIo;
use crate::config::IndicatorConfig;

/// Output report prefix: message type 0x01, length 0x03
const LAMP_REPORT_PREFIX: [u8; 2] = [0x01, 0x03];

/// Lamp patterns understood by the controller firmware
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LampPattern {
    /// All lamps off
    Off = 0x00,
    /// All lamps flash briefly
    WarnAll = 0x01,
    NewPlayer1 = 0x02,
    NewPlayer2 = 0x03,
    NewPlayer3 = 0x04,
    NewPlayer4 = 0x05,
    Player1 = 0x06,
    Player2 = 0x07,
    Player3 = 0x08,
    Player4 = 0x09,
    /// Lamps chase around the ring
    Waiting = 0x0A,
    /// Active lamp flashes
    WarnPlayer = 0x0B,
    Blank = 0x0C,
    /// Squiggle pattern
    Battery = 0x0D,
    /// Slow flash
    Searching = 0x0E,
    /// Solid, then flash
    Booting = 0x0F,
}

impl LampPattern {
    const ALL: [LampPattern; 16] = [
        LampPattern::Off,
        LampPattern::WarnAll,
        LampPattern::NewPlayer1,
        LampPattern::NewPlayer2,
        LampPattern::NewPlayer3,
        LampPattern::NewPlayer4,
        LampPattern::Player1,
        LampPattern::Player2,
        LampPattern::Player3,
        LampPattern::Player4,
        LampPattern::Waiting,
        LampPattern::WarnPlayer,
        LampPattern::Blank,
        LampPattern::Battery,
        LampPattern::Searching,
        LampPattern::Booting,
    ];

    /// Firmware code for this pattern
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Pattern for a firmware code, if known
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Solid lamp for player slot `slot` (1-4)
    pub fn for_player(slot: u8) -> Option<Self> {
        match slot {
            1 => Some(LampPattern::Player1),
            2 => Some(LampPattern::Player2),
            3 => Some(LampPattern::Player3),
            4 => Some(LampPattern::Player4),
            _ => None,
        }
    }

    /// Complete output report for this pattern
    pub const fn report(self) -> [u8; 3] {
        [LAMP_REPORT_PREFIX[0], LAMP_REPORT_PREFIX[1], self.code()]
    }
}

/// Player lamps in physical ring order
pub const SPIN_ORDER: [LampPattern; 4] = [
    LampPattern::Player1,
    LampPattern::Player2,
    LampPattern::Player4,
    LampPattern::Player3,
];

/// Timing parameters of the slot animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTiming {
    pub boot_hold: Duration,
    pub initial_delay: Duration,
    pub floor_delay: Duration,
    pub decrement: Duration,
    pub safety_steps: u32,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self::from(&IndicatorConfig::default())
    }
}

impl From<&IndicatorConfig> for AnimationTiming {
    fn from(config: &IndicatorConfig) -> Self {
        Self {
            boot_hold: Duration::from_millis(config.boot_hold_ms),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            floor_delay: Duration::from_millis(config.floor_delay_ms),
            decrement: Duration::from_millis(config.decrement_ms),
            safety_steps: config.safety_steps,
        }
    }
}

/// One lamp write followed by a hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LampStep {
    pub pattern: LampPattern,
    pub hold: Duration,
}

/// Spin animation ending on a target pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinAnimation {
    target: LampPattern,
    timing: AnimationTiming,
}

impl SpinAnimation {
    pub fn new(target: LampPattern, timing: AnimationTiming) -> Self {
        Self { target, timing }
    }

    pub fn target(&self) -> LampPattern {
        self.target
    }

    /// The full step plan
    ///
    /// Always finite: the acceleration phase ends once the delay reaches the
    /// floor, and the settle phase is capped at `safety_steps`. A target
    /// outside [`SPIN_ORDER`] is never displayed; the plan then ends after
    /// the cap.
    ///
    /// # Examples
    ///
    /// ```
    /// use delta_arm::controller::indicator::{AnimationTiming, LampPattern, SpinAnimation};
    ///
    /// let steps = SpinAnimation::new(LampPattern::Player3, AnimationTiming::default()).steps();
    /// assert_eq!(steps.first().unwrap().pattern, LampPattern::Booting);
    /// assert_eq!(steps.last().unwrap().pattern, LampPattern::Player3);
    /// ```
    pub fn steps(&self) -> Vec<LampStep> {
        let timing = &self.timing;
        let mut steps = vec![LampStep {
            pattern: LampPattern::Booting,
            hold: timing.boot_hold,
        }];

        let mut ring = SPIN_ORDER.iter().copied().cycle();
        let mut delay = timing.initial_delay;

        // Zero decrement would never reach the floor
        if !timing.decrement.is_zero() {
            while delay > timing.floor_delay {
                if let Some(pattern) = ring.next() {
                    steps.push(LampStep { pattern, hold: delay });
                }
                delay = delay.saturating_sub(timing.decrement).max(timing.floor_delay);
            }
        }

        for pattern in ring.take(timing.safety_steps as usize) {
            steps.push(LampStep { pattern, hold: delay });
            if pattern == self.target {
                break;
            }
        }

        steps
    }

    /// Total time the animation takes
    pub fn duration(&self) -> Duration {
        self.steps().iter().map(|step| step.hold).sum()
    }
}

/// Write one lamp pattern
///
/// Failures are logged and otherwise ignored; the lamp is cosmetic.
pub async fn set_lamp<D: ReportIo + ?Sized>(device: &mut D, pattern: LampPattern) {
    if let Err(e) = device.write_report(&pattern.report()).await {
        warn!("Failed to set lamp {:?}: {}", pattern, e);
    }
}

/// Play `animation` on `device`, holding each step
pub async fn play<D: ReportIo + ?Sized>(device: &mut D, animation: &SpinAnimation) {
    let steps = animation.steps();
    debug!(
        "Playing lamp animation: {} steps towards {:?}",
        steps.len(),
        animation.target()
    );

    for step in steps {
        set_lamp(device, step.pattern).await;
        tokio::time::sleep(step.hold).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::hid_io::mocks::MockReportIo;
    use std::io;

    /// Acceleration phase length with default timing: 100 ms down to 25 ms
    const ACCELERATION_STEPS: usize = 16;

    #[test]
    fn test_pattern_codes() {
        assert_eq!(LampPattern::Off.code(), 0x00);
        assert_eq!(LampPattern::Player1.code(), 0x06);
        assert_eq!(LampPattern::Player4.code(), 0x09);
        assert_eq!(LampPattern::Booting.code(), 0x0F);

        for code in 0x00..=0x0F {
            assert_eq!(LampPattern::from_code(code).unwrap().code(), code);
        }
        assert!(LampPattern::from_code(0x10).is_none());
    }

    #[test]
    fn test_lamp_report() {
        assert_eq!(LampPattern::Player2.report(), [0x01, 0x03, 0x07]);
        assert_eq!(LampPattern::Off.report(), [0x01, 0x03, 0x00]);
    }

    #[test]
    fn test_for_player() {
        assert_eq!(LampPattern::for_player(1), Some(LampPattern::Player1));
        assert_eq!(LampPattern::for_player(4), Some(LampPattern::Player4));
        assert!(LampPattern::for_player(0).is_none());
        assert!(LampPattern::for_player(5).is_none());
    }

    #[test]
    fn test_animation_starts_with_booting() {
        let timing = AnimationTiming::default();
        let steps = SpinAnimation::new(LampPattern::Player1, timing).steps();

        assert_eq!(steps[0].pattern, LampPattern::Booting);
        assert_eq!(steps[0].hold, Duration::from_millis(100));
    }

    #[test]
    fn test_acceleration_phase() {
        let steps = SpinAnimation::new(LampPattern::Player1, AnimationTiming::default()).steps();
        let spin = &steps[1..=ACCELERATION_STEPS];

        assert_eq!(spin[0].hold, Duration::from_millis(100));
        assert_eq!(spin[ACCELERATION_STEPS - 1].hold, Duration::from_millis(25));

        for pair in spin.windows(2) {
            assert!(pair[1].hold < pair[0].hold, "delay should shrink every step");
        }

        // Physical ring order
        for (i, step) in spin.iter().enumerate() {
            assert_eq!(step.pattern, SPIN_ORDER[i % SPIN_ORDER.len()]);
        }
    }

    #[test]
    fn test_settles_on_target() {
        let steps = SpinAnimation::new(LampPattern::Player3, AnimationTiming::default()).steps();

        // Ring resumes at Player1 after 16 steps; Player3 is fourth
        assert_eq!(steps.len(), 1 + ACCELERATION_STEPS + 4);
        assert_eq!(steps.last().unwrap().pattern, LampPattern::Player3);
        for step in &steps[1 + ACCELERATION_STEPS..] {
            assert_eq!(step.hold, Duration::from_millis(20));
        }
    }

    #[test]
    fn test_each_slot_terminates_on_its_lamp() {
        for slot in 1..=4 {
            let target = LampPattern::for_player(slot).unwrap();
            let steps = SpinAnimation::new(target, AnimationTiming::default()).steps();
            assert_eq!(steps.last().unwrap().pattern, target);
            assert!(steps.len() <= 1 + ACCELERATION_STEPS + 4);
        }
    }

    #[test]
    fn test_unreachable_target_is_capped() {
        let steps = SpinAnimation::new(LampPattern::Battery, AnimationTiming::default()).steps();

        assert_eq!(steps.len(), 1 + ACCELERATION_STEPS + 40);
        assert!(steps.iter().all(|step| step.pattern != LampPattern::Battery));
    }

    #[test]
    fn test_coarse_decrement_clamps_to_floor() {
        let timing = AnimationTiming {
            decrement: Duration::from_millis(30),
            ..AnimationTiming::default()
        };
        let steps = SpinAnimation::new(LampPattern::Player1, timing).steps();

        // 100, 70, 40, then the floor
        let holds: Vec<u64> = steps[1..4].iter().map(|s| s.hold.as_millis() as u64).collect();
        assert_eq!(holds, vec![100, 70, 40]);
        assert_eq!(steps[4].hold, Duration::from_millis(20));
    }

    #[test]
    fn test_zero_decrement_skips_acceleration() {
        let timing = AnimationTiming {
            decrement: Duration::ZERO,
            ..AnimationTiming::default()
        };
        let steps = SpinAnimation::new(LampPattern::Player1, timing).steps();

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].pattern, LampPattern::Player1);
    }

    #[test]
    fn test_duration() {
        let animation = SpinAnimation::new(LampPattern::Player3, AnimationTiming::default());

        // Boot 100 + spin (100 + 95 + ... + 25) + 4 * 20
        assert_eq!(animation.duration(), Duration::from_millis(100 + 1000 + 80));
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_writes_every_step() {
        let mut device = MockReportIo::new();
        let animation = SpinAnimation::new(LampPattern::Player2, AnimationTiming::default());

        let started = tokio::time::Instant::now();
        play(&mut device, &animation).await;

        let written = device.get_written_data();
        let expected: Vec<Vec<u8>> = animation
            .steps()
            .iter()
            .map(|step| step.pattern.report().to_vec())
            .collect();
        assert_eq!(written, expected);
        assert_eq!(written.last().unwrap(), &vec![0x01, 0x03, 0x07]);
        assert!(started.elapsed() >= animation.duration());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_survives_write_errors() {
        let mut device = MockReportIo::new();
        device.set_write_error(io::ErrorKind::BrokenPipe);

        let animation = SpinAnimation::new(LampPattern::Player1, AnimationTiming::default());
        play(&mut device, &animation).await;

        assert!(device.get_written_data().is_empty());
    }

    #[tokio::test]
    async fn test_set_lamp() {
        let mut device = MockReportIo::new();
        set_lamp(&mut device, LampPattern::Off).await;
        assert_eq!(device.get_written_data(), vec![vec![0x01, 0x03, 0x00]]);
    }
}
