//! Maps the left joystick onto arm coordinates.
//!
//! A raw axis sample `a` becomes `a / 32768 * radius`, so full deflection
//! reaches the edge of the arm's envelope and the resting stick sits at the
//! origin. Samples are used as-is; there is no deadzone or smoothing.

use super::report::{Axis, Snapshot};

/// Magnitude of the most negative axis sample
pub const AXIS_FULL_SCALE: f64 = 32768.0;

/// Default envelope radius (meters)
pub const DEFAULT_RADIUS: f64 = 0.04;

/// Effector target in arm coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Linear joystick to arm-coordinate mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickMapper {
    radius: f64,
}

impl Default for StickMapper {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS)
    }
}

impl StickMapper {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Scale one raw axis sample to meters
    ///
    /// # Examples
    ///
    /// ```
    /// use delta_arm::controller::stick::StickMapper;
    ///
    /// let mapper = StickMapper::new(0.04);
    /// assert_eq!(mapper.scale(0), 0.0);
    /// assert_eq!(mapper.scale(-32768), -0.04);
    /// ```
    #[inline]
    pub fn scale(&self, raw: i16) -> f64 {
        f64::from(raw) / AXIS_FULL_SCALE * self.radius
    }

    /// Target for the left stick position in `snapshot`; z stays at 0
    pub fn target(&self, snapshot: &Snapshot) -> Target {
        Target {
            x: self.scale(snapshot.axis(Axis::LeftX)),
            y: self.scale(snapshot.axis(Axis::LeftY)),
            z: 0.0,
        }
    }
}
