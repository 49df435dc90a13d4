//! # Controller Report Module
//!
//! Decodes the Xbox 360 controller's raw input report into a [`Snapshot`] and
//! computes the transitions between two snapshots.
//!
//! ## Report Layout (20 bytes)
//!
//! | Byte | Bits | Content |
//! |------|------|---------|
//! | 0 | - | Message type (0x00) |
//! | 1 | - | Report length (0x14) |
//! | 2 | 0-3 | D-Pad up, down, left, right |
//! | 2 | 4-7 | Start, Back, left thumb, right thumb |
//! | 3 | 0-2 | LB, RB, Guide |
//! | 3 | 4-7 | A, B, X, Y |
//! | 4 | - | Left trigger (0-255) |
//! | 5 | - | Right trigger (0-255) |
//! | 6-7 | - | Left stick X (i16 LE) |
//! | 8-9 | - | Left stick Y (i16 LE) |
//! | 10-11 | - | Right stick X (i16 LE) |
//! | 12-13 | - | Right stick Y (i16 LE) |
//! | 14-19 | - | Unused |

use std::fmt;

/// Size of a button/trigger/axis input report
pub const REPORT_LEN: usize = 20;

/// Digital buttons, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Start,
    Back,
    LeftThumb,
    RightThumb,
    LeftBumper,
    RightBumper,
    Guide,
    A,
    B,
    X,
    Y,
}

impl Button {
    /// Every button, in snapshot order
    pub const ALL: [Button; 15] = [
        Button::DpadUp,
        Button::DpadDown,
        Button::DpadLeft,
        Button::DpadRight,
        Button::Start,
        Button::Back,
        Button::LeftThumb,
        Button::RightThumb,
        Button::LeftBumper,
        Button::RightBumper,
        Button::Guide,
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
    ];

    /// Byte index and bit within the raw report
    pub const fn location(self) -> (usize, u8) {
        match self {
            Button::DpadUp => (2, 0),
            Button::DpadDown => (2, 1),
            Button::DpadLeft => (2, 2),
            Button::DpadRight => (2, 3),
            Button::Start => (2, 4),
            Button::Back => (2, 5),
            Button::LeftThumb => (2, 6),
            Button::RightThumb => (2, 7),
            Button::LeftBumper => (3, 0),
            Button::RightBumper => (3, 1),
            Button::Guide => (3, 2),
            Button::A => (3, 4),
            Button::B => (3, 5),
            Button::X => (3, 6),
            Button::Y => (3, 7),
        }
    }

    /// Label used in logs
    pub const fn name(self) -> &'static str {
        match self {
            Button::DpadUp => "DPAD U",
            Button::DpadDown => "DPAD D",
            Button::DpadLeft => "DPAD L",
            Button::DpadRight => "DPAD R",
            Button::Start => "START",
            Button::Back => "BACK",
            Button::LeftThumb => "THUMB L",
            Button::RightThumb => "THUMB R",
            Button::LeftBumper => "LB",
            Button::RightBumper => "RB",
            Button::Guide => "GUIDE",
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Analog triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Left,
    Right,
}

impl Trigger {
    pub const ALL: [Trigger; 2] = [Trigger::Left, Trigger::Right];

    /// Byte index within the raw report
    pub const fn offset(self) -> usize {
        match self {
            Trigger::Left => 4,
            Trigger::Right => 5,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Trigger::Left => "LT",
            Trigger::Right => "RT",
        }
    }
}

/// Joystick axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::LeftX, Axis::LeftY, Axis::RightX, Axis::RightY];

    /// Offset of the low byte within the raw report
    pub const fn offset(self) -> usize {
        match self {
            Axis::LeftX => 6,
            Axis::LeftY => 8,
            Axis::RightX => 10,
            Axis::RightY => 12,
        }
    }
}

/// Decoded controller state at one point in time
///
/// Axis values are the raw samples of the report they came from; no
/// filtering is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    buttons: [bool; 15],
    triggers: [u8; 2],
    axes: [i16; 4],
}

impl Snapshot {
    /// Decode a raw input report
    ///
    /// Returns `None` if the report does not have exactly [`REPORT_LEN`] bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use delta_arm::controller::report::{Axis, Button, Snapshot};
    ///
    /// let mut report = [0u8; 20];
    /// report[3] = 0x10; // A
    /// report[6..8].copy_from_slice(&1000i16.to_le_bytes());
    ///
    /// let snapshot = Snapshot::decode(&report).unwrap();
    /// assert!(snapshot.button(Button::A));
    /// assert_eq!(snapshot.axis(Axis::LeftX), 1000);
    /// ```
    #[must_use]
    pub fn decode(report: &[u8]) -> Option<Self> {
        if report.len() != REPORT_LEN {
            return None;
        }

        let mut snapshot = Snapshot::default();

        for button in Button::ALL {
            let (byte, bit) = button.location();
            snapshot.buttons[button.index()] = report[byte] & (1 << bit) != 0;
        }

        for (i, trigger) in Trigger::ALL.iter().enumerate() {
            snapshot.triggers[i] = report[trigger.offset()];
        }

        for (i, axis) in Axis::ALL.iter().enumerate() {
            let lo = axis.offset();
            snapshot.axes[i] = i16::from_le_bytes([report[lo], report[lo + 1]]);
        }

        Some(snapshot)
    }

    /// Whether `button` is held
    #[must_use]
    pub fn button(&self, button: Button) -> bool {
        self.buttons[button.index()]
    }

    /// Raw trigger magnitude
    #[must_use]
    pub fn trigger(&self, trigger: Trigger) -> u8 {
        self.triggers[trigger as usize]
    }

    /// Raw signed axis sample
    #[must_use]
    pub fn axis(&self, axis: Axis) -> i16 {
        self.axes[axis as usize]
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.buttons[button.index()] = pressed;
    }

    pub fn set_trigger(&mut self, trigger: Trigger, value: u8) {
        self.triggers[trigger as usize] = value;
    }

    pub fn set_axis(&mut self, axis: Axis, value: i16) {
        self.axes[axis as usize] = value;
    }
}

/// A state change between two consecutive snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Pressed(Button),
    Released(Button),
    TriggerChanged { trigger: Trigger, value: u8 },
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputEvent::Pressed(button) => write!(f, "Button {:?} pressed", button.name()),
            InputEvent::Released(button) => write!(f, "Button {:?} released", button.name()),
            InputEvent::TriggerChanged { trigger, value } => {
                write!(f, "Trigger {:?} = {}", trigger.name(), value)
            }
        }
    }
}

/// Transitions from `previous` to `current`
///
/// Buttons produce an event only when their state flips; triggers only when
/// the raw value differs. Steady state yields nothing. Events come out in
/// button order, then trigger order.
#[must_use]
pub fn transitions(previous: &Snapshot, current: &Snapshot) -> Vec<InputEvent> {
    let mut events = Vec::new();

    for button in Button::ALL {
        match (previous.button(button), current.button(button)) {
            (false, true) => events.push(InputEvent::Pressed(button)),
            (true, false) => events.push(InputEvent::Released(button)),
            _ => {}
        }
    }

    for trigger in Trigger::ALL {
        let value = current.trigger(trigger);
        if previous.trigger(trigger) != value {
            events.push(InputEvent::TriggerChanged { trigger, value });
        }
    }

    events
}
