//! # Controller Module
//!
//! Xbox 360 controller input handling.
//!
//! This module handles:
//! - Controller detection and report I/O via hidapi
//! - Decoding button, trigger and stick reports
//! - Button and trigger edge detection
//! - Mapping the left stick onto arm coordinates
//! - The player lamp and its startup animation

pub mod driver;
pub mod hid_io;
pub mod indicator;
pub mod report;
pub mod stick;
pub mod xbox;

pub use driver::{Driver, DriverSettings};
pub use xbox::XboxController;
