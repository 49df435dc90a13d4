//! # Delta Arm Library
//!
//! Drive a delta robot arm over TCP with an Xbox 360 controller.
//!
//! This library provides the length-prefixed message protocol spoken by the
//! arm, a session layer with dial and read deadlines, a command client, and
//! the controller driver that streams stick positions to the arm.

pub mod arm;
pub mod config;
pub mod controller;
pub mod error;
pub mod link;
pub mod protocol;
