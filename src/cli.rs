use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use delta_arm::config::Config;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "delta-arm",
    version,
    about = "Drive a delta robot arm over TCP with an Xbox 360 controller"
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Arm host, overrides the configuration file
    #[arg(long, global = true)]
    pub host: Option<String>,
    /// Arm TCP port, overrides the configuration file
    #[arg(long, global = true)]
    pub port: Option<u16>,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Ping the arm and report the round-trip time
    Ping,
    /// Allow motor positioning commands
    Start,
    /// Ignore motor positioning commands
    Stop,
    /// Request motor data
    Get,
    /// Move the effector to a point
    Point(PointOpts),
    /// Trace a circle, then return to the origin
    Circle,
    /// Log everything the arm sends until Ctrl+C
    Listen,
    /// Steer the arm with the Xbox 360 controller until Ctrl+C
    Xbox,
    /// Encode and decode a message locally; no arm needed
    Selftest,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct PointOpts {
    /// X coordinate (meters)
    #[arg(default_value_t = 0.02, allow_negative_numbers = true)]
    pub x: f64,
    /// Y coordinate (meters)
    #[arg(default_value_t = 0.02, allow_negative_numbers = true)]
    pub y: f64,
    /// Z coordinate (meters)
    #[arg(default_value_t = 0.0, allow_negative_numbers = true)]
    pub z: f64,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.arm.host = host.clone();
        }
        if let Some(port) = self.port {
            config.arm.port = port;
        }
    }
}
