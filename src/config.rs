//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{DeltaError, Result};

/// Main configuration structure
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub arm: ArmConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub indicator: IndicatorConfig,
}

/// Arm link configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ArmConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_dial_timeout_ms")]
    pub dial_timeout_ms: u64,

    #[serde(default = "default_keepalive_ms")]
    pub keepalive_ms: u64,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ControllerConfig {
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,

    #[serde(default = "default_product_id")]
    pub product_id: u16,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_report_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Half-width of the reachable square, in meters
    #[serde(default = "default_radius")]
    pub radius: f64,

    #[serde(default = "default_player_slot")]
    pub player_slot: u8,
}

/// Status lamp animation configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IndicatorConfig {
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_boot_hold_ms")]
    pub boot_hold_ms: u64,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_floor_delay_ms")]
    pub floor_delay_ms: u64,

    #[serde(default = "default_decrement_ms")]
    pub decrement_ms: u64,

    #[serde(default = "default_safety_steps")]
    pub safety_steps: u32,
}

// Default value functions
fn default_host() -> String { "192.168.1.10".to_string() }
fn default_port() -> u16 { 80 }
fn default_dial_timeout_ms() -> u64 { 4000 }
fn default_keepalive_ms() -> u64 { 4000 }
fn default_read_timeout_ms() -> u64 { 4000 }

fn default_vendor_id() -> u16 { 0x045e }
fn default_product_id() -> u16 { 0x028e }
fn default_poll_interval_ms() -> u64 { 10 }
fn default_report_timeout_ms() -> u64 { 20 }
fn default_radius() -> f64 { 0.04 }
fn default_player_slot() -> u8 { 1 }

fn default_settle_ms() -> u64 { 1000 }
fn default_boot_hold_ms() -> u64 { 100 }
fn default_initial_delay_ms() -> u64 { 100 }
fn default_floor_delay_ms() -> u64 { 20 }
fn default_decrement_ms() -> u64 { 5 }
fn default_safety_steps() -> u32 { 40 }

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dial_timeout_ms: default_dial_timeout_ms(),
            keepalive_ms: default_keepalive_ms(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            vendor_id: default_vendor_id(),
            product_id: default_product_id(),
            poll_interval_ms: default_poll_interval_ms(),
            read_timeout_ms: default_report_timeout_ms(),
            radius: default_radius(),
            player_slot: default_player_slot(),
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            boot_hold_ms: default_boot_hold_ms(),
            initial_delay_ms: default_initial_delay_ms(),
            floor_delay_ms: default_floor_delay_ms(),
            decrement_ms: default_decrement_ms(),
            safety_steps: default_safety_steps(),
        }
    }
}

impl ArmConfig {
    /// `host:port` string suitable for dialing
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn invalid(msg: impl std::fmt::Display) -> DeltaError {
    DeltaError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use delta_arm::config::Config;
    ///
    /// let config = Config::load("config/delta.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.arm.host.is_empty() {
            return Err(invalid("arm host cannot be empty"));
        }

        if self.arm.port == 0 {
            return Err(invalid("arm port cannot be 0"));
        }

        for (name, value) in [
            ("dial_timeout_ms", self.arm.dial_timeout_ms),
            ("keepalive_ms", self.arm.keepalive_ms),
            ("read_timeout_ms", self.arm.read_timeout_ms),
        ] {
            if value == 0 || value > 60000 {
                return Err(invalid(format!("{} must be between 1 and 60000", name)));
            }
        }

        if self.controller.poll_interval_ms == 0 || self.controller.poll_interval_ms > 1000 {
            return Err(invalid("poll_interval_ms must be between 1 and 1000"));
        }

        if self.controller.read_timeout_ms == 0 || self.controller.read_timeout_ms > 60000 {
            return Err(invalid("controller read_timeout_ms must be between 1 and 60000"));
        }

        if !self.controller.radius.is_finite()
            || self.controller.radius <= 0.0
            || self.controller.radius > 1.0
        {
            return Err(invalid("radius must be greater than 0.0 and at most 1.0"));
        }

        if !(1..=4).contains(&self.controller.player_slot) {
            return Err(invalid("player_slot must be between 1 and 4"));
        }

        if self.indicator.decrement_ms == 0 {
            return Err(invalid("decrement_ms must be greater than 0"));
        }

        if self.indicator.floor_delay_ms == 0 {
            return Err(invalid("floor_delay_ms must be greater than 0"));
        }

        if self.indicator.initial_delay_ms < self.indicator.floor_delay_ms {
            return Err(invalid("initial_delay_ms must not be below floor_delay_ms"));
        }

        if self.indicator.safety_steps == 0 {
            return Err(invalid("safety_steps must be greater than 0"));
        }

        Ok(())
    }
}
