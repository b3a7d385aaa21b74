//! Startup configuration for the bench controller.

use std::time::Duration;

/// Number of actuator axes on the controller (D-Sub ports 1-3).
pub const AXIS_COUNT: usize = 3;

/// Serial settings and axis layout, bound once at startup.
#[derive(Debug, Clone)]
pub struct Esp300Config {
    /// Open this port directly instead of scanning for the instrument.
    pub port: Option<String>,
    /// Baud rate. The instrument ships configured for 19200.
    pub baud_rate: u32,
    /// Exact `*IDN?` reply that identifies the instrument.
    pub identity: String,
    /// Read timeout for a single reply line.
    pub timeout: Duration,
    /// Home offset per axis, in mm. All commanded positions are measured
    /// relative to these.
    pub home_offsets: [f64; AXIS_COUNT],
}

impl Default for Esp300Config {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 19200,
            identity: "ESP300 Version 3.08 09/09/02".to_string(),
            timeout: Duration::from_secs(5),
            home_offsets: [0.0; AXIS_COUNT],
        }
    }
}
