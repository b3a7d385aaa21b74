//! Test binary for ESP300 motion controller communication.
//!
//! Finds the controller on a serial port, queries identity and per-axis
//! status.

use anyhow::Result;
use hardware::esp300::{Esp300, Esp300Config};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Esp300Config::default();
    info!("Connecting to the ESP300...");
    let mut controller = Esp300::connect(&config)?;

    info!("Device ID: {}", controller.identity());

    for status in controller.status() {
        let position = status.position.unwrap_or(f64::NAN);
        let velocity = status.velocity.unwrap_or(f64::NAN);
        info!(
            "Axis {}: pos {:.4} mm, vel {:.4} mm/s, powered={}, homed={}, moving={}",
            status.axis, position, velocity, status.powered, status.homed, status.moving
        );
    }

    if let Some(fault) = controller.read_fault()? {
        info!("Fault buffer: {fault}");
    }

    info!("Done!");
    Ok(())
}
