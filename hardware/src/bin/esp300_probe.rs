//! Raw link smoke test - minimal queries to debug ESP300 communication.

use anyhow::Result;
use hardware::esp300::{Esp300Config, SerialLink, Transport, AXIS_COUNT};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Esp300Config::default();
    info!("Scanning serial ports for the motion controller...");
    let mut link = SerialLink::autodetect(&config)?;

    info!("Sending *IDN? query...");
    let reply = link.query("*IDN?")?;
    info!("Got: {}", reply.trim());

    for axis in 1..=AXIS_COUNT {
        let reply = link.query(&format!("{axis}TP"))?;
        info!("Axis {axis} position: {}", reply.trim());
    }

    info!("Sending TB? query...");
    let reply = link.query("TB?")?;
    info!("Fault buffer: {}", reply.trim());

    info!("Done!");
    Ok(())
}
