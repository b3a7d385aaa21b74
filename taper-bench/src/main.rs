//! Command-line taper pull.
//!
//! Drives the three bench axes to their target positions while reporting
//! progress, and leaves the bench stopped and unpowered if anything goes
//! wrong along the way.

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use hardware::esp300::{ConsoleTable, Esp300, Esp300Config, AXIS_COUNT};
use tracing::{error, info};

/// Run a taper pull on the three-axis motion bench.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Target position for each axis, in mm from home.
    #[arg(long, value_delimiter = ',', num_args = AXIS_COUNT, default_value = "23,23,23")]
    positions: Vec<f64>,

    /// Pull velocity for each axis, in mm/s.
    #[arg(long, value_delimiter = ',', num_args = AXIS_COUNT, default_value = "0.05,0.05,0.05")]
    velocities: Vec<f64>,

    /// Interpret positions as offsets from the current position.
    #[arg(long)]
    relative: bool,

    /// Serial port of the controller; scans all ports when omitted.
    #[arg(long)]
    port: Option<String>,

    /// Poll interval of the monitor loop, in milliseconds.
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    /// Home offset for each axis, in mm.
    #[arg(long, value_delimiter = ',', num_args = AXIS_COUNT, default_value = "0,0,0")]
    home_offsets: Vec<f64>,

    /// Scroll status lines instead of redrawing them in place.
    #[arg(long)]
    no_overwrite: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = Esp300Config {
        port: args.port.clone(),
        home_offsets: to_array(&args.home_offsets)?,
        ..Esp300Config::default()
    };
    let positions = to_array(&args.positions)?;
    let velocities = to_array(&args.velocities)?;

    info!("Connecting to the motion controller...");
    let mut controller = Esp300::connect(&config)?;
    info!("Connected: {}", controller.identity());

    let mut table = ConsoleTable::new(!args.no_overwrite);
    let result = controller.perform_motion(
        &positions,
        &velocities,
        args.relative,
        Duration::from_millis(args.interval_ms),
        |statuses| table.print(statuses),
    );

    if let Err(err) = result {
        error!("motion failed: {err}");
        unwind(&mut controller);
        return Err(err.into());
    }

    info!("Pull complete.");
    Ok(())
}

/// Leave the bench stopped and unpowered after a failure.
fn unwind(controller: &mut Esp300) {
    if let Err(err) = controller.stop_all() {
        error!("stop on unwind failed: {err}");
    }
    if let Err(err) = controller.turn_off_all() {
        error!("power-off on unwind failed: {err}");
    }
}

fn to_array(values: &[f64]) -> Result<[f64; AXIS_COUNT]> {
    values
        .try_into()
        .map_err(|_| anyhow!("expected {AXIS_COUNT} comma-separated values"))
}
