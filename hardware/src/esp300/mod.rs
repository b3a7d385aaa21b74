mod axis;
mod config;
mod controller;
mod error;
mod monitor;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use axis::{Axis, AxisStatus, MotionState, TRAVEL_SPAN_MM};
pub use config::{Esp300Config, AXIS_COUNT};
pub use controller::{Esp300, Fault};
pub use error::{Esp300Error, Esp300Result};
pub use monitor::ConsoleTable;
pub use transport::{SerialLink, Transport};
