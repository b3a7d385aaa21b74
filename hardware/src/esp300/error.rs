//! Error type shared by the ESP300 transport and drivers.

use thiserror::Error;

use super::controller::Fault;

/// Errors from ESP300 communication and motion commands.
///
/// Connection-time errors (`NoPortsFound`, `InstrumentNotFound`) are fatal;
/// there is no retry. `Fault` carries the controller's own error report and
/// aborts whatever motion was in progress. Callers are expected to stop and
/// power off all axes after any uncaught failure.
#[derive(Error, Debug)]
pub enum Esp300Error {
    /// Low-level I/O failure on the serial line.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be enumerated or opened.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// No reply line arrived within the configured timeout.
    #[error("timeout waiting for reply")]
    Timeout,

    /// The machine has no serial ports at all.
    #[error("no serial ports found")]
    NoPortsFound,

    /// No attached device answered `*IDN?` with the expected identity.
    #[error("no instrument identified itself as {expected:?}")]
    InstrumentNotFound { expected: String },

    /// Reply did not have the expected shape.
    #[error("invalid reply: {0}")]
    InvalidResponse(String),

    /// Commanded position falls outside the axis travel range.
    #[error("axis {axis}: position {position} mm outside [{min}, {max}] mm")]
    PositionOutOfRange {
        axis: u8,
        position: f64,
        min: f64,
        max: f64,
    },

    /// Position command issued before the axis was homed.
    #[error("axis {axis}: not homed")]
    NotHomed { axis: u8 },

    /// Velocity must be strictly positive.
    #[error("axis {axis}: velocity {velocity} mm/s must be positive")]
    InvalidVelocity { axis: u8, velocity: f64 },

    /// The controller reported a fault via `TB?`.
    #[error("{0}")]
    Fault(Fault),
}

/// Result type for ESP300 operations.
pub type Esp300Result<T> = Result<T, Esp300Error>;
