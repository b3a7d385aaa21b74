//! Three-axis controller: aggregate operations, fault readout and the
//! motion polling loop.
//!
//! The controller owns the transport and exactly three [`Axis`] instances;
//! every command on the bench is serialized through it. Motion completion
//! is detected by polling: a move is finished once every axis's velocity
//! reads zero again.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use hardware::esp300::{Esp300, Esp300Config};
//!
//! let mut controller = Esp300::connect(&Esp300Config::default())?;
//! println!("connected to {}", controller.identity());
//!
//! controller.perform_motion(
//!     &[23.0, 23.0, 23.0],
//!     &[0.05, 0.05, 0.05],
//!     false,
//!     Duration::from_millis(100),
//!     |_| {},
//! )?;
//! # Ok::<(), hardware::esp300::Esp300Error>(())
//! ```

use std::fmt;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use super::axis::{Axis, AxisStatus};
use super::config::{Esp300Config, AXIS_COUNT};
use super::error::{Esp300Error, Esp300Result};
use super::transport::{SerialLink, Transport};

/// Fault reported by the controller's `TB?` status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub code: u16,
    /// Faulting axis for three-digit codes; `None` for controller-wide
    /// faults.
    pub axis: Option<u8>,
    /// Timestamp string as reported by the instrument.
    pub timestamp: String,
    pub message: String,
}

impl Fault {
    /// Parse a `TB?` reply of the form `code,timestamp,message`.
    ///
    /// Code 0 means the fault buffer is clear. A code of 100 or more
    /// carries the offending axis in its leading digit; two-digit codes
    /// are controller-wide.
    fn parse(reply: &str) -> Esp300Result<Option<Fault>> {
        let mut parts = reply.splitn(3, ',');
        let (Some(code), Some(timestamp), Some(message)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(Esp300Error::InvalidResponse(format!(
                "malformed TB? reply: {reply:?}"
            )));
        };

        let code: u16 = code.trim().parse().map_err(|_| {
            Esp300Error::InvalidResponse(format!("malformed fault code in {reply:?}"))
        })?;
        if code == 0 {
            return Ok(None);
        }

        let axis = if code >= 100 {
            Some((code / 100) as u8)
        } else {
            None
        };

        Ok(Some(Fault {
            code,
            axis,
            timestamp: timestamp.trim().to_string(),
            message: message.trim().to_string(),
        }))
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.axis {
            Some(axis) => write!(
                f,
                "controller fault {} on axis {}: {}",
                self.code, axis, self.message
            ),
            None => write!(f, "controller fault {}: {}", self.code, self.message),
        }
    }
}

/// Driver for one ESP300 and its three actuator axes.
pub struct Esp300<T: Transport = SerialLink> {
    link: T,
    axes: [Axis; AXIS_COUNT],
    identity: String,
}

impl Esp300<SerialLink> {
    /// Connect to the instrument described by `config`.
    ///
    /// Opens the configured port, or scans all serial ports when none is
    /// pinned. Connection failures are fatal; there is no retry.
    pub fn connect(config: &Esp300Config) -> Esp300Result<Self> {
        let link = match &config.port {
            Some(port) => SerialLink::open(port, config)?,
            None => SerialLink::autodetect(config)?,
        };
        Self::with_link(link, config)
    }
}

impl<T: Transport> Esp300<T> {
    /// Build the driver on an already-open transport and take an initial
    /// status snapshot of every axis.
    pub fn with_link(mut link: T, config: &Esp300Config) -> Esp300Result<Self> {
        let identity = link.query("*IDN?")?;
        let axes = std::array::from_fn(|i| Axis::new((i + 1) as u8, config.home_offsets[i]));

        let mut controller = Self {
            link,
            axes,
            identity,
        };
        controller.refresh_all()?;
        Ok(controller)
    }

    /// `*IDN?` reply captured at connection time.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Refresh the cached status of every axis, in index order.
    pub fn refresh_all(&mut self) -> Esp300Result<()> {
        for axis in &mut self.axes {
            axis.refresh(&mut self.link)?;
        }
        Ok(())
    }

    /// Power on every axis, in index order.
    pub fn turn_on_all(&mut self) -> Esp300Result<()> {
        for axis in &mut self.axes {
            axis.turn_on(&mut self.link)?;
        }
        Ok(())
    }

    /// Power off every axis, in index order.
    pub fn turn_off_all(&mut self) -> Esp300Result<()> {
        for axis in &mut self.axes {
            axis.turn_off(&mut self.link)?;
        }
        Ok(())
    }

    /// Home every axis, in index order.
    pub fn home_all(&mut self) -> Esp300Result<()> {
        for axis in &mut self.axes {
            axis.home(&mut self.link)?;
        }
        Ok(())
    }

    /// Stop all axes with one broadcast command (`ST`, no axis prefix).
    pub fn stop_all(&mut self) -> Esp300Result<()> {
        self.link.write("ST")?;
        for axis in &mut self.axes {
            axis.settle();
        }
        Ok(())
    }

    /// True while at least one axis's last-refreshed velocity was nonzero.
    pub fn any_axis_moving(&self) -> bool {
        self.axes.iter().any(Axis::is_moving)
    }

    /// Query the fault buffer (`TB?`).
    pub fn read_fault(&mut self) -> Esp300Result<Option<Fault>> {
        let reply = self.link.query("TB?")?;
        Fault::parse(&reply)
    }

    /// Snapshot of every axis, in index order.
    pub fn status(&self) -> [AxisStatus; AXIS_COUNT] {
        std::array::from_fn(|i| self.axes[i].status())
    }

    /// Poll all axes until motion completes, feeding each snapshot to
    /// `observer`.
    ///
    /// Each cycle refreshes every axis and then checks the fault buffer; a
    /// reported fault aborts the loop immediately with
    /// [`Esp300Error::Fault`]. The observer sees one snapshot before the
    /// first poll and one showing the settled bench after the last.
    pub fn monitor_motion<F>(&mut self, interval: Duration, mut observer: F) -> Esp300Result<()>
    where
        F: FnMut(&[AxisStatus; AXIS_COUNT]),
    {
        observer(&self.status());

        loop {
            self.refresh_all()?;
            if let Some(fault) = self.read_fault()? {
                warn!("aborting motion: {fault}");
                return Err(Esp300Error::Fault(fault));
            }

            observer(&self.status());
            if !self.any_axis_moving() {
                return Ok(());
            }

            thread::sleep(interval);
        }
    }

    /// Run a complete motion: power on, home, program velocities and
    /// targets, poll to completion, power off.
    ///
    /// `positions` are destinations in mm, absolute from home or relative
    /// to the current position per `relative`; `velocities` in mm/s.
    pub fn perform_motion<F>(
        &mut self,
        positions: &[f64; AXIS_COUNT],
        velocities: &[f64; AXIS_COUNT],
        relative: bool,
        interval: Duration,
        observer: F,
    ) -> Esp300Result<()>
    where
        F: FnMut(&[AxisStatus; AXIS_COUNT]),
    {
        self.turn_on_all()?;
        self.home_all()?;
        self.refresh_all()?;

        for i in 0..AXIS_COUNT {
            let axis = &mut self.axes[i];
            axis.set_velocity(&mut self.link, velocities[i])?;
            if relative {
                axis.set_relative_position(&mut self.link, positions[i])?;
            } else {
                axis.set_absolute_position(&mut self.link, positions[i])?;
            }
        }

        self.monitor_motion(interval, observer)?;

        info!("motion complete, powering axes off");
        self.turn_off_all()
    }
}
