//! Single-axis command encoding and state tracking.
//!
//! Every operation maps to exactly one ASCII command; queries parse one
//! decimal float reply. Cached state is only ever updated after a
//! transport round-trip, never inferred.

use std::time::Instant;

use tracing::info;

use super::error::{Esp300Error, Esp300Result};
use super::transport::Transport;

/// Travel span of each actuator, in mm from its home offset.
pub const TRAVEL_SPAN_MM: f64 = 25.0;

/// Motion lifecycle of one axis.
///
/// `Commanded` covers the gap between a position command and the first
/// poll that sees the stage in motion. An axis is considered moving while
/// and only while its last-refreshed velocity was nonzero; there is no
/// separate motion-done query. Controller faults are not latched here,
/// the polling loop escalates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Idle,
    Commanded,
    Moving,
}

/// Point-in-time view of one axis, for display and assertions.
///
/// Fields that have never been refreshed from the instrument are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisStatus {
    pub axis: u8,
    pub position: Option<f64>,
    pub velocity: Option<f64>,
    pub destination: Option<f64>,
    pub desired_velocity: Option<f64>,
    /// Expected total travel time of the pending move, in seconds.
    pub travel_time: Option<f64>,
    /// Monotonic completion estimate of the pending move, 0 to 1.
    pub fraction_done: f64,
    pub moving: bool,
    pub powered: bool,
    pub homed: bool,
}

/// One linear actuator connected to a numbered D-Sub port.
///
/// Commands go out through the [`Transport`] passed to each method; the
/// owning controller serializes all access to it.
pub struct Axis {
    index: u8,
    home_offset: f64,
    position: Option<f64>,
    velocity: Option<f64>,
    desired_velocity: Option<f64>,
    destination: Option<f64>,
    travel_time: Option<f64>,
    commanded_at: Option<Instant>,
    fraction_done: f64,
    state: MotionState,
    powered: bool,
    homed: bool,
}

impl Axis {
    pub fn new(index: u8, home_offset: f64) -> Self {
        Self {
            index,
            home_offset,
            position: None,
            velocity: None,
            desired_velocity: None,
            destination: None,
            travel_time: None,
            commanded_at: None,
            fraction_done: 0.0,
            state: MotionState::Idle,
            powered: false,
            homed: false,
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn home_offset(&self) -> f64 {
        self.home_offset
    }

    /// Reachable position interval, `[home_offset, home_offset + 25]` mm.
    pub fn travel_range(&self) -> (f64, f64) {
        (self.home_offset, self.home_offset + TRAVEL_SPAN_MM)
    }

    pub fn motion_state(&self) -> MotionState {
        self.state
    }

    /// True while the last-refreshed velocity was nonzero.
    pub fn is_moving(&self) -> bool {
        self.state == MotionState::Moving
    }

    /// Query the current position relative to home (`TP`), in mm.
    pub fn get_position<T: Transport>(&mut self, link: &mut T) -> Esp300Result<f64> {
        let reply = link.query(&format!("{}TP", self.index))?;
        let position = parse_float(&reply)?;
        self.position = Some(position);
        Ok(position)
    }

    /// Query the current velocity (`TV`), in mm/s.
    pub fn get_velocity<T: Transport>(&mut self, link: &mut T) -> Esp300Result<f64> {
        let reply = link.query(&format!("{}TV", self.index))?;
        let velocity = parse_float(&reply)?;
        self.velocity = Some(velocity);
        Ok(velocity)
    }

    /// Query the programmed velocity (`DV`), in mm/s.
    ///
    /// Differs from [`get_velocity`](Self::get_velocity) while the stage is
    /// accelerating, stationary or homing (homing uses its own speed).
    pub fn get_desired_velocity<T: Transport>(&mut self, link: &mut T) -> Esp300Result<f64> {
        let reply = link.query(&format!("{}DV", self.index))?;
        let desired = parse_float(&reply)?;
        self.desired_velocity = Some(desired);
        Ok(desired)
    }

    /// Command an absolute move (`PA`), destination relative to home.
    ///
    /// Nothing is sent when validation fails: the axis must be homed and
    /// the destination inside [`travel_range`](Self::travel_range).
    pub fn set_absolute_position<T: Transport>(
        &mut self,
        link: &mut T,
        position: f64,
    ) -> Esp300Result<()> {
        self.check_target(position)?;
        link.write(&format!("{}PA{}", self.index, position))?;
        self.command_issued(position);
        info!("axis {} moving to {} mm", self.index, position);
        Ok(())
    }

    /// Command a move relative to the current position (`PR`).
    ///
    /// Queries the current position first; the computed absolute target is
    /// validated exactly like [`set_absolute_position`](Self::set_absolute_position).
    pub fn set_relative_position<T: Transport>(
        &mut self,
        link: &mut T,
        delta: f64,
    ) -> Esp300Result<()> {
        let current = self.get_position(link)?;
        let target = current + delta;
        self.check_target(target)?;
        link.write(&format!("{}PR{}", self.index, delta))?;
        self.command_issued(target);
        info!("axis {} moving by {} mm to {} mm", self.index, delta, target);
        Ok(())
    }

    /// Program the move velocity (`VA`), in mm/s.
    pub fn set_velocity<T: Transport>(&mut self, link: &mut T, velocity: f64) -> Esp300Result<()> {
        if velocity <= 0.0 {
            return Err(Esp300Error::InvalidVelocity {
                axis: self.index,
                velocity,
            });
        }
        link.write(&format!("{}VA{}", self.index, velocity))?;
        self.desired_velocity = Some(velocity);
        Ok(())
    }

    /// Power the motor on (`MO`). The axis can only move while powered.
    pub fn turn_on<T: Transport>(&mut self, link: &mut T) -> Esp300Result<()> {
        link.write(&format!("{}MO", self.index))?;
        self.powered = true;
        Ok(())
    }

    /// Power the motor off (`MF`).
    pub fn turn_off<T: Transport>(&mut self, link: &mut T) -> Esp300Result<()> {
        link.write(&format!("{}MF", self.index))?;
        self.powered = false;
        Ok(())
    }

    /// Run the homing search (`OR0`) to establish the zero position.
    ///
    /// The homed latch is set and stays set for the life of the axis.
    pub fn home<T: Transport>(&mut self, link: &mut T) -> Esp300Result<()> {
        link.write(&format!("{}OR0", self.index))?;
        self.homed = true;
        self.destination = None;
        self.travel_time = None;
        self.commanded_at = None;
        self.fraction_done = 0.0;
        info!("axis {} homing", self.index);
        Ok(())
    }

    /// Stop this axis with the programmed deceleration (`ST`).
    pub fn stop<T: Transport>(&mut self, link: &mut T) -> Esp300Result<()> {
        link.write(&format!("{}ST", self.index))?;
        self.settle();
        Ok(())
    }

    /// Motion ended by an explicit stop rather than a zero-velocity poll.
    pub(crate) fn settle(&mut self) {
        self.state = MotionState::Idle;
    }

    /// Re-query position, velocity and programmed velocity, then advance
    /// the motion state machine.
    ///
    /// A commanded axis becomes `Moving` the first time its velocity polls
    /// nonzero and `Idle` again once it returns to zero, at which point the
    /// completion estimate snaps to 1.
    pub fn refresh<T: Transport>(&mut self, link: &mut T) -> Esp300Result<()> {
        self.get_position(link)?;
        let velocity = self.get_velocity(link)?;
        self.get_desired_velocity(link)?;

        if velocity != 0.0 {
            self.state = MotionState::Moving;
        } else if self.state == MotionState::Moving {
            self.state = MotionState::Idle;
            if self.destination.is_some() {
                self.fraction_done = 1.0;
            }
        }

        if self.state == MotionState::Moving {
            if let (Some(since), Some(total)) = (self.commanded_at, self.travel_time) {
                if total > 0.0 {
                    let done = since.elapsed().as_secs_f64() / total;
                    self.fraction_done = self.fraction_done.max(done.min(1.0));
                }
            }
        }

        Ok(())
    }

    /// Snapshot for display; rendering is someone else's job.
    pub fn status(&self) -> AxisStatus {
        AxisStatus {
            axis: self.index,
            position: self.position,
            velocity: self.velocity,
            destination: self.destination,
            desired_velocity: self.desired_velocity,
            travel_time: self.travel_time,
            fraction_done: self.fraction_done,
            moving: self.is_moving(),
            powered: self.powered,
            homed: self.homed,
        }
    }

    fn check_target(&self, target: f64) -> Esp300Result<()> {
        if !self.homed {
            return Err(Esp300Error::NotHomed { axis: self.index });
        }
        let (min, max) = self.travel_range();
        if target < min || target > max {
            return Err(Esp300Error::PositionOutOfRange {
                axis: self.index,
                position: target,
                min,
                max,
            });
        }
        Ok(())
    }

    fn command_issued(&mut self, destination: f64) {
        self.travel_time = match (self.position, self.desired_velocity) {
            (Some(position), Some(velocity)) if velocity > 0.0 => {
                Some((destination - position).abs() / velocity)
            }
            _ => None,
        };
        self.destination = Some(destination);
        self.commanded_at = Some(Instant::now());
        self.fraction_done = 0.0;
        self.state = MotionState::Commanded;
    }
}

fn parse_float(reply: &str) -> Esp300Result<f64> {
    reply
        .trim()
        .parse()
        .map_err(|_| Esp300Error::InvalidResponse(format!("expected a number, got {reply:?}")))
}
