//! Test doubles for the ESP300 drivers.
//!
//! [`ScriptedLink`] is a record/replay transport for unit tests.
//! [`BenchSim`] is a small behavioral model of the bench used by the
//! controller tests: a position command starts a move that runs for a
//! fixed number of velocity polls.

use std::collections::VecDeque;

use super::config::Esp300Config;
use super::error::Esp300Result;
use super::transport::Transport;

/// Records every command and answers queries from a scripted reply queue.
#[derive(Default)]
pub(crate) struct ScriptedLink {
    pub sent: Vec<String>,
    replies: VecDeque<String>,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&mut self, reply: &str) {
        self.replies.push_back(reply.to_string());
    }
}

impl Transport for ScriptedLink {
    fn write(&mut self, command: &str) -> Esp300Result<()> {
        self.sent.push(command.to_string());
        Ok(())
    }

    fn query(&mut self, command: &str) -> Esp300Result<String> {
        self.sent.push(command.to_string());
        let reply = self
            .replies
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted reply for {command:?}"));
        Ok(reply)
    }
}

/// How many velocity polls a simulated move lasts.
const MOVE_POLLS: u32 = 3;

/// Programmed velocity of a freshly started simulated axis, mm/s.
const DEFAULT_VELOCITY: f64 = 0.4;

struct SimAxis {
    position: f64,
    target: f64,
    velocity_setting: f64,
    polls_left: u32,
    powered: bool,
    homed: bool,
}

impl Default for SimAxis {
    fn default() -> Self {
        Self {
            position: 0.0,
            target: 0.0,
            velocity_setting: DEFAULT_VELOCITY,
            polls_left: 0,
            powered: false,
            homed: false,
        }
    }
}

/// Behavioral model of the three-axis bench.
///
/// The reference search is instantaneous and does not move the simulated
/// stage. A position command runs for [`MOVE_POLLS`] velocity polls,
/// advancing the stage toward its target on each poll; velocity reads
/// zero once it has arrived.
pub(crate) struct BenchSim {
    axes: [SimAxis; 3],
    fault: Option<String>,
    identity: String,
    pub sent: Vec<String>,
}

impl BenchSim {
    pub fn new() -> Self {
        Self {
            axes: Default::default(),
            fault: None,
            identity: Esp300Config::default().identity,
            sent: Vec::new(),
        }
    }

    /// Seed the position of one axis (1-based), before or between moves.
    pub fn set_position(&mut self, axis: u8, position: f64) {
        self.axes[usize::from(axis) - 1].position = position;
    }

    /// Start a move directly, as if commanded out of band.
    pub fn begin_move(&mut self, axis: u8, target: f64) {
        let ax = &mut self.axes[usize::from(axis) - 1];
        ax.target = target;
        ax.polls_left = MOVE_POLLS;
    }

    /// Arm the fault buffer; the next `TB?` query drains it.
    pub fn inject_fault(&mut self, reply: &str) {
        self.fault = Some(reply.to_string());
    }

    /// Motor power state of one axis (1-based).
    pub fn powered(&self, axis: u8) -> bool {
        self.axes[usize::from(axis) - 1].powered
    }

    /// Whether one axis (1-based) has run its reference search.
    pub fn homed(&self, axis: u8) -> bool {
        self.axes[usize::from(axis) - 1].homed
    }

    fn split(command: &str) -> (Option<usize>, &str, &str) {
        let digits = command.chars().take_while(char::is_ascii_digit).count();
        let axis = command[..digits].parse().ok();
        let rest = &command[digits..];
        let cut = rest.len().min(2);
        (axis, &rest[..cut], &rest[cut..])
    }

    fn axis_mut(&mut self, axis: Option<usize>, command: &str) -> &mut SimAxis {
        let n = axis.unwrap_or_else(|| panic!("missing axis in {command:?}"));
        &mut self.axes[n - 1]
    }
}

impl Transport for BenchSim {
    fn write(&mut self, command: &str) -> Esp300Result<()> {
        self.sent.push(command.to_string());
        let (axis, op, arg) = Self::split(command);
        match op {
            "ST" if axis.is_none() => {
                for ax in &mut self.axes {
                    ax.polls_left = 0;
                }
            }
            "PA" => {
                let target: f64 = arg.parse().unwrap();
                let ax = self.axis_mut(axis, command);
                ax.target = target;
                ax.polls_left = MOVE_POLLS;
            }
            "PR" => {
                let delta: f64 = arg.parse().unwrap();
                let ax = self.axis_mut(axis, command);
                ax.target = ax.position + delta;
                ax.polls_left = MOVE_POLLS;
            }
            "VA" => self.axis_mut(axis, command).velocity_setting = arg.parse().unwrap(),
            "MO" => self.axis_mut(axis, command).powered = true,
            "MF" => self.axis_mut(axis, command).powered = false,
            "OR" => self.axis_mut(axis, command).homed = true,
            "ST" => self.axis_mut(axis, command).polls_left = 0,
            _ => panic!("unexpected command {command:?}"),
        }
        Ok(())
    }

    fn query(&mut self, command: &str) -> Esp300Result<String> {
        self.sent.push(command.to_string());
        if command == "*IDN?" {
            return Ok(self.identity.clone());
        }
        if command == "TB?" {
            return Ok(self
                .fault
                .take()
                .unwrap_or_else(|| "0,00:00:00,NO ERROR".to_string()));
        }

        let (axis, op, _) = Self::split(command);
        let ax = self.axis_mut(axis, command);
        let reply = match op {
            "TP" => format!("{:.7}", ax.position),
            "TV" => {
                if ax.polls_left > 0 {
                    let step = (ax.target - ax.position) / f64::from(ax.polls_left);
                    ax.position += step;
                    ax.polls_left -= 1;
                    format!("{:.7}", ax.velocity_setting)
                } else {
                    format!("{:.7}", 0.0)
                }
            }
            "DV" => format!("{:.7}", ax.velocity_setting),
            _ => panic!("unexpected query {command:?}"),
        };
        Ok(reply)
    }
}
