//! Serial line discipline for the ESP300 motion controller.
//!
//! The ESP300 speaks a plain ASCII protocol over RS-232: commands are
//! `<axis><opcode>[<argument>]` strings, replies are single CR-LF
//! terminated lines. Query replies are decimal floats, except for the
//! fault query `TB?` which returns a `code,timestamp,message` triple.
//!
//! This module owns the byte-level framing. The typed driver lives in
//! [`Esp300`](super::Esp300) and [`Axis`](super::Axis).
//!
//! # Example
//!
//! ```no_run
//! use hardware::esp300::{Esp300Config, SerialLink, Transport};
//!
//! let config = Esp300Config::default();
//! let mut link = SerialLink::autodetect(&config)?;
//!
//! let reply = link.query("1TP")?;
//! println!("axis 1 position: {}", reply.trim());
//! # Ok::<(), hardware::esp300::Esp300Error>(())
//! ```

use std::io::{Read, Write};

use serialport::SerialPort;
use tracing::{debug, info, trace};

use super::config::Esp300Config;
use super::error::{Esp300Error, Esp300Result};

/// Line terminator in both directions (ESP300 manual, RS-232 appendix).
const LINE_TERMINATOR: &str = "\r\n";

/// Transport seam for the ESP300 drivers.
///
/// Production code uses [`SerialLink`]. Only one command may ever be in
/// flight: `query` blocks until the reply line is read.
pub trait Transport {
    /// Send one command. No reply is expected.
    fn write(&mut self, command: &str) -> Esp300Result<()>;

    /// Send one command and block until its single-line reply arrives.
    fn query(&mut self, command: &str) -> Esp300Result<String>;
}

/// Exclusively-owned serial connection to one ESP300.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open `port_name` with the ESP300 serial parameters (8 data bits, no
    /// parity, one stop bit) and verify the instrument identity.
    ///
    /// # Errors
    ///
    /// [`Esp300Error::InstrumentNotFound`] if the device on the port does
    /// not report the expected `*IDN?` string.
    pub fn open(port_name: &str, config: &Esp300Config) -> Esp300Result<Self> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(config.timeout)
            .open()?;

        let mut link = Self { port };

        let identity = link.query("*IDN?")?;
        if identity != config.identity {
            return Err(Esp300Error::InstrumentNotFound {
                expected: config.identity.clone(),
            });
        }

        info!("connected to {} on {}", identity, port_name);
        Ok(link)
    }

    /// Scan every serial port on the machine for the configured instrument.
    ///
    /// Ports that fail to open or answer with a different identity are
    /// skipped; the first matching port wins.
    ///
    /// # Errors
    ///
    /// [`Esp300Error::NoPortsFound`] when the machine has no serial ports,
    /// [`Esp300Error::InstrumentNotFound`] when none of them carries the
    /// instrument.
    pub fn autodetect(config: &Esp300Config) -> Esp300Result<Self> {
        let ports = serialport::available_ports()?;
        if ports.is_empty() {
            return Err(Esp300Error::NoPortsFound);
        }

        debug!("scanning {} serial ports", ports.len());
        for candidate in &ports {
            match Self::open(&candidate.port_name, config) {
                Ok(link) => return Ok(link),
                Err(err) => debug!("skipping {}: {}", candidate.port_name, err),
            }
        }

        Err(Esp300Error::InstrumentNotFound {
            expected: config.identity.clone(),
        })
    }

    /// Read one CR-LF terminated reply line.
    fn read_line(&mut self) -> Esp300Result<String> {
        let mut buf = [0u8; 1];
        let mut bytes = Vec::new();

        loop {
            match self.port.read(&mut buf) {
                Ok(0) => return Err(Esp300Error::Timeout),
                Ok(_) => {
                    if buf[0] == b'\n' {
                        break;
                    }
                    bytes.push(buf[0]);
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    return Err(Esp300Error::Timeout);
                }
                Err(e) => return Err(e.into()),
            }
        }

        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }

        // The instrument is plain ASCII; map bytes straight to chars so a
        // stray high byte cannot poison the whole reply.
        let reply: String = bytes.iter().map(|&b| b as char).collect();
        trace!("recv: {:?}", reply);
        Ok(reply)
    }
}

impl Transport for SerialLink {
    fn write(&mut self, command: &str) -> Esp300Result<()> {
        debug!("send: {:?}", command);
        self.port.write_all(command.as_bytes())?;
        self.port.write_all(LINE_TERMINATOR.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }

    fn query(&mut self, command: &str) -> Esp300Result<String> {
        self.write(command)?;
        self.read_line()
    }
}
