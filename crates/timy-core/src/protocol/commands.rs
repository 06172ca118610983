//! Protocol commands
//!
//! Defines the TIMY command vocabulary and the one-shot initialization
//! sequence sent at the start of every capture session.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Commands understood by the TIMY 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Reinitialize the device and open the USB command channel
    TimyInit,
    /// `NSF` setting
    Nsf,
    /// `KL0` setting
    Kl0,
    /// `CHK1` setting
    Chk1,
    /// `PRE4` setting
    Pre4,
    /// `RR0` setting
    Rr0,
    /// `BE1` setting
    Be1,
    /// `DTS` delay, fixed at 00.02
    Dts,
    /// `DTF` delay, fixed at 00.02
    Dtf,
    /// Emulation mode 0 (native TIMY frames)
    EmulationOff,
    /// `PRIIGN1` printer setting
    PriIgn1,
    /// `PRILF` printer setting
    PriLf,
    /// `DTP` printer header line
    Dtp,
    /// `PS1` setting
    Ps1,
    /// `PROG` program selection
    Program,
    /// Clear the device memory
    Clear,
}

impl Command {
    /// Sequence sent once at the start of every session
    pub const DEFAULT_SEQUENCE: [Command; 3] =
        [Command::TimyInit, Command::EmulationOff, Command::Clear];

    /// Every known command, in configuration order
    pub const ALL: [Command; 16] = [
        Command::TimyInit,
        Command::Nsf,
        Command::Kl0,
        Command::Chk1,
        Command::Pre4,
        Command::Rr0,
        Command::Be1,
        Command::Dts,
        Command::Dtf,
        Command::EmulationOff,
        Command::PriIgn1,
        Command::PriLf,
        Command::Dtp,
        Command::Ps1,
        Command::Program,
        Command::Clear,
    ];

    /// Get the wire text of the command (without terminator)
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::TimyInit => "TIMYINIT",
            Command::Nsf => "NSF",
            Command::Kl0 => "KL0",
            Command::Chk1 => "CHK1",
            Command::Pre4 => "PRE4",
            Command::Rr0 => "RR0",
            Command::Be1 => "BE1",
            Command::Dts => "DTS00.02",
            Command::Dtf => "DTF00.02",
            Command::EmulationOff => "EMU0",
            Command::PriIgn1 => "PRIIGN1",
            Command::PriLf => "PRILF",
            Command::Dtp => "DTP------------",
            Command::Ps1 => "PS1",
            Command::Program => "PROG",
            Command::Clear => "CLR",
        }
    }

    /// Default sequence as owned strings
    pub fn default_sequence() -> Vec<String> {
        Self::DEFAULT_SEQUENCE
            .iter()
            .map(|c| c.as_str().to_string())
            .collect()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing text that is not a known command
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown TIMY command: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

/// Per-session queue of initialization commands.
///
/// Drained front to back once; never refilled.
#[derive(Debug, Clone)]
pub struct CommandSequencer {
    queue: VecDeque<String>,
}

impl CommandSequencer {
    /// Create a sequencer over the given commands
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// Take the next pending command
    pub fn next_command(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Commands still waiting to be sent
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether every command has been handed out
    pub fn is_drained(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for CommandSequencer {
    fn default() -> Self {
        Self::new(Command::DEFAULT_SEQUENCE.iter().map(|c| c.as_str()))
    }
}
