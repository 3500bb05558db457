//! Inbound command handling
//!
//! Commands arrive as text lines on the wireless link and are only read between bursts.
//! Anything outside the recognized set is ignored without a reply.

use crate::app::Station;
use crate::clock::SampleClock;
use crate::sensor::SensorSource;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum Command {
    /// Capture one framed burst.
    Collect,
}

impl Command {
    /// Trim surrounding whitespace and match case-sensitively.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "COLLECT" => Some(Command::Collect),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct CommandDispatcher {
    completed: u32,
    aborted: u32,
}

impl CommandDispatcher {
    pub const fn new() -> Self {
        Self {
            completed: 0,
            aborted: 0,
        }
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn aborted(&self) -> u32 {
        self.aborted
    }

    /// Read at most one pending line and act on it. Returns the command that ran, if any.
    pub fn poll<const N: usize, C, S, W, L>(
        &mut self,
        station: &mut Station<C, S, W, L>,
    ) -> Option<Command>
    where
        C: SampleClock,
        S: SensorSource,
        W: Transport,
        L: Transport,
    {
        let wireless = station.telemetry.wireless_mut();
        if !wireless.has_pending_input() {
            return None;
        }
        let line = wireless.read_line()?;

        let Some(command) = Command::parse(&line) else {
            crate::log_debug!("ignoring inbound line ({} bytes)", line.len());
            return None;
        };

        match command {
            Command::Collect => match station.collect::<N>() {
                Ok(_) => self.completed += 1,
                Err(_) => self.aborted += 1,
            },
        }
        Some(command)
    }
}
