//! Byte-stream transports
//!
//! Both the wired console and the wireless link are driven through [`Transport`]. The wired
//! side only ever writes; the wireless side also reports client presence and delivers inbound
//! command lines.

use core::fmt;

use heapless::{String, Vec};

use crate::config::LINE_CAPACITY;

pub type Line = String<LINE_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum TransportError {
    Write,
    Read,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Write => write!(f, "transport write failed"),
            TransportError::Read => write!(f, "transport read failed"),
        }
    }
}

pub trait Transport {
    /// Whether a peer is present. Wired transports always are.
    fn is_available(&mut self) -> bool {
        true
    }

    /// Whether a complete inbound line is buffered.
    fn has_pending_input(&mut self) -> bool {
        false
    }

    fn read_line(&mut self) -> Option<Line> {
        None
    }

    /// Write `line` followed by `\n`.
    fn write_line(&mut self, line: &str) -> Result<(), TransportError>;
}

/// An absent transport: never available, swallows writes.
impl<T: Transport> Transport for Option<T> {
    fn is_available(&mut self) -> bool {
        self.as_mut().is_some_and(|t| t.is_available())
    }

    fn has_pending_input(&mut self) -> bool {
        self.as_mut().is_some_and(|t| t.has_pending_input())
    }

    fn read_line(&mut self) -> Option<Line> {
        self.as_mut().and_then(|t| t.read_line())
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        match self {
            Some(t) => t.write_line(line),
            None => Ok(()),
        }
    }
}

/// Accumulates inbound bytes until a `\n` completes a line.
///
/// A line longer than the buffer is dropped whole; bytes up to its terminating newline are
/// discarded as they arrive. Complete lines are never dropped to make room.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8, LINE_CAPACITY>,
    discarding: bool,
    overflows: u32,
}

impl LineBuffer {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            discarding: false,
            overflows: 0,
        }
    }

    /// Append inbound bytes and return how many were taken. Bytes are refused only while the
    /// buffer is full of complete lines; offer them again once lines have been taken.
    pub fn extend(&mut self, bytes: &[u8]) -> usize {
        for (i, &b) in bytes.iter().enumerate() {
            if self.discarding {
                if b == b'\n' {
                    self.discarding = false;
                }
                continue;
            }
            if self.buf.push(b).is_err() {
                return i;
            }
            if self.buf.is_full() && !self.has_line() {
                self.discard_line();
            }
        }
        bytes.len()
    }

    /// Free space, in bytes.
    pub fn room(&self) -> usize {
        self.buf.capacity() - self.buf.len()
    }

    // The buffer holds one unterminated line with no room left for its newline.
    fn discard_line(&mut self) {
        self.buf.clear();
        self.discarding = true;
        self.overflows += 1;
        crate::log_warn!("inbound line exceeds {} bytes, discarding", LINE_CAPACITY);
    }

    pub fn has_line(&self) -> bool {
        self.buf.contains(&b'\n')
    }

    /// Remove and return the oldest complete line without its terminator. Lines that are not
    /// valid UTF-8 are consumed and skipped.
    pub fn take_line(&mut self) -> Option<Line> {
        loop {
            let pos = self.buf.iter().position(|&b| b == b'\n')?;
            let line = core::str::from_utf8(&self.buf[..pos])
                .ok()
                .and_then(|s| Line::try_from(s.trim_end_matches('\r')).ok());

            let rest_len = self.buf.len() - pos - 1;
            self.buf.copy_within(pos + 1.., 0);
            self.buf.truncate(rest_len);

            match line {
                Some(line) => return Some(line),
                None => crate::log_warn!("dropping non-UTF-8 inbound line"),
            }
        }
    }

    pub fn overflows(&self) -> u32 {
        self.overflows
    }
}
