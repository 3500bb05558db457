//! Serial transports
//!
//! [`SerialConsole`] is the wired debug port. [`BluetoothLink`] sits on an HC-05 style module
//! whose STATE pin goes high while a client is paired.

use embedded_hal::digital::v2::InputPin;
use embedded_io::{Read, ReadReady, Write};

use crate::transport::{Line, LineBuffer, Transport, TransportError};

fn write_terminated<T: Write>(port: &mut T, line: &str) -> Result<(), TransportError> {
    port.write_all(line.as_bytes())
        .and_then(|_| port.write_all(b"\n"))
        .map_err(|_| TransportError::Write)
}

pub struct SerialConsole<T> {
    tx: T,
}

impl<T: Write> SerialConsole<T> {
    pub fn new(tx: T) -> Self {
        Self { tx }
    }
}

impl<T: Write> Transport for SerialConsole<T> {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        write_terminated(&mut self.tx, line)
    }
}

pub struct BluetoothLink<T, P> {
    uart: T,
    state: P,
    inbound: LineBuffer,
}

impl<T, P> BluetoothLink<T, P>
where
    T: Read + ReadReady + Write,
    P: InputPin,
{
    pub fn new(uart: T, state: P) -> Self {
        Self {
            uart,
            state,
            inbound: LineBuffer::new(),
        }
    }

    /// Move buffered UART bytes into the line buffer without blocking. Bytes that do not fit
    /// stay in the UART ring until lines have been taken.
    fn fill(&mut self) {
        let mut chunk = [0u8; 32];
        loop {
            let room = self.inbound.room().min(chunk.len());
            if room == 0 {
                return;
            }
            match self.uart.read_ready() {
                Ok(true) => {}
                Ok(false) => return,
                Err(_) => {
                    crate::log_warn!("bluetooth rx error");
                    return;
                }
            }
            match self.uart.read(&mut chunk[..room]) {
                Ok(0) => return,
                Ok(n) => {
                    self.inbound.extend(&chunk[..n]);
                }
                Err(_) => {
                    crate::log_warn!("bluetooth rx error");
                    return;
                }
            }
        }
    }
}

impl<T, P> Transport for BluetoothLink<T, P>
where
    T: Read + ReadReady + Write,
    P: InputPin,
{
    fn is_available(&mut self) -> bool {
        self.state.is_high().unwrap_or(false)
    }

    fn has_pending_input(&mut self) -> bool {
        self.fill();
        self.inbound.has_line()
    }

    fn read_line(&mut self) -> Option<Line> {
        self.fill();
        self.inbound.take_line()
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        write_terminated(&mut self.uart, line)
    }
}
