//! Telemetry sink
//!
//! Fans every sample line and status message out to the wired console and, while the link is
//! up, to the wireless client. Nothing is queued for a disconnected client.
//!
//! Sample wire format: `ax,ay,az,gx,gy,gz,ts\n`, six floats with exactly six fractional digits
//! followed by the unsigned microsecond timestamp.

use core::fmt::{self, Write as _};

use heapless::String;

use crate::sample::{Sample, Vector3};
use crate::supervisor::LinkState;
use crate::transport::Transport;

pub const DATA_START: &str = "DATA_START";
pub const DATA_END: &str = "DATA_END";
pub const DATA_ABORT: &str = "DATA_ABORT";

const SAMPLE_LINE_CAPACITY: usize = 128;

pub type SampleLine = String<SAMPLE_LINE_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum TelemetryError {
    /// Rendered line did not fit the line buffer.
    LineOverflow,
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::LineOverflow => write!(f, "sample line overflow"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum ParseError {
    FieldCount,
    Float { field: usize },
    Timestamp,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::FieldCount => write!(f, "expected 7 comma-separated fields"),
            ParseError::Float { field } => write!(f, "field {} is not a number", field),
            ParseError::Timestamp => write!(f, "timestamp is not an unsigned integer"),
        }
    }
}

pub fn format_sample(sample: &Sample) -> Result<SampleLine, TelemetryError> {
    let mut line = SampleLine::new();
    write!(
        line,
        "{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{}",
        sample.accel.x,
        sample.accel.y,
        sample.accel.z,
        sample.gyro.x,
        sample.gyro.y,
        sample.gyro.z,
        sample.timestamp_us
    )
    .map_err(|_| TelemetryError::LineOverflow)?;
    Ok(line)
}

/// Parse one sample line, with or without its line terminator.
pub fn parse_sample_line(line: &str) -> Result<Sample, ParseError> {
    let mut fields = line.trim_end_matches(['\r', '\n']).split(',');
    let mut values = [0f32; 6];
    for (i, value) in values.iter_mut().enumerate() {
        let field = fields.next().ok_or(ParseError::FieldCount)?;
        *value = field
            .trim()
            .parse()
            .map_err(|_| ParseError::Float { field: i })?;
    }
    let timestamp_us = fields
        .next()
        .ok_or(ParseError::FieldCount)?
        .trim()
        .parse()
        .map_err(|_| ParseError::Timestamp)?;
    if fields.next().is_some() {
        return Err(ParseError::FieldCount);
    }
    Ok(Sample {
        timestamp_us,
        accel: Vector3::new(values[0], values[1], values[2]),
        gyro: Vector3::new(values[3], values[4], values[5]),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelemetryCounters {
    pub wired_lines: u32,
    pub wireless_lines: u32,
    pub wireless_suppressed: u32,
    pub write_errors: u32,
    pub dropped_lines: u32,
}

/// Dual-write sink over a wired transport `W` and a wireless transport `L`.
pub struct Telemetry<W, L> {
    wired: W,
    wireless: L,
    link: LinkState,
    counters: TelemetryCounters,
}

impl<W: Transport, L: Transport> Telemetry<W, L> {
    /// The link starts down; the connection supervisor raises it.
    pub fn new(wired: W, wireless: L) -> Self {
        Self {
            wired,
            wireless,
            link: LinkState::Disconnected,
            counters: TelemetryCounters::default(),
        }
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    pub(crate) fn set_link(&mut self, link: LinkState) {
        self.link = link;
    }

    pub fn wired(&self) -> &W {
        &self.wired
    }

    pub fn wireless(&self) -> &L {
        &self.wireless
    }

    pub fn wireless_mut(&mut self) -> &mut L {
        &mut self.wireless
    }

    pub fn counters(&self) -> TelemetryCounters {
        self.counters
    }

    /// A sample that cannot be rendered is kept off the wire and reported to the caller.
    pub fn emit(&mut self, sample: &Sample) -> Result<(), TelemetryError> {
        match format_sample(sample) {
            Ok(line) => {
                self.write_all(&line);
                Ok(())
            }
            Err(e) => {
                self.counters.dropped_lines += 1;
                crate::log_warn!("dropping sample {}: {}", sample.timestamp_us, e);
                Err(e)
            }
        }
    }

    /// Side-channel text, same fan-out as sample lines.
    pub fn status(&mut self, message: &str) {
        crate::log_info!("status: {}", message);
        self.write_all(message);
    }

    fn write_all(&mut self, line: &str) {
        match self.wired.write_line(line) {
            Ok(()) => self.counters.wired_lines += 1,
            Err(e) => {
                self.counters.write_errors += 1;
                crate::log_warn!("wired: {}", e);
            }
        }

        if self.link != LinkState::Connected {
            self.counters.wireless_suppressed += 1;
            return;
        }
        match self.wireless.write_line(line) {
            Ok(()) => self.counters.wireless_lines += 1,
            Err(e) => {
                self.counters.write_errors += 1;
                crate::log_warn!("wireless: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    fn sample(ts: u32) -> Sample {
        Sample {
            timestamp_us: ts,
            accel: Vector3::new(0.123456, -9.80665, 3.5),
            gyro: Vector3::new(-0.0174533, 0.0, 1.25),
        }
    }

    #[test]
    fn test_format_sample_wire_format() {
        let line = format_sample(&sample(1_234_567)).unwrap();
        assert_eq!(
            line.as_str(),
            "0.123456,-9.806650,3.500000,-0.017453,0.000000,1.250000,1234567"
        );
    }

    #[test]
    fn test_format_parse_round_trip() {
        let values = [
            sample(0),
            sample(u32::MAX),
            Sample {
                timestamp_us: 10_000,
                accel: Vector3::new(19.613_297, -0.000_001, 7.777_777),
                gyro: Vector3::new(8.726_646, -8.726_646, 0.333_333_3),
            },
        ];
        for original in values {
            let line = format_sample(&original).unwrap();
            let parsed = parse_sample_line(&line).unwrap();
            assert_eq!(parsed.timestamp_us, original.timestamp_us);
            let pairs = [
                (parsed.accel.x, original.accel.x),
                (parsed.accel.y, original.accel.y),
                (parsed.accel.z, original.accel.z),
                (parsed.gyro.x, original.gyro.x),
                (parsed.gyro.y, original.gyro.y),
                (parsed.gyro.z, original.gyro.z),
            ];
            for (got, want) in pairs {
                // 6-decimal rounding plus f32 representation error
                assert!((got - want).abs() <= 1e-6 + want.abs() * f32::EPSILON, "{got} vs {want}");
            }
        }
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert_eq!(parse_sample_line("1,2,3"), Err(ParseError::FieldCount));
        assert_eq!(
            parse_sample_line("1,2,3,4,5,6,7,8"),
            Err(ParseError::FieldCount)
        );
        assert_eq!(
            parse_sample_line("1,2,x,4,5,6,7"),
            Err(ParseError::Float { field: 2 })
        );
        assert_eq!(
            parse_sample_line("1,2,3,4,5,6,-7"),
            Err(ParseError::Timestamp)
        );
        assert!(parse_sample_line("1,2,3,4,5,6,7\r\n").is_ok());
    }

    #[test]
    fn test_oversized_values_are_dropped_not_truncated() {
        let mut huge = sample(5);
        huge.accel = Vector3::new(f32::MAX, f32::MAX, f32::MAX);
        assert_eq!(format_sample(&huge), Err(TelemetryError::LineOverflow));

        let mut telemetry = Telemetry::new(MockTransport::wired(), MockTransport::connected());
        assert_eq!(telemetry.emit(&huge), Err(TelemetryError::LineOverflow));
        assert!(telemetry.wired().written().is_empty());
        assert_eq!(telemetry.counters().dropped_lines, 1);
    }

    #[test]
    fn test_wireless_suppressed_while_disconnected() {
        let mut telemetry = Telemetry::new(MockTransport::wired(), MockTransport::connected());
        assert_eq!(telemetry.link(), LinkState::Disconnected);

        for ts in 0..5 {
            telemetry.emit(&sample(ts * 10_000)).unwrap();
        }
        assert_eq!(telemetry.wired().written().len(), 5);
        assert!(telemetry.wireless().written().is_empty());
        assert_eq!(telemetry.counters().wireless_suppressed, 5);
    }

    #[test]
    fn test_connected_writes_both_transports() {
        let mut telemetry = Telemetry::new(MockTransport::wired(), MockTransport::connected());
        telemetry.set_link(LinkState::Connected);
        telemetry.emit(&sample(7)).unwrap();
        telemetry.status(DATA_END);

        let expected = [format_sample(&sample(7)).unwrap().to_string(), DATA_END.to_string()];
        assert_eq!(telemetry.wired().written(), &expected);
        assert_eq!(telemetry.wireless().written(), &expected);
    }

    #[test]
    fn test_wired_write_error_does_not_block_wireless() {
        let mut wired = MockTransport::wired();
        wired.fail_writes(true);
        let mut telemetry = Telemetry::new(wired, MockTransport::connected());
        telemetry.set_link(LinkState::Connected);
        telemetry.status("hello");
        assert_eq!(telemetry.counters().write_errors, 1);
        assert_eq!(telemetry.wireless().written(), &["hello".to_string()]);
    }
}
