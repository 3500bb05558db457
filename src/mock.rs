//! In-memory stand-ins for the clock, sensor and transports, used by unit tests.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::app::Station;
use crate::clock::SampleClock;
use crate::sample::Vector3;
use crate::sensor::{ImuReading, RangeSettings, SensorError, SensorSource};
use crate::telemetry::Telemetry;
use crate::transport::{Line, Transport, TransportError};

/// Simulated microsecond counter shared between a clock and a sensor.
#[derive(Debug, Clone)]
pub struct SimTime(Rc<Cell<u32>>);

impl SimTime {
    pub fn starting_at(us: u32) -> Self {
        Self(Rc::new(Cell::new(us)))
    }

    pub fn now(&self) -> u32 {
        self.0.get()
    }

    pub fn advance(&self, us: u32) {
        self.0.set(self.0.get().wrapping_add(us));
    }
}

/// Every `now_us()` call returns the current time and then advances it by `tick_us`, so busy
/// waits terminate.
#[derive(Debug)]
pub struct MockClock {
    time: SimTime,
    tick_us: u32,
}

impl MockClock {
    pub fn new(time: SimTime, tick_us: u32) -> Self {
        Self { time, tick_us }
    }
}

impl SampleClock for MockClock {
    fn now_us(&mut self) -> u32 {
        let now = self.time.now();
        self.time.advance(self.tick_us);
        now
    }
}

#[derive(Debug)]
pub struct MockSensor {
    time: SimTime,
    reads: usize,
    latency: Vec<(usize, u32)>,
    fail_at: Option<usize>,
    saturate_at: Option<usize>,
    frozen: bool,
    configured: Option<RangeSettings>,
    fail_configure: bool,
}

impl MockSensor {
    pub fn new(time: SimTime) -> Self {
        Self {
            time,
            reads: 0,
            latency: Vec::new(),
            fail_at: None,
            saturate_at: None,
            frozen: false,
            configured: None,
            fail_configure: false,
        }
    }

    /// Deterministic, distinct reading for read number `index`.
    pub fn reading_for(index: usize) -> ImuReading {
        let i = index as f32;
        ImuReading {
            accel: Vector3::new(i * 0.01, -9.81 + i * 0.001, 0.5),
            gyro: Vector3::new(i * -0.002, 0.1, i * 0.003),
        }
    }

    /// Make read number `index` take `us` of simulated time.
    pub fn set_latency(&mut self, index: usize, us: u32) {
        self.latency.push((index, us));
    }

    pub fn fail_at(&mut self, index: usize) {
        self.fail_at = Some(index);
    }

    /// Make read number `index` return values too wide for a sample line.
    pub fn saturate_at(&mut self, index: usize) {
        self.saturate_at = Some(index);
    }

    pub fn fail_configure(&mut self) {
        self.fail_configure = true;
    }

    /// Return the same reading forever.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn configured(&self) -> Option<RangeSettings> {
        self.configured
    }
}

impl SensorSource for MockSensor {
    fn configure(&mut self, settings: &RangeSettings) -> Result<(), SensorError> {
        if self.fail_configure {
            return Err(SensorError::Bus);
        }
        self.configured = Some(*settings);
        Ok(())
    }

    fn read(&mut self) -> Result<ImuReading, SensorError> {
        let index = self.reads;
        self.reads += 1;
        if self.fail_at == Some(index) {
            return Err(SensorError::Bus);
        }
        for &(at, us) in &self.latency {
            if at == index {
                self.time.advance(us);
            }
        }
        if self.saturate_at == Some(index) {
            let max = Vector3::new(f32::MAX, f32::MAX, f32::MAX);
            return Ok(ImuReading {
                accel: max,
                gyro: max,
            });
        }
        Ok(Self::reading_for(if self.frozen { 0 } else { index }))
    }
}

/// Records written lines; replays a script of presence probes and queued inbound lines.
#[derive(Debug, Default)]
pub struct MockTransport {
    written: Vec<String>,
    probes: VecDeque<bool>,
    last_probe: bool,
    probes_taken: usize,
    inbound: VecDeque<String>,
    fail_writes: bool,
}

impl MockTransport {
    pub fn wired() -> Self {
        Self {
            last_probe: true,
            ..Self::default()
        }
    }

    /// Client always present.
    pub fn connected() -> Self {
        Self {
            last_probe: true,
            ..Self::default()
        }
    }

    /// Presence follows `probes`, one per call; the last value sticks once exhausted.
    pub fn scripted(probes: &[bool]) -> Self {
        Self {
            probes: probes.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn push_input(&mut self, line: &str) {
        self.inbound.push_back(line.to_string());
    }

    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn written(&self) -> &[String] {
        &self.written
    }

    pub fn probes_taken(&self) -> usize {
        self.probes_taken
    }

    pub fn probes_remaining(&self) -> usize {
        self.probes.len()
    }

    pub fn pending_input(&self) -> usize {
        self.inbound.len()
    }
}

impl Transport for MockTransport {
    fn is_available(&mut self) -> bool {
        self.probes_taken += 1;
        if let Some(p) = self.probes.pop_front() {
            self.last_probe = p;
        }
        self.last_probe
    }

    fn has_pending_input(&mut self) -> bool {
        !self.inbound.is_empty()
    }

    fn read_line(&mut self) -> Option<Line> {
        let line = self.inbound.pop_front()?;
        Line::try_from(line.as_str()).ok()
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        if self.fail_writes {
            return Err(TransportError::Write);
        }
        self.written.push(line.to_string());
        Ok(())
    }
}

pub type MockStation = Station<MockClock, MockSensor, MockTransport, MockTransport>;

/// Station with a 100us clock tick, a fresh sensor, a wired recorder and `link` as wireless.
pub fn station(link: MockTransport) -> MockStation {
    let time = SimTime::starting_at(0);
    Station::new(
        MockClock::new(time.clone(), 100),
        MockSensor::new(time),
        Telemetry::new(MockTransport::wired(), link),
    )
}
