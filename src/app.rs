//! Boot sequencing
//!
//! [`Station`] is the single context object holding the clock, the sensor and both transports.
//! [`run`] drives it according to a [`Deployment`] and only returns when the firmware entry
//! point has to act: a restart or an unrecoverable fault.

use core::fmt;

use crate::acquisition::{run_capture_burst, AcquisitionError};
use crate::clock::SampleClock;
use crate::config::{Deployment, HALT_REPEAT_MS, IMU_SAMPLE_PERIOD_US};
use crate::dispatcher::CommandDispatcher;
use crate::sample::CaptureBurst;
use crate::sensor::{RangeSettings, SensorError, SensorSource};
use crate::supervisor::{ConnectionSupervisor, Control};
use crate::telemetry::{Telemetry, DATA_ABORT, DATA_END, DATA_START};
use crate::transport::Transport;

pub struct Station<C, S, W, L> {
    pub clock: C,
    pub sensor: S,
    pub telemetry: Telemetry<W, L>,
    pub period_us: u32,
}

impl<C, S, W, L> Station<C, S, W, L>
where
    C: SampleClock,
    S: SensorSource,
    W: Transport,
    L: Transport,
{
    pub fn new(clock: C, sensor: S, telemetry: Telemetry<W, L>) -> Self {
        Self {
            clock,
            sensor,
            telemetry,
            period_us: IMU_SAMPLE_PERIOD_US,
        }
    }

    /// One burst without framing.
    pub fn capture<const N: usize>(&mut self) -> Result<CaptureBurst<N>, AcquisitionError> {
        run_capture_burst(
            &mut self.clock,
            &mut self.sensor,
            &mut self.telemetry,
            self.period_us,
        )
    }

    /// One burst between `DATA_START` and `DATA_END`. A failed burst is closed with
    /// `DATA_ABORT` instead so consumers never mistake it for a complete one.
    pub fn collect<const N: usize>(&mut self) -> Result<CaptureBurst<N>, AcquisitionError> {
        self.telemetry.status(DATA_START);
        match self.capture::<N>() {
            Ok(burst) => {
                self.telemetry.status(DATA_END);
                Ok(burst)
            }
            Err(e) => {
                crate::log_error!("burst aborted: {}", e);
                self.telemetry.status(DATA_ABORT);
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum Fault {
    SensorConfig(SensorError),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::SensorConfig(e) => write!(f, "sensor configuration failed: {}", e),
        }
    }
}

impl From<SensorError> for Fault {
    fn from(e: SensorError) -> Self {
        Fault::SensorConfig(e)
    }
}

impl Fault {
    /// Status line repeated while halted.
    pub fn message(&self) -> &'static str {
        match self {
            Fault::SensorConfig(_) => "Sensor configuration failed!",
        }
    }
}

/// Why [`run`] handed control back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum Exit {
    Restart,
    Fault(Fault),
}

pub fn run<const N: usize, C, S, W, L>(
    station: &mut Station<C, S, W, L>,
    deployment: &Deployment,
    settings: &RangeSettings,
) -> Exit
where
    C: SampleClock,
    S: SensorSource,
    W: Transport,
    L: Transport,
{
    crate::log_info!("deployment {:?}", deployment.mode);

    let mut supervisor = if deployment.mode.gates_on_connection() {
        let mut supervisor = ConnectionSupervisor::new(deployment.recovery);
        supervisor.await_first_connection(
            &mut station.clock,
            &mut station.telemetry,
            deployment.connect_poll_ms,
        );
        supervisor
    } else {
        ConnectionSupervisor::from_probe(deployment.recovery, &mut station.telemetry)
    };

    if let Err(e) = station.sensor.configure(settings) {
        crate::log_error!("sensor configure failed: {}", e);
        return Exit::Fault(e.into());
    }

    if deployment.mode.captures_on_boot() {
        // A failed boot burst is already reported; fall through to idle.
        let _ = station.collect::<N>();
    }

    let mut dispatcher = CommandDispatcher::new();
    loop {
        if supervisor.poll(&mut station.telemetry) == Control::Restart {
            return Exit::Restart;
        }
        if deployment.mode.accepts_commands() {
            dispatcher.poll::<N, C, S, W, L>(station);
        }
        station.clock.delay_ms(deployment.idle_poll_ms);
    }
}

/// Repeat `message` on every transport forever.
pub fn halt<C, W, L>(clock: &mut C, telemetry: &mut Telemetry<W, L>, message: &str) -> !
where
    C: SampleClock,
    W: Transport,
    L: Transport,
{
    crate::log_error!("halted: {}", message);
    loop {
        telemetry.status(message);
        clock.delay_ms(HALT_REPEAT_MS);
    }
}
