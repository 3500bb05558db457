//! Fixed-rate acquisition loop
//!
//! Deadlines are laid out additively from the first `now_us()` reading, so a late iteration
//! only shortens its own wait and the global cadence never drifts. Each sample carries its
//! deadline as timestamp, not the time the read finished.

use core::fmt;

use crate::clock::SampleClock;
use crate::sample::{BurstStats, CaptureBurst, Sample};
use crate::sensor::{SensorError, SensorSource};
use crate::telemetry::{Telemetry, TelemetryError};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum AcquisitionError {
    /// Read of sample `index` failed; the rest of the burst was not attempted.
    SensorRead { index: usize, source: SensorError },
    /// Sample `index` could not be rendered as a line.
    Telemetry { index: usize, source: TelemetryError },
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionError::SensorRead { index, source } => {
                write!(f, "sample {} read failed: {}", index, source)
            }
            AcquisitionError::Telemetry { index, source } => {
                write!(f, "sample {} not sent: {}", index, source)
            }
        }
    }
}

/// Capture exactly `N` samples, one every `period_us`, forwarding each to `telemetry` as soon
/// as it is read.
pub fn run_capture_burst<const N: usize, C, S, W, L>(
    clock: &mut C,
    sensor: &mut S,
    telemetry: &mut Telemetry<W, L>,
    period_us: u32,
) -> Result<CaptureBurst<N>, AcquisitionError>
where
    C: SampleClock,
    S: SensorSource,
    W: Transport,
    L: Transport,
{
    let mut samples = [Sample::ZERO; N];
    let mut stats = BurstStats::default();
    let mut deadline = clock.now_us();

    for index in 0..N {
        clock.wait_until(deadline);
        stats.record_lateness(clock.now_us().wrapping_sub(deadline), period_us);

        let reading = sensor
            .read()
            .map_err(|source| AcquisitionError::SensorRead { index, source })?;
        let sample = Sample::new(deadline, reading);

        if index > 0 && sample.is_duplicate_of(&samples[index - 1]) {
            stats.duplicates += 1;
        }
        telemetry
            .emit(&sample)
            .map_err(|source| AcquisitionError::Telemetry { index, source })?;
        samples[index] = sample;

        deadline = deadline.wrapping_add(period_us);
    }

    crate::log_info!(
        "burst of {} done: max lateness {}us, {} overruns, {} duplicates",
        N,
        stats.max_lateness_us,
        stats.overruns,
        stats.duplicates
    );
    Ok(CaptureBurst::new(samples, stats))
}
