use cortex_m::peripheral::SCB;
use defmt::*;
use embassy_executor::task;

use crate::app::{self, Exit};
use crate::board::FirmwareStation;
use crate::clock::SampleClock;
use crate::config::{BURST_LEN, DEPLOYMENT, RESTART_DELAY_MS, SENSOR_SETTINGS};

/// Owns the station for the life of the firmware. Acquisition is busy-wait driven, so this task
/// never yields once started.
#[task]
pub async fn acquisition_task(mut station: FirmwareStation) {
    info!("Acquisition task started, period {}us", station.period_us);

    match app::run::<BURST_LEN, _, _, _, _>(&mut station, &DEPLOYMENT, &SENSOR_SETTINGS) {
        Exit::Restart => {
            warn!("Restart requested");
            station.clock.delay_ms(RESTART_DELAY_MS);
            SCB::sys_reset()
        }
        Exit::Fault(fault) => {
            error!("Fatal: {}", fault);
            app::halt(&mut station.clock, &mut station.telemetry, fault.message())
        }
    }
}
