#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use imu_relay::{
    app::{halt, Station},
    board::EmbassyClock,
    drivers::create_default_imu,
    tasks::acquisition_task,
    telemetry::Telemetry,
    Board,
};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting imu-relay");
    let board = Board::init();
    let mut clock = EmbassyClock;
    let mut telemetry = Telemetry::new(board.console, board.bluetooth);

    if telemetry.wireless().is_none() {
        halt(&mut clock, &mut telemetry, "Bluetooth init failed!");
    }

    let imu = match create_default_imu(board.imu_bus, &mut Delay) {
        Ok(imu) => imu,
        Err(e) => {
            error!("IMU initialization failed: {:?}", e);
            halt(&mut clock, &mut telemetry, "MPU6050 init failed!");
        }
    };

    let station = Station::new(clock, imu, telemetry);
    match spawner.spawn(acquisition_task(station)) {
        Ok(()) => info!("Acquisition task spawned on main executor"),
        Err(_) => error!("Acquisition task spawn failed"),
    }

    core::future::pending::<()>().await;
}
