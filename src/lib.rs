#![cfg_attr(not(test), no_std)]

#[macro_use]
pub mod logging;

pub mod acquisition;
pub mod app;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod drivers;
pub mod sample;
pub mod sensor;
pub mod supervisor;
pub mod telemetry;
pub mod transport;

#[cfg(feature = "stm32")]
pub mod board;
#[cfg(feature = "stm32")]
pub mod tasks;

#[cfg(test)]
pub(crate) mod mock;

pub use app::{Exit, Fault, Station};
pub use clock::SampleClock;
pub use sample::{CaptureBurst, Sample, Vector3};
pub use sensor::{ImuReading, SensorSource};
pub use transport::Transport;

#[cfg(feature = "stm32")]
pub use board::Board;
