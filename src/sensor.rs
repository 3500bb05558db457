//! Sensor source contract
//!
//! The acquisition core only knows how to configure the IMU and pull one reading from it.
//! Register programming lives in the drivers.

use core::fmt;

use crate::sample::Vector3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum SensorError {
    /// Bus transaction failed.
    Bus,
    /// Identification register did not match.
    WrongDevice { id: u8 },
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Bus => write!(f, "sensor bus error"),
            SensorError::WrongDevice { id } => write!(f, "unexpected sensor id 0x{:02X}", id),
        }
    }
}

/// Accelerometer full-scale range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum AccelRange {
    G2,
    G4,
    G8,
    G16,
}

impl AccelRange {
    pub fn full_scale_g(self) -> f32 {
        match self {
            AccelRange::G2 => 2.0,
            AccelRange::G4 => 4.0,
            AccelRange::G8 => 8.0,
            AccelRange::G16 => 16.0,
        }
    }
}

/// Gyroscope full-scale range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum GyroRange {
    Dps250,
    Dps500,
    Dps1000,
    Dps2000,
}

impl GyroRange {
    pub fn full_scale_dps(self) -> f32 {
        match self {
            GyroRange::Dps250 => 250.0,
            GyroRange::Dps500 => 500.0,
            GyroRange::Dps1000 => 1000.0,
            GyroRange::Dps2000 => 2000.0,
        }
    }
}

/// On-chip digital low-pass filter bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum FilterBandwidth {
    Hz260,
    Hz184,
    Hz94,
    Hz44,
    Hz21,
    Hz10,
    Hz5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub struct RangeSettings {
    pub accel: AccelRange,
    pub gyro: GyroRange,
    pub bandwidth: FilterBandwidth,
}

/// One raw reading: acceleration in m/s², angular rate in rad/s.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub struct ImuReading {
    pub accel: Vector3,
    pub gyro: Vector3,
}

pub trait SensorSource {
    fn configure(&mut self, settings: &RangeSettings) -> Result<(), SensorError>;

    fn read(&mut self) -> Result<ImuReading, SensorError>;
}
