//! MPU6050 6-axis IMU over blocking I²C
//! ===========================================================

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};

use crate::sample::Vector3;
use crate::sensor::{
    AccelRange, FilterBandwidth, GyroRange, ImuReading, RangeSettings, SensorError, SensorSource,
};

// MPU6050 I2C address (AD0 low)
pub const MPU6050_ADDRESS_A: u8 = 0x68;

// MPU6050 Register Addresses
const MPU6050_SMPLRT_DIV_ADDR: u8 = 0x19;
const MPU6050_CONFIG_ADDR: u8 = 0x1A;
const MPU6050_GYRO_CONFIG_ADDR: u8 = 0x1B;
const MPU6050_ACCEL_CONFIG_ADDR: u8 = 0x1C;
const MPU6050_ACCEL_XOUT_H_ADDR: u8 = 0x3B;
const MPU6050_SIGNAL_PATH_RESET_ADDR: u8 = 0x68;
const MPU6050_PWR_MGMT_1_ADDR: u8 = 0x6B;
const MPU6050_WHO_AM_I_ADDR: u8 = 0x75;

// MPU6050 ID
const MPU6050_ID: u8 = 0x68;

const PWR_MGMT_1_DEVICE_RESET: u8 = 0x80;
const PWR_MGMT_1_CLKSEL_PLL_XGYRO: u8 = 0x01;
const SIGNAL_PATH_RESET_ALL: u8 = 0x07;

const INIT_ATTEMPTS: u32 = 5;

const STANDARD_GRAVITY: f32 = 9.806_65;
const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;

// Sensitivity at each full-scale setting
fn accel_lsb_per_g(range: AccelRange) -> f32 {
    match range {
        AccelRange::G2 => 16_384.0,
        AccelRange::G4 => 8_192.0,
        AccelRange::G8 => 4_096.0,
        AccelRange::G16 => 2_048.0,
    }
}

fn gyro_lsb_per_dps(range: GyroRange) -> f32 {
    match range {
        GyroRange::Dps250 => 131.0,
        GyroRange::Dps500 => 65.5,
        GyroRange::Dps1000 => 32.8,
        GyroRange::Dps2000 => 16.4,
    }
}

fn accel_config_bits(range: AccelRange) -> u8 {
    let fs_sel = match range {
        AccelRange::G2 => 0,
        AccelRange::G4 => 1,
        AccelRange::G8 => 2,
        AccelRange::G16 => 3,
    };
    fs_sel << 3
}

fn gyro_config_bits(range: GyroRange) -> u8 {
    let fs_sel = match range {
        GyroRange::Dps250 => 0,
        GyroRange::Dps500 => 1,
        GyroRange::Dps1000 => 2,
        GyroRange::Dps2000 => 3,
    };
    fs_sel << 3
}

fn dlpf_cfg_bits(bandwidth: FilterBandwidth) -> u8 {
    match bandwidth {
        FilterBandwidth::Hz260 => 0,
        FilterBandwidth::Hz184 => 1,
        FilterBandwidth::Hz94 => 2,
        FilterBandwidth::Hz44 => 3,
        FilterBandwidth::Hz21 => 4,
        FilterBandwidth::Hz10 => 5,
        FilterBandwidth::Hz5 => 6,
    }
}

pub struct Mpu6050<I2C> {
    i2c: I2C,
    addr: u8,
    accel_scale: f32,
    gyro_scale: f32,
}

impl<I2C, E> Mpu6050<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    /// Probe, reset and wake the chip. Ranges stay at their reset values (±2 g, ±250 °/s)
    /// until [`SensorSource::configure`] is called.
    pub fn new<D: DelayMs<u32>>(i2c: I2C, addr: u8, delay: &mut D) -> Result<Self, SensorError> {
        let mut mpu = Self {
            i2c,
            addr,
            accel_scale: STANDARD_GRAVITY / accel_lsb_per_g(AccelRange::G2),
            gyro_scale: DEG_TO_RAD / gyro_lsb_per_dps(GyroRange::Dps250),
        };

        crate::log_info!("Starting MPU6050 initialization sequence...");

        // Initialization with retries
        let mut last_error = SensorError::Bus;
        for attempt in 1..=INIT_ATTEMPTS {
            match mpu.try_init(delay) {
                Ok(()) => {
                    crate::log_info!("MPU6050 initialized on attempt {}", attempt);
                    return Ok(mpu);
                }
                Err(e) => {
                    crate::log_warn!("MPU6050 init attempt {} failed: {}", attempt, e);
                    last_error = e;
                    if attempt < INIT_ATTEMPTS {
                        // Progressive backoff: 20ms, 40ms, 80ms, 160ms
                        delay.delay_ms(20u32 << (attempt - 1));
                    }
                }
            }
        }

        crate::log_error!("MPU6050 initialization failed after {} attempts", INIT_ATTEMPTS);
        Err(last_error)
    }

    fn try_init<D: DelayMs<u32>>(&mut self, delay: &mut D) -> Result<(), SensorError> {
        let id = self.read_byte(MPU6050_WHO_AM_I_ADDR)?;
        if id != MPU6050_ID {
            crate::log_error!("Invalid MPU6050 ID: 0x{:02X}, expected 0x{:02X}", id, MPU6050_ID);
            return Err(SensorError::WrongDevice { id });
        }

        self.write_byte(MPU6050_PWR_MGMT_1_ADDR, PWR_MGMT_1_DEVICE_RESET)?;
        delay.delay_ms(100);
        self.write_byte(MPU6050_SIGNAL_PATH_RESET_ADDR, SIGNAL_PATH_RESET_ALL)?;
        delay.delay_ms(100);

        // Full internal rate; the acquisition loop does its own pacing.
        self.write_byte(MPU6050_SMPLRT_DIV_ADDR, 0x00)?;
        self.write_byte(MPU6050_PWR_MGMT_1_ADDR, PWR_MGMT_1_CLKSEL_PLL_XGYRO)?;
        delay.delay_ms(100);
        Ok(())
    }

    fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.addr, &[reg, value])
            .map_err(|_| SensorError::Bus)
    }

    fn read_byte(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.addr, &[reg], &mut buf)
            .map_err(|_| SensorError::Bus)?;
        Ok(buf[0])
    }

    fn read_bytes<const N: usize>(&mut self, reg: u8) -> Result<[u8; N], SensorError> {
        let mut buf = [0u8; N];
        self.i2c
            .write_read(self.addr, &[reg], &mut buf)
            .map_err(|_| SensorError::Bus)?;
        Ok(buf)
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> SensorSource for Mpu6050<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    fn configure(&mut self, settings: &RangeSettings) -> Result<(), SensorError> {
        self.write_byte(MPU6050_ACCEL_CONFIG_ADDR, accel_config_bits(settings.accel))?;
        self.write_byte(MPU6050_GYRO_CONFIG_ADDR, gyro_config_bits(settings.gyro))?;
        self.write_byte(MPU6050_CONFIG_ADDR, dlpf_cfg_bits(settings.bandwidth))?;

        self.accel_scale = STANDARD_GRAVITY / accel_lsb_per_g(settings.accel);
        self.gyro_scale = DEG_TO_RAD / gyro_lsb_per_dps(settings.gyro);
        crate::log_info!(
            "MPU6050 configured: +/-{}g, +/-{}dps",
            settings.accel.full_scale_g(),
            settings.gyro.full_scale_dps()
        );
        Ok(())
    }

    fn read(&mut self) -> Result<ImuReading, SensorError> {
        // accel (6) + temperature (2) + gyro (6), big-endian
        let raw = self.read_bytes::<14>(MPU6050_ACCEL_XOUT_H_ADDR)?;
        let word = |i: usize| i16::from_be_bytes([raw[i], raw[i + 1]]) as f32;

        let accel = Vector3 {
            x: word(0) * self.accel_scale,
            y: word(2) * self.accel_scale,
            z: word(4) * self.accel_scale,
        };
        let gyro = Vector3 {
            x: word(8) * self.gyro_scale,
            y: word(10) * self.gyro_scale,
            z: word(12) * self.gyro_scale,
        };
        Ok(ImuReading { accel, gyro })
    }
}

// Factory function to create the default IMU (MPU6050, AD0 low)
pub fn create_default_imu<I2C, E, D>(i2c: I2C, delay: &mut D) -> Result<Mpu6050<I2C>, SensorError>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u32>,
{
    Mpu6050::new(i2c, MPU6050_ADDRESS_A, delay)
}
