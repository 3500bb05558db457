pub mod mpu6050;
pub mod serial;

pub use mpu6050::{create_default_imu, Mpu6050};
pub use serial::{BluetoothLink, SerialConsole};
