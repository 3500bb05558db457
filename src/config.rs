use crate::clock::period_us;
use crate::sensor::{AccelRange, FilterBandwidth, GyroRange, RangeSettings};
use crate::supervisor::RecoveryPolicy;

// Centralize all configuration constants
pub const IMU_SAMPLE_RATE_HZ: u32 = 100;
pub const IMU_SAMPLE_PERIOD_US: u32 = period_us(IMU_SAMPLE_RATE_HZ);
pub const BURST_LEN: usize = 250;

pub const CONSOLE_BAUDRATE: u32 = 115_200;
pub const BLUETOOTH_BAUDRATE: u32 = 115_200;
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

pub const CONNECT_POLL_MS: u32 = 100;
pub const HALT_REPEAT_MS: u32 = 1_000;
pub const RESTART_DELAY_MS: u32 = 100;

// Inbound command line capacity
pub const LINE_CAPACITY: usize = 128;

const _: () = assert!(IMU_SAMPLE_PERIOD_US > 0);
const _: () = assert!(1_000_000 % IMU_SAMPLE_RATE_HZ == 0);

pub const SENSOR_SETTINGS: RangeSettings = RangeSettings {
    accel: AccelRange::G4,
    gyro: GyroRange::Dps500,
    bandwidth: FilterBandwidth::Hz21,
};

/// What the boot sequencer does once the station is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum CaptureMode {
    /// Wait for the first wireless client, capture one burst, then supervise.
    BootGatedSingleShot,
    /// Capture one burst immediately, then supervise.
    AlwaysOnSingleShot,
    /// Capture a burst on every `COLLECT` command.
    CommandDriven,
}

impl CaptureMode {
    pub fn gates_on_connection(self) -> bool {
        matches!(self, CaptureMode::BootGatedSingleShot)
    }

    pub fn captures_on_boot(self) -> bool {
        !matches!(self, CaptureMode::CommandDriven)
    }

    pub fn accepts_commands(self) -> bool {
        matches!(self, CaptureMode::CommandDriven)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub struct Deployment {
    pub mode: CaptureMode,
    pub recovery: RecoveryPolicy,
    pub idle_poll_ms: u32,
    pub connect_poll_ms: u32,
}

pub const BOOT_GATED: Deployment = Deployment {
    mode: CaptureMode::BootGatedSingleShot,
    recovery: RecoveryPolicy::Restart,
    idle_poll_ms: 500,
    connect_poll_ms: CONNECT_POLL_MS,
};

pub const ALWAYS_ON: Deployment = Deployment {
    mode: CaptureMode::AlwaysOnSingleShot,
    recovery: RecoveryPolicy::Resume,
    idle_poll_ms: 500,
    connect_poll_ms: CONNECT_POLL_MS,
};

pub const COMMAND_DRIVEN: Deployment = Deployment {
    mode: CaptureMode::CommandDriven,
    recovery: RecoveryPolicy::Resume,
    idle_poll_ms: 10,
    connect_poll_ms: CONNECT_POLL_MS,
};

#[cfg(all(feature = "always-on", feature = "command-driven"))]
compile_error!("features `always-on` and `command-driven` are mutually exclusive");

#[cfg(feature = "always-on")]
pub const DEPLOYMENT: Deployment = ALWAYS_ON;

#[cfg(feature = "command-driven")]
pub const DEPLOYMENT: Deployment = COMMAND_DRIVEN;

#[cfg(not(any(feature = "always-on", feature = "command-driven")))]
pub const DEPLOYMENT: Deployment = BOOT_GATED;
