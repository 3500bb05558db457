use embassy_stm32::gpio::{Input, Pull};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::mode::Blocking;
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, BufferedUart, Config as UsartConfig, UartTx};
use embassy_stm32::{bind_interrupts, peripherals, rcc, Config};
use embassy_time::{block_for, Duration, Instant};
use static_cell::StaticCell;

use crate::app::Station;
use crate::clock::SampleClock;
use crate::config::{BLUETOOTH_BAUDRATE, CONSOLE_BAUDRATE, I2C_FREQUENCY_HZ};
use crate::drivers::{BluetoothLink, Mpu6050, SerialConsole};

// ── IRQ table ─────────────────────────────────────────────
bind_interrupts!(pub struct Irqs {
    USART1 => usart::BufferedInterruptHandler<peripherals::USART1>;
});

static BT_TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static BT_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

pub type Console = SerialConsole<UartTx<'static, Blocking>>;
pub type Bluetooth = BluetoothLink<BufferedUart<'static>, Input<'static>>;
pub type ImuBus = I2c<'static, Blocking>;
pub type FirmwareStation = Station<EmbassyClock, Mpu6050<ImuBus>, Console, Option<Bluetooth>>;

/// Microsecond counter backed by the embassy time driver (1 MHz tick).
pub struct EmbassyClock;

impl SampleClock for EmbassyClock {
    fn now_us(&mut self) -> u32 {
        // Truncation is the wrapping counter.
        Instant::now().as_micros() as u32
    }

    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(ms as u64));
    }
}

// ── Board struct ──────────────────────────────────────────
pub struct Board {
    pub console: Console,
    /// `None` when the USART1 configuration was rejected.
    pub bluetooth: Option<Bluetooth>,
    pub imu_bus: ImuBus,
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();

        // Enable HSI and configure PLL for 64MHz
        config.rcc.hsi = Some(rcc::Hsi {
            sys_div: rcc::HsiSysDiv::DIV1,
        });
        config.rcc.pll = Some(rcc::Pll {
            source: rcc::PllSource::HSI,    // Use HSI as PLL source
            prediv: rcc::PllPreDiv::DIV2,   // 16MHz / 2 = 8MHz
            mul: rcc::PllMul::MUL16,        // 8MHz * 16 = 128MHz
            divp: None,                     // Not used
            divq: None,                     // Not used
            divr: Some(rcc::PllRDiv::DIV2), // 128MHz / 2 = 64MHz
        });
        config.rcc.sys = rcc::Sysclk::PLL1_R;
        let p = embassy_stm32::init(config);

        // USART2 TX → wired console
        let mut console_cfg = UsartConfig::default();
        console_cfg.baudrate = CONSOLE_BAUDRATE;
        let console_tx = match UartTx::new_blocking(p.USART2, p.PA2, console_cfg) {
            Ok(tx) => tx,
            Err(_) => defmt::panic!("USART2 config rejected"),
        };

        // USART1 ↔ HC-05, STATE on PA8
        let mut bt_cfg = UsartConfig::default();
        bt_cfg.baudrate = BLUETOOTH_BAUDRATE;
        bt_cfg.rx_pull = Pull::Up;
        let bluetooth = match BufferedUart::new(
            p.USART1,
            Irqs,
            p.PC5,
            p.PC4,
            BT_TX_BUF.init([0; 256]),
            BT_RX_BUF.init([0; 256]),
            bt_cfg,
        ) {
            Ok(uart) => Some(BluetoothLink::new(uart, Input::new(p.PA8, Pull::Down))),
            Err(e) => {
                defmt::error!("USART1 config rejected: {:?}", e);
                None
            }
        };

        // I²C2 → MPU6050
        let mut i2c_cfg = i2c::Config::default();
        i2c_cfg.sda_pullup = false;
        i2c_cfg.scl_pullup = false;
        let imu_bus = I2c::new_blocking(
            p.I2C2,
            p.PB10,
            p.PB11,
            Hertz(I2C_FREQUENCY_HZ),
            i2c_cfg,
        );

        Self {
            console: SerialConsole::new(console_tx),
            bluetooth,
            imu_bus,
        }
    }
}
