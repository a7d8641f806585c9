use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::sensors::crc::{CRC_INIT_HTU21D, checked_word};
use crate::sensors::sensor::{DriverError, Reading, Sensor, SensorCore, impl_sensor_info};

pub const HTU21D_ADDRESS: u8 = 0x40;

// Commands
const CMD_TRIGGER_TEMPERATURE: u8 = 0xF3;
const CMD_TRIGGER_HUMIDITY: u8 = 0xF5;
const CMD_READ_USER_REGISTER: u8 = 0xE7;
const CMD_SOFT_RESET: u8 = 0xFE;

const RESET_DELAY_MS: u32 = 15;
const USER_REGISTER_DEFAULT: u8 = 0x02;

const STATUS_BITS: u16 = 0x0003;
const RESPONSE_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Temperature,
    Humidity,
}

/// TE Connectivity HTU21D humidity and temperature sensor.
///
/// Temperature and humidity are converted one after the other, so a full
/// sample takes two updates after the first trigger.
pub struct Htu21d {
    core: SensorCore,
    phase: Phase,
    temperature: Option<f32>,
}

impl Htu21d {
    pub const fn new() -> Self {
        Self {
            core: SensorCore::new(HTU21D_ADDRESS),
            phase: Phase::Idle,
            temperature: None,
        }
    }

    async fn init<I2C: I2c, D: DelayNs>(
        &mut self,
        i2c: &mut I2C,
        delay: &mut D,
    ) -> Result<(), DriverError> {
        let address = self.core.bus_address();
        i2c.write(address, &[CMD_SOFT_RESET])
            .await
            .map_err(|_| DriverError::Bus)?;
        delay.delay_ms(RESET_DELAY_MS).await;

        let mut user = [0u8; 1];
        i2c.write_read(address, &[CMD_READ_USER_REGISTER], &mut user)
            .await
            .map_err(|_| DriverError::Bus)?;
        if user[0] != USER_REGISTER_DEFAULT {
            return Err(DriverError::Identity);
        }
        Ok(())
    }

    async fn cycle<I2C: I2c>(&mut self, i2c: &mut I2C) -> Result<Option<Reading>, DriverError> {
        let address = self.core.bus_address();
        let phase = core::mem::replace(&mut self.phase, Phase::Idle);

        let mut reading = None;
        let next = match phase {
            Phase::Idle => CMD_TRIGGER_TEMPERATURE,
            Phase::Temperature => {
                let raw = Self::collect(i2c, address).await?;
                self.temperature = Some(-46.85 + 175.72 * raw as f32 / 65536.0);
                CMD_TRIGGER_HUMIDITY
            }
            Phase::Humidity => {
                let raw = Self::collect(i2c, address).await?;
                let humidity = (-6.0 + 125.0 * raw as f32 / 65536.0).clamp(0.0, 100.0);
                if let Some(temperature_c) = self.temperature {
                    reading = Some(Reading::Climate {
                        temperature_c,
                        humidity_pct: humidity,
                        pressure_hpa: None,
                    });
                }
                CMD_TRIGGER_TEMPERATURE
            }
        };

        i2c.write(address, &[next])
            .await
            .map_err(|_| DriverError::Bus)?;
        self.phase = if next == CMD_TRIGGER_TEMPERATURE {
            Phase::Temperature
        } else {
            Phase::Humidity
        };
        Ok(reading)
    }

    async fn collect<I2C: I2c>(i2c: &mut I2C, address: u8) -> Result<u16, DriverError> {
        let mut read_buf = [0u8; RESPONSE_SIZE];
        i2c.read(address, &mut read_buf)
            .await
            .map_err(|_| DriverError::Bus)?;
        let word = checked_word(&read_buf, CRC_INIT_HTU21D).ok_or(DriverError::Crc)?;
        Ok(word & !STATUS_BITS)
    }
}

impl Default for Htu21d {
    fn default() -> Self {
        Self::new()
    }
}

impl_sensor_info!(Htu21d, "HTU21D");

impl Sensor for Htu21d {
    async fn probe<I2C: I2c, D: DelayNs>(&mut self, i2c: &mut I2C, delay: &mut D) -> bool {
        self.phase = Phase::Idle;
        let found = self.init(i2c, delay).await.is_ok();
        self.core.set_present(found);
        found
    }

    async fn update<I2C: I2c>(&mut self, i2c: &mut I2C) {
        if !self.core.is_present() {
            return;
        }
        let result = self.cycle(i2c).await;
        self.core.record("HTU21D", result);
    }
}
