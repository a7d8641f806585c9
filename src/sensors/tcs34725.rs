use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::sensors::sensor::{DriverError, Reading, Sensor, SensorCore, impl_sensor_info};

pub const TCS34725_ADDRESS: u8 = 0x29;

const COMMAND_BIT: u8 = 0x80;
const AUTO_INCREMENT: u8 = 0x20;

// Registers
const REG_ENABLE: u8 = 0x00;
const REG_ATIME: u8 = 0x01;
const REG_CONTROL: u8 = 0x0F;
const REG_ID: u8 = 0x12;
const REG_STATUS: u8 = 0x13;
const REG_CDATAL: u8 = 0x14;

const ENABLE_PON: u8 = 0x01;
const ENABLE_AEN: u8 = 0x02;
const STATUS_AVALID: u8 = 0x01;

/// TCS34721/TCS34725 and TCS34723/TCS34727 identifiers.
const IDS: [u8; 2] = [0x44, 0x4D];

// 50.4ms integration, 4x gain.
const ATIME_50MS: u8 = 0xEB;
const GAIN_4X: u8 = 0x01;
const POWER_ON_DELAY_MS: u32 = 3;

/// ams TCS34725 color light-to-digital converter.
///
/// The RGBC integration runs continuously once enabled; an update reads the
/// channels whenever a completed integration is available.
pub struct Tcs34725 {
    core: SensorCore,
}

impl Tcs34725 {
    pub const fn new() -> Self {
        Self {
            core: SensorCore::new(TCS34725_ADDRESS),
        }
    }

    async fn read_register<I2C: I2c>(&self, i2c: &mut I2C, reg: u8) -> Result<u8, DriverError> {
        let mut value = [0u8; 1];
        i2c.write_read(self.core.bus_address(), &[COMMAND_BIT | reg], &mut value)
            .await
            .map_err(|_| DriverError::Bus)?;
        Ok(value[0])
    }

    async fn write_register<I2C: I2c>(
        &self,
        i2c: &mut I2C,
        reg: u8,
        value: u8,
    ) -> Result<(), DriverError> {
        i2c.write(self.core.bus_address(), &[COMMAND_BIT | reg, value])
            .await
            .map_err(|_| DriverError::Bus)
    }

    async fn init<I2C: I2c, D: DelayNs>(
        &mut self,
        i2c: &mut I2C,
        delay: &mut D,
    ) -> Result<(), DriverError> {
        let id = self.read_register(i2c, REG_ID).await?;
        if !IDS.contains(&id) {
            return Err(DriverError::Identity);
        }
        self.write_register(i2c, REG_ATIME, ATIME_50MS).await?;
        self.write_register(i2c, REG_CONTROL, GAIN_4X).await?;
        self.write_register(i2c, REG_ENABLE, ENABLE_PON).await?;
        delay.delay_ms(POWER_ON_DELAY_MS).await;
        self.write_register(i2c, REG_ENABLE, ENABLE_PON | ENABLE_AEN)
            .await
    }

    async fn read<I2C: I2c>(&mut self, i2c: &mut I2C) -> Result<Option<Reading>, DriverError> {
        if self.read_register(i2c, REG_STATUS).await? & STATUS_AVALID == 0 {
            return Ok(None);
        }
        let mut data = [0u8; 8];
        i2c.write_read(
            self.core.bus_address(),
            &[COMMAND_BIT | AUTO_INCREMENT | REG_CDATAL],
            &mut data,
        )
        .await
        .map_err(|_| DriverError::Bus)?;
        let channel = |i: usize| u16::from_le_bytes([data[i], data[i + 1]]);
        Ok(Some(Reading::Color {
            clear: channel(0),
            red: channel(2),
            green: channel(4),
            blue: channel(6),
        }))
    }
}

impl Default for Tcs34725 {
    fn default() -> Self {
        Self::new()
    }
}

impl_sensor_info!(Tcs34725, "TCS34725");

impl Sensor for Tcs34725 {
    async fn probe<I2C: I2c, D: DelayNs>(&mut self, i2c: &mut I2C, delay: &mut D) -> bool {
        let found = self.init(i2c, delay).await.is_ok();
        self.core.set_present(found);
        found
    }

    async fn update<I2C: I2c>(&mut self, i2c: &mut I2C) {
        if !self.core.is_present() {
            return;
        }
        let result = self.read(i2c).await;
        self.core.record("TCS34725", result);
    }
}

/// Scripted ID register read of a genuine TCS34725, for tests elsewhere.
#[cfg(test)]
pub(crate) const TEST_ID_REGISTER: (u8, u8) = (COMMAND_BIT | REG_ID, IDS[0]);
