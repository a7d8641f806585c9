use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::sensors::crc::{CRC_INIT_SENSIRION, checked_word};
use crate::sensors::sensor::{DriverError, Reading, Sensor, SensorCore, impl_sensor_info};

pub const SHTC3_ADDRESS: u8 = 0x70;

// Commands
const CMD_WAKEUP: [u8; 2] = [0x35, 0x17];
const CMD_SOFT_RESET: [u8; 2] = [0x80, 0x5D];
const CMD_READ_ID: [u8; 2] = [0xEF, 0xC8];
// Normal power, temperature first, no clock stretching.
const CMD_MEASURE: [u8; 2] = [0x78, 0x66];

const WAKEUP_DELAY_US: u32 = 240;
const RESET_DELAY_US: u32 = 240;

const ID_MASK: u16 = 0x083F;
const ID_SHTC3: u16 = 0x0807;

const ID_RESPONSE_SIZE: usize = 3;
const RESPONSE_SIZE: usize = 6; // 2 bytes data + 1 CRC, twice

/// Sensirion SHTC3 humidity and temperature sensor.
///
/// The sensor is left awake after probing. Each update collects the
/// measurement started by the previous one and starts the next.
pub struct Shtc3 {
    core: SensorCore,
    pending: bool,
}

impl Shtc3 {
    pub const fn new() -> Self {
        Self {
            core: SensorCore::new(SHTC3_ADDRESS),
            pending: false,
        }
    }

    async fn init<I2C: I2c, D: DelayNs>(
        &mut self,
        i2c: &mut I2C,
        delay: &mut D,
    ) -> Result<(), DriverError> {
        let address = self.core.bus_address();
        i2c.write(address, &CMD_WAKEUP)
            .await
            .map_err(|_| DriverError::Bus)?;
        delay.delay_us(WAKEUP_DELAY_US).await;
        i2c.write(address, &CMD_SOFT_RESET)
            .await
            .map_err(|_| DriverError::Bus)?;
        delay.delay_us(RESET_DELAY_US).await;

        let mut read_buf = [0u8; ID_RESPONSE_SIZE];
        i2c.write_read(address, &CMD_READ_ID, &mut read_buf)
            .await
            .map_err(|_| DriverError::Bus)?;
        let id = checked_word(&read_buf, CRC_INIT_SENSIRION).ok_or(DriverError::Crc)?;
        if id & ID_MASK != ID_SHTC3 {
            return Err(DriverError::Identity);
        }
        Ok(())
    }

    async fn cycle<I2C: I2c>(&mut self, i2c: &mut I2C) -> Result<Option<Reading>, DriverError> {
        let address = self.core.bus_address();
        let mut reading = None;
        if self.pending {
            self.pending = false;
            let mut read_buf = [0u8; RESPONSE_SIZE];
            i2c.read(address, &mut read_buf)
                .await
                .map_err(|_| DriverError::Bus)?;
            reading = Some(Self::convert(&read_buf)?);
        }

        i2c.write(address, &CMD_MEASURE)
            .await
            .map_err(|_| DriverError::Bus)?;
        self.pending = true;
        Ok(reading)
    }

    fn convert(read_buf: &[u8; RESPONSE_SIZE]) -> Result<Reading, DriverError> {
        let t_raw = checked_word(&read_buf[0..3], CRC_INIT_SENSIRION).ok_or(DriverError::Crc)?;
        let rh_raw = checked_word(&read_buf[3..6], CRC_INIT_SENSIRION).ok_or(DriverError::Crc)?;
        Ok(Reading::Climate {
            temperature_c: -45.0 + 175.0 * t_raw as f32 / 65536.0,
            humidity_pct: 100.0 * rh_raw as f32 / 65536.0,
            pressure_hpa: None,
        })
    }
}

impl Default for Shtc3 {
    fn default() -> Self {
        Self::new()
    }
}

impl_sensor_info!(Shtc3, "SHTC3");

impl Sensor for Shtc3 {
    async fn probe<I2C: I2c, D: DelayNs>(&mut self, i2c: &mut I2C, delay: &mut D) -> bool {
        self.pending = false;
        let found = self.init(i2c, delay).await.is_ok();
        self.core.set_present(found);
        found
    }

    async fn update<I2C: I2c>(&mut self, i2c: &mut I2C) {
        if !self.core.is_present() {
            return;
        }
        let result = self.cycle(i2c).await;
        self.core.record("SHTC3", result);
    }
}
