use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::sensors::sensor::{DriverError, Reading, Sensor, SensorCore, impl_sensor_info};

/// ADDR pin tied low.
pub const HDC2080_ADDRESS_1: u8 = 0x40;
/// ADDR pin tied high.
pub const HDC2080_ADDRESS_2: u8 = 0x41;

// Registers
const REG_TEMPERATURE_LOW: u8 = 0x00;
const REG_RESET_DRDY: u8 = 0x0E;
const REG_MEASUREMENT_CONFIG: u8 = 0x0F;
const REG_MANUFACTURER_ID_LOW: u8 = 0xFC;

const MANUFACTURER_ID: u16 = 0x5449;
const DEVICE_ID: u16 = 0x07D0;

const SOFT_RESET: u8 = 0x80;
const RESET_DELAY_MS: u32 = 2;
// 14-bit temperature and humidity, both channels.
const MEASUREMENT_CONFIG: u8 = 0x00;
const MEASUREMENT_TRIGGER: u8 = MEASUREMENT_CONFIG | 0x01;

/// Texas Instruments HDC2080 humidity and temperature sensor.
pub struct Hdc2080 {
    core: SensorCore,
    pending: bool,
}

impl Hdc2080 {
    pub const fn new(address: u8) -> Self {
        Self {
            core: SensorCore::new(address),
            pending: false,
        }
    }

    async fn init<I2C: I2c, D: DelayNs>(
        &mut self,
        i2c: &mut I2C,
        delay: &mut D,
    ) -> Result<(), DriverError> {
        let address = self.core.bus_address();
        let mut ids = [0u8; 4];
        i2c.write_read(address, &[REG_MANUFACTURER_ID_LOW], &mut ids)
            .await
            .map_err(|_| DriverError::Bus)?;
        let manufacturer = u16::from_le_bytes([ids[0], ids[1]]);
        let device = u16::from_le_bytes([ids[2], ids[3]]);
        if manufacturer != MANUFACTURER_ID || device != DEVICE_ID {
            return Err(DriverError::Identity);
        }

        i2c.write(address, &[REG_RESET_DRDY, SOFT_RESET])
            .await
            .map_err(|_| DriverError::Bus)?;
        delay.delay_ms(RESET_DELAY_MS).await;
        i2c.write(address, &[REG_MEASUREMENT_CONFIG, MEASUREMENT_CONFIG])
            .await
            .map_err(|_| DriverError::Bus)?;
        Ok(())
    }

    async fn cycle<I2C: I2c>(&mut self, i2c: &mut I2C) -> Result<Option<Reading>, DriverError> {
        let address = self.core.bus_address();
        let mut reading = None;
        if self.pending {
            self.pending = false;
            let mut data = [0u8; 4];
            i2c.write_read(address, &[REG_TEMPERATURE_LOW], &mut data)
                .await
                .map_err(|_| DriverError::Bus)?;
            reading = Some(Self::convert(&data));
        }

        i2c.write(address, &[REG_MEASUREMENT_CONFIG, MEASUREMENT_TRIGGER])
            .await
            .map_err(|_| DriverError::Bus)?;
        self.pending = true;
        Ok(reading)
    }

    fn convert(data: &[u8; 4]) -> Reading {
        let t_raw = u16::from_le_bytes([data[0], data[1]]);
        let rh_raw = u16::from_le_bytes([data[2], data[3]]);
        Reading::Climate {
            temperature_c: t_raw as f32 / 65536.0 * 165.0 - 40.0,
            humidity_pct: rh_raw as f32 / 65536.0 * 100.0,
            pressure_hpa: None,
        }
    }
}

impl_sensor_info!(Hdc2080, "HDC2080");

impl Sensor for Hdc2080 {
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
        self.core.record("HDC2080", result);
    }
}

/// Scripted identity registers of a genuine HDC2080, for tests elsewhere.
#[cfg(test)]
pub(crate) const TEST_ID_REGISTERS: (u8, [u8; 4]) = (REG_MANUFACTURER_ID_LOW, [0x49, 0x54, 0xD0, 0x07]);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::sensor::SensorInfo;
    use crate::testing::{FakeBus, FakeDevice, NoDelay};
    use embassy_futures::block_on;

    #[test]
    fn converts_datasheet_scale() {
        match Hdc2080::convert(&[0x00, 0x80, 0x00, 0x40]) {
            Reading::Climate {
                temperature_c,
                humidity_pct,
                ..
            } => {
                assert!((temperature_c - 42.5).abs() < 0.01);
                assert!((humidity_pct - 25.0).abs() < 0.01);
            }
            other => panic!("unexpected reading {:?}", other),
        }
    }

    #[test]
    fn probe_requires_both_ids() {
        let mut bus = FakeBus::new().with(
            FakeDevice::new(HDC2080_ADDRESS_2)
                .respond(REG_MANUFACTURER_ID_LOW, &[0x49, 0x54, 0x00, 0x00]),
        );
        let mut hdc = Hdc2080::new(HDC2080_ADDRESS_2);
        assert!(!block_on(hdc.probe(&mut bus, &mut NoDelay)));
    }

    #[test]
    fn update_triggers_then_collects() {
        let (reg, ids) = TEST_ID_REGISTERS;
        let mut bus = FakeBus::new().with(
            FakeDevice::new(HDC2080_ADDRESS_2)
                .respond(reg, &ids)
                .respond(REG_TEMPERATURE_LOW, &[0x00, 0x80, 0x00, 0x40]),
        );
        let mut hdc = Hdc2080::new(HDC2080_ADDRESS_2);
        assert!(block_on(hdc.probe(&mut bus, &mut NoDelay)));
        bus.clear_log();

        block_on(hdc.update(&mut bus));
        assert_eq!(hdc.reading(), None);
        assert_eq!(
            bus.writes(HDC2080_ADDRESS_2),
            &[vec![REG_MEASUREMENT_CONFIG, MEASUREMENT_TRIGGER]]
        );

        block_on(hdc.update(&mut bus));
        assert!(hdc.reading().is_some());
    }
}
