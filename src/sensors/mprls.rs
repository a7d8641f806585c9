use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::sensors::sensor::{DriverError, Reading, Sensor, SensorCore, impl_sensor_info};

pub const MPRLS_ADDRESS: u8 = 0x18;

const CMD_MEASURE: [u8; 3] = [0xAA, 0x00, 0x00];

// Status byte bits
const STATUS_POWERED: u8 = 0x40;
const STATUS_BUSY: u8 = 0x20;
const STATUS_INTEGRITY_FAILED: u8 = 0x04;
const STATUS_MATH_SATURATION: u8 = 0x01;

// Transfer function B: 10% to 90% of 2^24 counts over 0..25 psi.
const OUTPUT_MIN: u32 = 0x19_999A;
const OUTPUT_MAX: u32 = 0xE6_6666;
const PSI_MIN: f32 = 0.0;
const PSI_MAX: f32 = 25.0;
const HPA_PER_PSI: f32 = 68.947_572;

/// Honeywell MPRLS ported pressure sensor.
pub struct Mprls {
    core: SensorCore,
    pending: bool,
}

impl Mprls {
    pub const fn new() -> Self {
        Self {
            core: SensorCore::new(MPRLS_ADDRESS),
            pending: false,
        }
    }

    async fn status<I2C: I2c>(&self, i2c: &mut I2C) -> Result<u8, DriverError> {
        let mut status = [0u8; 1];
        i2c.read(self.core.bus_address(), &mut status)
            .await
            .map_err(|_| DriverError::Bus)?;
        Ok(status[0])
    }

    async fn cycle<I2C: I2c>(&mut self, i2c: &mut I2C) -> Result<Option<Reading>, DriverError> {
        let address = self.core.bus_address();
        let mut reading = None;
        if self.pending {
            let mut data = [0u8; 4];
            i2c.read(address, &mut data)
                .await
                .map_err(|_| DriverError::Bus)?;
            if data[0] & STATUS_BUSY != 0 {
                // Conversion still running; collect it next cycle.
                return Ok(None);
            }
            self.pending = false;
            let raw = u32::from_be_bytes([0, data[1], data[2], data[3]]);
            reading = Some(Self::convert(data[0], raw)?);
        }

        i2c.write(address, &CMD_MEASURE)
            .await
            .map_err(|_| DriverError::Bus)?;
        self.pending = true;
        Ok(reading)
    }

    fn convert(status: u8, raw: u32) -> Result<Reading, DriverError> {
        if status & (STATUS_INTEGRITY_FAILED | STATUS_MATH_SATURATION) != 0 {
            return Err(DriverError::Status);
        }
        let counts = raw.saturating_sub(OUTPUT_MIN) as f32;
        let psi = counts * (PSI_MAX - PSI_MIN) / (OUTPUT_MAX - OUTPUT_MIN) as f32 + PSI_MIN;
        Ok(Reading::Pressure {
            pressure_hpa: psi * HPA_PER_PSI,
        })
    }
}

impl Default for Mprls {
    fn default() -> Self {
        Self::new()
    }
}

impl_sensor_info!(Mprls, "MPRLS");

impl Sensor for Mprls {
    async fn probe<I2C: I2c, D: DelayNs>(&mut self, i2c: &mut I2C, _delay: &mut D) -> bool {
        self.pending = false;
        let found = matches!(self.status(i2c).await, Ok(s) if s & STATUS_POWERED != 0);
        self.core.set_present(found);
        found
    }

    async fn update<I2C: I2c>(&mut self, i2c: &mut I2C) {
        if !self.core.is_present() {
            return;
        }
        let result = self.cycle(i2c).await;
        self.core.record("MPRLS", result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::sensor::SensorInfo;
    use crate::testing::{FakeBus, FakeDevice, NoDelay};
    use embassy_futures::block_on;

    fn pressure(reading: Option<Reading>) -> f32 {
        match reading {
            Some(Reading::Pressure { pressure_hpa }) => pressure_hpa,
            other => panic!("unexpected reading {:?}", other),
        }
    }

    #[test]
    fn transfer_function_end_points() {
        let low = Mprls::convert(STATUS_POWERED, OUTPUT_MIN).unwrap();
        assert_eq!(low, Reading::Pressure { pressure_hpa: 0.0 });
        let high = pressure(Some(Mprls::convert(STATUS_POWERED, OUTPUT_MAX).unwrap()));
        assert!((high - 25.0 * HPA_PER_PSI).abs() < 0.5);
    }

    #[test]
    fn saturation_is_a_failed_sample() {
        assert_eq!(
            Mprls::convert(STATUS_POWERED | STATUS_MATH_SATURATION, OUTPUT_MAX),
            Err(DriverError::Status)
        );
    }

    #[test]
    fn probe_needs_power_bit() {
        let mut bus =
            FakeBus::new().with(FakeDevice::new(MPRLS_ADDRESS).respond_idle(&[0x00]));
        let mut mprls = Mprls::new();
        assert!(!block_on(mprls.probe(&mut bus, &mut NoDelay)));

        let mut bus =
            FakeBus::new().with(FakeDevice::new(MPRLS_ADDRESS).respond_idle(&[STATUS_POWERED]));
        assert!(block_on(mprls.probe(&mut bus, &mut NoDelay)));
        assert_eq!(mprls.address(), Some(MPRLS_ADDRESS));
    }

    #[test]
    fn busy_status_defers_collection() {
        let mut bus =
            FakeBus::new().with(FakeDevice::new(MPRLS_ADDRESS).respond_idle(&[STATUS_POWERED]));
        let mut mprls = Mprls::new();
        assert!(block_on(mprls.probe(&mut bus, &mut NoDelay)));

        block_on(mprls.update(&mut bus));
        bus.set_response(MPRLS_ADDRESS, CMD_MEASURE[0], &[STATUS_POWERED | STATUS_BUSY, 0, 0, 0]);
        bus.clear_log();
        block_on(mprls.update(&mut bus));
        assert_eq!(mprls.reading(), None);
        assert!(bus.writes(MPRLS_ADDRESS).is_empty());

        let [_, b1, b2, b3] = 0x80_0000u32.to_be_bytes();
        bus.set_response(MPRLS_ADDRESS, CMD_MEASURE[0], &[STATUS_POWERED, b1, b2, b3]);
        block_on(mprls.update(&mut bus));
        let hpa = pressure(mprls.reading());
        assert!((hpa - 12.5 * HPA_PER_PSI).abs() < 1.0, "pressure {}", hpa);
        assert_eq!(mprls.failures(), 0);
    }
}
