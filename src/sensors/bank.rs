//! The fixed set of driver instances fitted to the bus.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::sensors::bme280::{BME280_ADDRESS, BME280_ADDRESS_ALTERNATE, Bme280};
use crate::sensors::hdc2080::{HDC2080_ADDRESS_1, HDC2080_ADDRESS_2, Hdc2080};
use crate::sensors::htu21d::Htu21d;
use crate::sensors::mprls::Mprls;
use crate::sensors::sensor::{Sensor, SensorInfo};
use crate::sensors::shtc3::Shtc3;
use crate::sensors::tcs34725::Tcs34725;

/// Identifies one driver instance in the [`SensorBank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SensorId {
    Bme280Primary,
    Bme280Secondary,
    Shtc3,
    Hdc2080Primary,
    Hdc2080Secondary,
    Htu21d,
    Mprls,
    Tcs34725,
}

impl SensorId {
    pub const COUNT: usize = 8;

    /// Probe order.
    pub const ALL: [SensorId; Self::COUNT] = [
        SensorId::Bme280Primary,
        SensorId::Bme280Secondary,
        SensorId::Shtc3,
        SensorId::Hdc2080Primary,
        SensorId::Hdc2080Secondary,
        SensorId::Htu21d,
        SensorId::Mprls,
        SensorId::Tcs34725,
    ];

    /// Candidates for a humidity role, highest priority first. When two
    /// present sensors answer on the same address the earlier one wins.
    pub const HUMIDITY_SCAN_ORDER: [SensorId; 6] = [
        SensorId::Bme280Primary,
        SensorId::Bme280Secondary,
        SensorId::Shtc3,
        SensorId::Hdc2080Primary,
        SensorId::Hdc2080Secondary,
        SensorId::Htu21d,
    ];
}

/// Owns every driver instance for the lifetime of the firmware.
pub struct SensorBank {
    bme280_1: Bme280,
    bme280_2: Bme280,
    shtc3: Shtc3,
    hdc2080_1: Hdc2080,
    hdc2080_2: Hdc2080,
    htu21d: Htu21d,
    mprls: Mprls,
    tcs34725: Tcs34725,
}

impl SensorBank {
    pub const fn new() -> Self {
        Self {
            bme280_1: Bme280::new(BME280_ADDRESS),
            bme280_2: Bme280::new(BME280_ADDRESS_ALTERNATE),
            shtc3: Shtc3::new(),
            hdc2080_1: Hdc2080::new(HDC2080_ADDRESS_1),
            hdc2080_2: Hdc2080::new(HDC2080_ADDRESS_2),
            htu21d: Htu21d::new(),
            mprls: Mprls::new(),
            tcs34725: Tcs34725::new(),
        }
    }

    pub fn info(&self, id: SensorId) -> &dyn SensorInfo {
        match id {
            SensorId::Bme280Primary => &self.bme280_1,
            SensorId::Bme280Secondary => &self.bme280_2,
            SensorId::Shtc3 => &self.shtc3,
            SensorId::Hdc2080Primary => &self.hdc2080_1,
            SensorId::Hdc2080Secondary => &self.hdc2080_2,
            SensorId::Htu21d => &self.htu21d,
            SensorId::Mprls => &self.mprls,
            SensorId::Tcs34725 => &self.tcs34725,
        }
    }

    pub fn info_mut(&mut self, id: SensorId) -> &mut dyn SensorInfo {
        match id {
            SensorId::Bme280Primary => &mut self.bme280_1,
            SensorId::Bme280Secondary => &mut self.bme280_2,
            SensorId::Shtc3 => &mut self.shtc3,
            SensorId::Hdc2080Primary => &mut self.hdc2080_1,
            SensorId::Hdc2080Secondary => &mut self.hdc2080_2,
            SensorId::Htu21d => &mut self.htu21d,
            SensorId::Mprls => &mut self.mprls,
            SensorId::Tcs34725 => &mut self.tcs34725,
        }
    }

    pub async fn probe<I2C: I2c, D: DelayNs>(
        &mut self,
        id: SensorId,
        i2c: &mut I2C,
        delay: &mut D,
    ) -> bool {
        match id {
            SensorId::Bme280Primary => self.bme280_1.probe(i2c, delay).await,
            SensorId::Bme280Secondary => self.bme280_2.probe(i2c, delay).await,
            SensorId::Shtc3 => self.shtc3.probe(i2c, delay).await,
            SensorId::Hdc2080Primary => self.hdc2080_1.probe(i2c, delay).await,
            SensorId::Hdc2080Secondary => self.hdc2080_2.probe(i2c, delay).await,
            SensorId::Htu21d => self.htu21d.probe(i2c, delay).await,
            SensorId::Mprls => self.mprls.probe(i2c, delay).await,
            SensorId::Tcs34725 => self.tcs34725.probe(i2c, delay).await,
        }
    }

    /// Probes every instance in [`SensorId::ALL`] order and returns how many
    /// answered.
    pub async fn probe_all<I2C: I2c, D: DelayNs>(&mut self, i2c: &mut I2C, delay: &mut D) -> usize {
        let mut found = 0;
        for id in SensorId::ALL {
            if self.probe(id, i2c, delay).await {
                let info = self.info(id);
                defmt::info!(
                    "Probed {} at {=u8:#x}",
                    info.type_name(),
                    info.address().unwrap_or_default()
                );
                found += 1;
            }
        }
        found
    }

    pub async fn update<I2C: I2c>(&mut self, id: SensorId, i2c: &mut I2C) {
        match id {
            SensorId::Bme280Primary => self.bme280_1.update(i2c).await,
            SensorId::Bme280Secondary => self.bme280_2.update(i2c).await,
            SensorId::Shtc3 => self.shtc3.update(i2c).await,
            SensorId::Hdc2080Primary => self.hdc2080_1.update(i2c).await,
            SensorId::Hdc2080Secondary => self.hdc2080_2.update(i2c).await,
            SensorId::Htu21d => self.htu21d.update(i2c).await,
            SensorId::Mprls => self.mprls.update(i2c).await,
            SensorId::Tcs34725 => self.tcs34725.update(i2c).await,
        }
    }
}

impl Default for SensorBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBus, FakeDevice, NoDelay};
    use embassy_futures::block_on;

    #[test]
    fn probe_all_with_empty_bus_finds_nothing() {
        let mut bank = SensorBank::new();
        let mut bus = FakeBus::new();
        assert_eq!(block_on(bank.probe_all(&mut bus, &mut NoDelay)), 0);
        for id in SensorId::ALL {
            assert!(!bank.info(id).is_present());
            assert_eq!(bank.info(id).address(), None);
        }
    }

    #[test]
    fn probe_all_visits_instances_in_order() {
        let mut bank = SensorBank::new();
        let mut bus = FakeBus::new();
        block_on(bank.probe_all(&mut bus, &mut NoDelay));
        let mut visited = bus.transactions().to_vec();
        visited.dedup();
        assert_eq!(visited, vec![0x77, 0x76, 0x70, 0x40, 0x41, 0x40, 0x18, 0x29]);
    }

    #[test]
    fn type_names_are_static_per_family() {
        let bank = SensorBank::new();
        assert_eq!(bank.info(SensorId::Bme280Secondary).type_name(), "BME280");
        assert_eq!(bank.info(SensorId::Hdc2080Primary).type_name(), "HDC2080");
        assert_eq!(bank.info(SensorId::Tcs34725).type_name(), "TCS34725");
    }

    #[test]
    fn hdc2080_and_htu21d_can_share_an_address() {
        let (reg, ids) = crate::sensors::hdc2080::TEST_ID_REGISTERS;
        let mut bus = FakeBus::new().with(
            FakeDevice::new(0x40)
                .respond(reg, &ids)
                .respond(0xE7, &[0x02]),
        );
        let mut bank = SensorBank::new();
        assert_eq!(block_on(bank.probe_all(&mut bus, &mut NoDelay)), 2);
        assert_eq!(bank.info(SensorId::Hdc2080Primary).address(), Some(0x40));
        assert_eq!(bank.info(SensorId::Htu21d).address(), Some(0x40));
    }
}
