use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::sensors::sensor::{DriverError, Reading, Sensor, SensorCore, impl_sensor_info};

pub const BME280_ADDRESS: u8 = 0x77;
pub const BME280_ADDRESS_ALTERNATE: u8 = 0x76;

const CHIP_ID: u8 = 0x60;

// Registers
const REG_CALIB_00: u8 = 0x88;
const REG_CHIP_ID: u8 = 0xD0;
const REG_RESET: u8 = 0xE0;
const REG_CALIB_26: u8 = 0xE1;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_DATA: u8 = 0xF7;

const RESET_COMMAND: u8 = 0xB6;
// Oversampling x1 on every channel, normal mode, 62.5ms standby.
const CTRL_HUM_X1: u8 = 0x01;
const CTRL_MEAS_NORMAL_X1: u8 = 0b001_001_11;
const CONFIG_STANDBY_62MS: u8 = 0b001_000_00;

const RESET_DELAY_MS: u32 = 3;

const CALIB_00_LEN: usize = 26;
const CALIB_26_LEN: usize = 7;
const DATA_LEN: usize = 8;

/// Humidity ADC value reported while humidity measurement is skipped.
const HUMIDITY_SKIPPED: u32 = 0x8000;

/// Factory trimming parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Calibration {
    t1: u16,
    t2: i16,
    t3: i16,
    p1: u16,
    p2: i16,
    p3: i16,
    p4: i16,
    p5: i16,
    p6: i16,
    p7: i16,
    p8: i16,
    p9: i16,
    h1: u8,
    h2: i16,
    h3: u8,
    h4: i16,
    h5: i16,
    h6: i8,
}

impl Calibration {
    const EMPTY: Self = Self {
        t1: 0,
        t2: 0,
        t3: 0,
        p1: 0,
        p2: 0,
        p3: 0,
        p4: 0,
        p5: 0,
        p6: 0,
        p7: 0,
        p8: 0,
        p9: 0,
        h1: 0,
        h2: 0,
        h3: 0,
        h4: 0,
        h5: 0,
        h6: 0,
    };

    fn parse(c: &[u8; CALIB_00_LEN], h: &[u8; CALIB_26_LEN]) -> Self {
        let u = |i: usize| u16::from_le_bytes([c[i], c[i + 1]]);
        let s = |i: usize| i16::from_le_bytes([c[i], c[i + 1]]);
        Self {
            t1: u(0),
            t2: s(2),
            t3: s(4),
            p1: u(6),
            p2: s(8),
            p3: s(10),
            p4: s(12),
            p5: s(14),
            p6: s(16),
            p7: s(18),
            p8: s(20),
            p9: s(22),
            h1: c[25],
            h2: i16::from_le_bytes([h[0], h[1]]),
            h3: h[2],
            h4: ((h[3] as i8 as i16) << 4) | (h[4] & 0x0F) as i16,
            h5: ((h[5] as i8 as i16) << 4) | (h[4] >> 4) as i16,
            h6: h[6] as i8,
        }
    }

    /// Returns `(temperature °C, t_fine)`.
    fn compensate_temperature(&self, adc_t: u32) -> (f64, f64) {
        let adc = adc_t as f64;
        let t1 = self.t1 as f64;
        let var1 = (adc / 16384.0 - t1 / 1024.0) * self.t2 as f64;
        let d = adc / 131072.0 - t1 / 8192.0;
        let var2 = d * d * self.t3 as f64;
        let t_fine = var1 + var2;
        (t_fine / 5120.0, t_fine)
    }

    /// Pressure in Pa.
    fn compensate_pressure(&self, adc_p: u32, t_fine: f64) -> Option<f64> {
        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * self.p6 as f64 / 32768.0;
        var2 += var1 * self.p5 as f64 * 2.0;
        var2 = var2 / 4.0 + self.p4 as f64 * 65536.0;
        var1 = (self.p3 as f64 * var1 * var1 / 524288.0 + self.p2 as f64 * var1) / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * self.p1 as f64;
        if var1 == 0.0 {
            return None;
        }
        let mut p = 1048576.0 - adc_p as f64;
        p = (p - var2 / 4096.0) * 6250.0 / var1;
        let var1 = self.p9 as f64 * p * p / 2147483648.0;
        let var2 = p * self.p8 as f64 / 32768.0;
        Some(p + (var1 + var2 + self.p7 as f64) / 16.0)
    }

    /// Relative humidity in %.
    fn compensate_humidity(&self, adc_h: u32, t_fine: f64) -> f64 {
        let mut h = t_fine - 76800.0;
        h = (adc_h as f64 - (self.h4 as f64 * 64.0 + self.h5 as f64 / 16384.0 * h))
            * (self.h2 as f64 / 65536.0
                * (1.0
                    + self.h6 as f64 / 67108864.0 * h * (1.0 + self.h3 as f64 / 67108864.0 * h)));
        h *= 1.0 - self.h1 as f64 * h / 524288.0;
        h.clamp(0.0, 100.0)
    }
}

/// Bosch BME280 combined humidity, pressure and temperature sensor.
///
/// Runs in normal mode, so every update only reads the latest result.
pub struct Bme280 {
    core: SensorCore,
    calibration: Calibration,
}

impl Bme280 {
    pub const fn new(address: u8) -> Self {
        Self {
            core: SensorCore::new(address),
            calibration: Calibration::EMPTY,
        }
    }

    async fn init<I2C: I2c, D: DelayNs>(
        &mut self,
        i2c: &mut I2C,
        delay: &mut D,
    ) -> Result<(), DriverError> {
        let address = self.core.bus_address();
        let mut id = [0u8; 1];
        i2c.write_read(address, &[REG_CHIP_ID], &mut id)
            .await
            .map_err(|_| DriverError::Bus)?;
        if id[0] != CHIP_ID {
            return Err(DriverError::Identity);
        }

        i2c.write(address, &[REG_RESET, RESET_COMMAND])
            .await
            .map_err(|_| DriverError::Bus)?;
        delay.delay_ms(RESET_DELAY_MS).await;

        let mut calib = [0u8; CALIB_00_LEN];
        i2c.write_read(address, &[REG_CALIB_00], &mut calib)
            .await
            .map_err(|_| DriverError::Bus)?;
        let mut calib_h = [0u8; CALIB_26_LEN];
        i2c.write_read(address, &[REG_CALIB_26], &mut calib_h)
            .await
            .map_err(|_| DriverError::Bus)?;
        self.calibration = Calibration::parse(&calib, &calib_h);

        // ctrl_hum only takes effect after a write to ctrl_meas.
        for command in [
            [REG_CTRL_HUM, CTRL_HUM_X1],
            [REG_CONFIG, CONFIG_STANDBY_62MS],
            [REG_CTRL_MEAS, CTRL_MEAS_NORMAL_X1],
        ] {
            i2c.write(address, &command)
                .await
                .map_err(|_| DriverError::Bus)?;
        }
        Ok(())
    }

    async fn read<I2C: I2c>(&mut self, i2c: &mut I2C) -> Result<Option<Reading>, DriverError> {
        let mut data = [0u8; DATA_LEN];
        i2c.write_read(self.core.bus_address(), &[REG_DATA], &mut data)
            .await
            .map_err(|_| DriverError::Bus)?;
        Ok(Some(self.convert(&data)))
    }

    fn convert(&self, data: &[u8; DATA_LEN]) -> Reading {
        let adc_p = ((data[0] as u32) << 12) | ((data[1] as u32) << 4) | ((data[2] as u32) >> 4);
        let adc_t = ((data[3] as u32) << 12) | ((data[4] as u32) << 4) | ((data[5] as u32) >> 4);
        let adc_h = ((data[6] as u32) << 8) | data[7] as u32;

        let cal = &self.calibration;
        let (temperature, t_fine) = cal.compensate_temperature(adc_t);
        let pressure = cal.compensate_pressure(adc_p, t_fine);
        let humidity = if adc_h == HUMIDITY_SKIPPED {
            0.0
        } else {
            cal.compensate_humidity(adc_h, t_fine)
        };

        Reading::Climate {
            temperature_c: temperature as f32,
            humidity_pct: humidity as f32,
            pressure_hpa: pressure.map(|pa| (pa / 100.0) as f32),
        }
    }
}

impl_sensor_info!(Bme280, "BME280");

impl Sensor for Bme280 {
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
        self.core.record("BME280", result);
    }
}
