//! The capability every sensor driver provides to the manager.

use core::fmt;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

/// Last-known-good measurement of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, defmt::Format)]
pub enum Reading {
    /// Temperature and humidity, with pressure for sensors that measure it.
    Climate {
        temperature_c: f32,
        humidity_pct: f32,
        pressure_hpa: Option<f32>,
    },
    Pressure {
        pressure_hpa: f32,
    },
    /// Raw channel counts of a color sensor.
    Color {
        red: u16,
        green: u16,
        blue: u16,
        clear: u16,
    },
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Reading::Climate {
                temperature_c,
                humidity_pct,
                pressure_hpa,
            } => {
                write!(f, "{:.1} C {:.1} %", temperature_c, humidity_pct)?;
                if let Some(p) = pressure_hpa {
                    write!(f, " {:.1} hPa", p)?;
                }
                Ok(())
            }
            Reading::Pressure { pressure_hpa } => write!(f, "{:.1} hPa", pressure_hpa),
            Reading::Color {
                red,
                green,
                blue,
                clear,
            } => write!(f, "R{} G{} B{} C{}", red, green, blue, clear),
        }
    }
}

/// Reasons a single bus exchange with a driver did not produce a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub(crate) enum DriverError {
    Bus,
    Crc,
    /// The device answered but is not the part this driver expects.
    Identity,
    /// The device reported an error in its status byte.
    Status,
}

/// Synchronous, object-safe view of a sensor.
pub trait SensorInfo {
    /// Result of the most recent probe.
    fn is_present(&self) -> bool;

    /// Bus address; `None` unless the sensor is present.
    fn address(&self) -> Option<u8>;

    fn type_name(&self) -> &'static str;

    /// Role name assigned during setup, if any.
    fn label(&self) -> Option<&'static str>;

    /// Assigns the role name. Only the first call has an effect.
    fn set_label(&mut self, label: &'static str);

    fn reading(&self) -> Option<Reading>;

    /// Number of polling cycles that failed to produce a sample.
    fn failures(&self) -> u32;
}

/// A driver that can be probed and polled over an I2C bus.
///
/// The bus is lent to the driver for the duration of each call, so only one
/// driver talks on the bus at a time.
#[allow(async_fn_in_trait)]
pub trait Sensor: SensorInfo {
    /// Looks for the device and configures it. Absence is not an error.
    async fn probe<I2C: I2c, D: DelayNs>(&mut self, i2c: &mut I2C, delay: &mut D) -> bool;

    /// Runs one polling cycle. Never waits for a conversion: a measurement
    /// started here is collected on the next call. Failures keep the previous
    /// reading.
    async fn update<I2C: I2c>(&mut self, i2c: &mut I2C);
}

/// Bookkeeping shared by all drivers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SensorCore {
    address: u8,
    present: bool,
    label: Option<&'static str>,
    reading: Option<Reading>,
    failures: u32,
}

impl SensorCore {
    pub(crate) const fn new(address: u8) -> Self {
        Self {
            address,
            present: false,
            label: None,
            reading: None,
            failures: 0,
        }
    }

    /// Address the driver talks to, whether or not anything answered there.
    pub(crate) fn bus_address(&self) -> u8 {
        self.address
    }

    pub(crate) fn is_present(&self) -> bool {
        self.present
    }

    pub(crate) fn address(&self) -> Option<u8> {
        self.present.then_some(self.address)
    }

    pub(crate) fn set_present(&mut self, present: bool) {
        self.present = present;
    }

    pub(crate) fn label(&self) -> Option<&'static str> {
        self.label
    }

    pub(crate) fn set_label(&mut self, label: &'static str) {
        if self.label.is_none() {
            self.label = Some(label);
        }
    }

    pub(crate) fn reading(&self) -> Option<Reading> {
        self.reading
    }

    pub(crate) fn failures(&self) -> u32 {
        self.failures
    }

    /// Folds the outcome of one cycle into the cached state. `Ok(None)` means
    /// no sample was due this cycle.
    pub(crate) fn record(&mut self, name: &'static str, result: Result<Option<Reading>, DriverError>) {
        match result {
            Ok(Some(reading)) => self.reading = Some(reading),
            Ok(None) => {}
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                defmt::debug!("{} @ {=u8:#x}: cycle failed: {:?}", name, self.address, e);
            }
        }
    }
}

macro_rules! impl_sensor_info {
    ($driver:ty, $name:expr) => {
        impl $crate::sensors::sensor::SensorInfo for $driver {
            fn is_present(&self) -> bool {
                self.core.is_present()
            }

            fn address(&self) -> Option<u8> {
                self.core.address()
            }

            fn type_name(&self) -> &'static str {
                $name
            }

            fn label(&self) -> Option<&'static str> {
                self.core.label()
            }

            fn set_label(&mut self, label: &'static str) {
                self.core.set_label(label)
            }

            fn reading(&self) -> Option<$crate::sensors::sensor::Reading> {
                self.core.reading()
            }

            fn failures(&self) -> u32 {
                self.core.failures()
            }
        }
    };
}
pub(crate) use impl_sensor_info;
