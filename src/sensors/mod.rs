pub mod bank;
pub mod bme280;
mod crc;
pub mod hdc2080;
pub mod htu21d;
pub mod mprls;
pub mod registry;
pub mod resolver;
pub mod roles;
pub mod schedule;
pub mod sensor;
pub mod sensor_manager;
pub mod shtc3;
#[cfg(target_arch = "riscv32")]
pub mod task;
pub mod tcs34725;

pub use bank::{SensorBank, SensorId};
pub use roles::{Role, RoleBindings};
pub use sensor::{Reading, Sensor, SensorInfo};
pub use sensor_manager::{RoleReadings, SensorManager, SensorSnapshot, SharedSnapshot};
#[cfg(target_arch = "riscv32")]
pub use task::sensor_task;
