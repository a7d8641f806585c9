//! Configuration constants for the concentrator sensor firmware.
//!
//! This module centralizes all configuration values that are set via
//! environment variables at compile time or hardcoded constants.

use embassy_time::Duration;

/// Address value meaning "this role is not fitted on this device".
pub const UNCONFIGURED: u16 = 0xFFFF;

/// Bus address configured for each resolvable sensor role.
///
/// Any field may hold [`UNCONFIGURED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct SensorAddresses {
    pub ambient: u16,
    pub intake: u16,
    pub desiccant: u16,
    pub output: u16,
    pub out_pressure: u16,
    pub color: u16,
}

impl SensorAddresses {
    /// Every role unconfigured.
    pub const fn none() -> Self {
        Self {
            ambient: UNCONFIGURED,
            intake: UNCONFIGURED,
            desiccant: UNCONFIGURED,
            output: UNCONFIGURED,
            out_pressure: UNCONFIGURED,
            color: UNCONFIGURED,
        }
    }
}

/// Sensor configuration settings.
#[derive(Debug, Clone, Copy)]
pub struct SensorConfig {
    /// Fixed period between two polling passes over the bound roles.
    pub poll_period: Duration,
    /// How often the sensor task checks whether a pass is due.
    pub gate_interval: Duration,
    /// Role addresses.
    pub addresses: SensorAddresses,
}

/// Status output settings.
#[derive(Debug, Clone, Copy)]
pub struct StatusConfig {
    /// How often changed readings are printed.
    pub interval: Duration,
}

/// Watchdog configuration settings.
#[derive(Debug, Clone, Copy)]
pub struct WatchdogConfig {
    /// How often the watchdog task checks system health.
    pub tick_interval: Duration,
    /// Maximum age of sensor data before the system is considered unhealthy.
    pub sensor_timeout: Duration,
    /// Duration of the watchdog kick pulse (HIGH state) in milliseconds.
    pub kick_duration_ms: u32,
}

/// Global application configuration.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Sensor configuration.
    pub sensor: SensorConfig,
    /// Status output configuration.
    pub status: StatusConfig,
    /// Watchdog configuration.
    pub watchdog: WatchdogConfig,
}

impl Config {
    /// Creates a new configuration from compile-time environment variables.
    const fn new() -> Self {
        Self {
            sensor: SensorConfig {
                poll_period: Duration::from_millis(100),
                gate_interval: Duration::from_millis(10),
                addresses: SensorAddresses {
                    ambient: address_or(option_env!("AMBIENT_SENSOR_ADDRESS"), 0x77),
                    intake: address_or(option_env!("INTAKE_SENSOR_ADDRESS"), 0x76),
                    desiccant: address_or(option_env!("DESICCANT_SENSOR_ADDRESS"), 0x40),
                    output: address_or(option_env!("OUTPUT_SENSOR_ADDRESS"), 0x41),
                    out_pressure: address_or(option_env!("OUT_PRESSURE_SENSOR_ADDRESS"), 0x18),
                    color: address_or(option_env!("COLOR_SENSOR_ADDRESS"), 0x29),
                },
            },
            status: StatusConfig {
                interval: Duration::from_secs(1),
            },
            watchdog: WatchdogConfig {
                tick_interval: Duration::from_secs(60),
                sensor_timeout: Duration::from_secs(10),
                kick_duration_ms: 25,
            },
        }
    }
}

/// Parses an address override, falling back to `default` when unset.
///
/// Accepts hex with or without a `0x` prefix, or `none` for [`UNCONFIGURED`].
const fn address_or(value: Option<&str>, default: u16) -> u16 {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match parse_address(value.as_bytes()) {
        Some(address) => address,
        None => panic!("Invalid sensor address value"),
    }
}

const fn parse_address(bytes: &[u8]) -> Option<u16> {
    if bytes.len() == 4
        && (bytes[0] | 0x20) == b'n'
        && (bytes[1] | 0x20) == b'o'
        && (bytes[2] | 0x20) == b'n'
        && (bytes[3] | 0x20) == b'e'
    {
        return Some(UNCONFIGURED);
    }

    let mut i = 0;
    if bytes.len() > 2 && bytes[0] == b'0' && (bytes[1] | 0x20) == b'x' {
        i = 2;
    }
    if i == bytes.len() || bytes.len() - i > 4 {
        return None;
    }

    let mut value: u16 = 0;
    while i < bytes.len() {
        let digit = match bytes[i] {
            b @ b'0'..=b'9' => b - b'0',
            b @ b'a'..=b'f' => b - b'a' + 10,
            b @ b'A'..=b'F' => b - b'A' + 10,
            _ => return None,
        };
        value = (value << 4) | digit as u16;
        i += 1;
    }
    Some(value)
}

/// Global configuration instance.
pub static CONFIG: Config = Config::new();
