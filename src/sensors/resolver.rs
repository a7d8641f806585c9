//! Maps configured role addresses onto probed driver instances.

use crate::config::UNCONFIGURED;
use crate::error::ErrorReporter;
use crate::sensors::bank::{SensorBank, SensorId};
use crate::sensors::registry::SensorRegistry;
use crate::sensors::roles::Role;

/// Looks for a present humidity sensor at `address` for `role`.
///
/// Candidates are tried in [`SensorId::HUMIDITY_SCAN_ORDER`] and the first
/// match wins. A miss is reported through `errors`; an [`UNCONFIGURED`]
/// address resolves to nothing without a report.
pub fn find_sensor(
    bank: &mut SensorBank,
    registry: &mut SensorRegistry,
    role: Role,
    address: u16,
    errors: &mut impl ErrorReporter,
) -> Option<SensorId> {
    if address == UNCONFIGURED {
        return None;
    }
    let found = SensorId::HUMIDITY_SCAN_ORDER
        .into_iter()
        .find(|id| bank.info(*id).address().map(u16::from) == Some(address));
    match found {
        Some(id) => Some(accept(bank, registry, role, id, address)),
        None => {
            reject(role, address, errors);
            None
        }
    }
}

/// Binds the only instance of a sensor family to `role` if it is present.
///
/// Used for roles served by a single fitted device (pressure, color), where
/// the configured address only says whether the role exists.
pub fn claim_sensor(
    bank: &mut SensorBank,
    registry: &mut SensorRegistry,
    role: Role,
    id: SensorId,
    address: u16,
    errors: &mut impl ErrorReporter,
) -> Option<SensorId> {
    if address == UNCONFIGURED {
        return None;
    }
    match bank.info(id).address() {
        Some(actual) => {
            if u16::from(actual) != address {
                defmt::warn!(
                    "{} sensor configured at {=u16:#x} but found at {=u8:#x}",
                    role.label(),
                    address,
                    actual
                );
            }
            Some(accept(bank, registry, role, id, u16::from(actual)))
        }
        None => {
            reject(role, address, errors);
            None
        }
    }
}

fn accept(
    bank: &mut SensorBank,
    registry: &mut SensorRegistry,
    role: Role,
    id: SensorId,
    address: u16,
) -> SensorId {
    let sensor = bank.info_mut(id);
    defmt::info!(
        "Found {} sensor: {} at {=u16:#x}",
        role.label(),
        sensor.type_name(),
        address
    );
    if let Some(previous) = sensor.label() {
        defmt::warn!("{} sensor is also used as {}", previous, role.label());
    }
    sensor.set_label(role.label());
    if role.is_registered() {
        registry.register(id);
    }
    id
}

fn reject(role: Role, address: u16, errors: &mut impl ErrorReporter) {
    defmt::warn!("Could not find {} sensor at {=u16:#x}", role.label(), address);
    if let Some(kind) = role.not_found_error() {
        errors.report(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ErrorLog};
    use crate::sensors::hdc2080::TEST_ID_REGISTERS;
    use crate::testing::{FakeBus, FakeDevice, NoDelay};
    use embassy_futures::block_on;

    /// A bank with HDC2080 and HTU21D both answering on 0x40.
    fn shared_address_bank() -> SensorBank {
        let (reg, ids) = TEST_ID_REGISTERS;
        let mut bus = FakeBus::new().with(
            FakeDevice::new(0x40)
                .respond(reg, &ids)
                .respond(0xE7, &[0x02]),
        );
        let mut bank = SensorBank::new();
        block_on(bank.probe_all(&mut bus, &mut NoDelay));
        bank
    }

    #[test]
    fn unconfigured_address_is_silent() {
        let mut bank = shared_address_bank();
        let mut registry = SensorRegistry::new();
        let mut errors = ErrorLog::new();
        for role in [Role::Ambient, Role::Intake, Role::Desiccant, Role::Output] {
            assert_eq!(
                find_sensor(&mut bank, &mut registry, role, UNCONFIGURED, &mut errors),
                None
            );
        }
        assert_eq!(
            claim_sensor(&mut bank, &mut registry, Role::Color, SensorId::Tcs34725, UNCONFIGURED, &mut errors),
            None
        );
        assert!(errors.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn earlier_candidate_wins_shared_address() {
        let mut bank = shared_address_bank();
        let mut registry = SensorRegistry::new();
        let mut errors = ErrorLog::new();
        let found = find_sensor(&mut bank, &mut registry, Role::Output, 0x40, &mut errors);
        assert_eq!(found, Some(SensorId::Hdc2080Primary));
        assert_eq!(bank.info(SensorId::Hdc2080Primary).label(), Some("output"));
        assert_eq!(bank.info(SensorId::Htu21d).label(), None);
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![SensorId::Hdc2080Primary]);
    }

    #[test]
    fn miss_reports_role_error_once() {
        let mut bank = shared_address_bank();
        let mut registry = SensorRegistry::new();
        let mut errors = ErrorLog::new();
        let found = find_sensor(&mut bank, &mut registry, Role::Intake, 0x70, &mut errors);
        assert_eq!(found, None);
        assert_eq!(errors.reports(), 1);
        assert!(errors.is_set(ErrorKind::IntakeHumiditySensorNotFound));
        assert!(registry.is_empty());
    }

    #[test]
    fn same_address_for_two_roles_registers_once() {
        let mut bank = shared_address_bank();
        let mut registry = SensorRegistry::new();
        let mut errors = ErrorLog::new();
        let a = find_sensor(&mut bank, &mut registry, Role::Desiccant, 0x40, &mut errors);
        let b = find_sensor(&mut bank, &mut registry, Role::Output, 0x40, &mut errors);
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
        assert_eq!(bank.info(SensorId::Hdc2080Primary).label(), Some("desiccant"));
        assert!(errors.is_empty());
    }

    #[test]
    fn absent_dedicated_sensor_reports() {
        let mut bank = shared_address_bank();
        let mut registry = SensorRegistry::new();
        let mut errors = ErrorLog::new();
        let found = claim_sensor(
            &mut bank,
            &mut registry,
            Role::OutPressure,
            SensorId::Mprls,
            0x18,
            &mut errors,
        );
        assert_eq!(found, None);
        assert!(errors.is_set(ErrorKind::OutPressureSensorNotFound));
        assert_eq!(errors.reports(), 1);
    }
}
