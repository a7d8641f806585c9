use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Instant};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use static_cell::StaticCell;

use crate::config::SensorAddresses;
use crate::error::{ErrorLog, ErrorReporter};
use crate::sensors::bank::{SensorBank, SensorId};
use crate::sensors::registry::SensorRegistry;
use crate::sensors::resolver::{claim_sensor, find_sensor};
use crate::sensors::roles::{Role, RoleBindings};
use crate::sensors::schedule::PollSchedule;
use crate::sensors::sensor::Reading;

/// Latest reading of every role; `None` for unbound roles and for sensors
/// that have not produced a sample yet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RoleReadings {
    readings: [Option<Reading>; Role::COUNT],
}

impl RoleReadings {
    pub const fn new() -> Self {
        Self {
            readings: [None; Role::COUNT],
        }
    }

    pub fn get(&self, role: Role) -> Option<Reading> {
        self.readings[role.index()]
    }

    pub fn set(&mut self, role: Role, reading: Option<Reading>) {
        self.readings[role.index()] = reading;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, Option<Reading>)> + '_ {
        Role::ALL.into_iter().map(|role| (role, self.get(role)))
    }
}

/// What the rest of the firmware gets to see of the sensor subsystem.
#[derive(Debug, Clone, Copy)]
pub struct SensorSnapshot {
    pub readings: RoleReadings,
    pub errors: ErrorLog,
    /// Number of polling passes run so far.
    pub firings: u32,
    pub last_updated: Instant,
}

impl SensorSnapshot {
    pub const fn new(now: Instant) -> Self {
        Self {
            readings: RoleReadings::new(),
            errors: ErrorLog::new(),
            firings: 0,
            last_updated: now,
        }
    }
}

#[derive(Clone, Copy)]
pub struct SharedSnapshot(&'static Mutex<CriticalSectionRawMutex, SensorSnapshot>);

impl SharedSnapshot {
    /// Creates the single shared snapshot. Panics if called twice.
    pub fn new(now: Instant) -> Self {
        static SNAPSHOT: StaticCell<Mutex<CriticalSectionRawMutex, SensorSnapshot>> =
            StaticCell::new();
        Self(SNAPSHOT.init(Mutex::new(SensorSnapshot::new(now))))
    }

    pub async fn lock(
        &self,
    ) -> embassy_sync::mutex::MutexGuard<'_, CriticalSectionRawMutex, SensorSnapshot> {
        self.0.lock().await
    }

    pub async fn update(&self, snapshot: SensorSnapshot) {
        let mut inner = self.0.lock().await;
        *inner = snapshot;
    }
}

/// Owns the bus, every driver instance and the role wiring.
///
/// Setup probes and resolves once; afterwards [`SensorManager::run`] is called
/// often and polls the bound roles whenever the fixed period has elapsed.
pub struct SensorManager<I2C> {
    i2c: I2C,
    bank: SensorBank,
    bindings: RoleBindings,
    registry: SensorRegistry,
    schedule: PollSchedule,
    firings: u32,
}

impl<I2C> SensorManager<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, period: Duration) -> Self {
        Self {
            i2c,
            bank: SensorBank::new(),
            bindings: RoleBindings::new(),
            registry: SensorRegistry::new(),
            schedule: PollSchedule::new(period),
            firings: 0,
        }
    }

    /// Probes every driver, binds the configured roles and arms the schedule
    /// so the first pass is due at `now`.
    ///
    /// Missing sensors are reported through `errors` and leave their role
    /// unbound; setup itself always completes.
    pub async fn setup<D: DelayNs>(
        &mut self,
        delay: &mut D,
        addresses: &SensorAddresses,
        errors: &mut impl ErrorReporter,
        now: Instant,
    ) {
        let probed = self.bank.probe_all(&mut self.i2c, delay).await;
        defmt::info!("{} sensors answered on the bus", probed);

        for (role, address) in [
            (Role::Ambient, addresses.ambient),
            (Role::Intake, addresses.intake),
            (Role::Desiccant, addresses.desiccant),
            (Role::Output, addresses.output),
        ] {
            if let Some(id) = find_sensor(&mut self.bank, &mut self.registry, role, address, errors)
            {
                self.bindings.bind(role, id);
            }
        }

        for (role, id, address) in [
            (Role::OutPressure, SensorId::Mprls, addresses.out_pressure),
            (Role::Color, SensorId::Tcs34725, addresses.color),
        ] {
            if let Some(id) =
                claim_sensor(&mut self.bank, &mut self.registry, role, id, address, errors)
            {
                self.bindings.bind(role, id);
            }
        }

        defmt::info!(
            "Sensor setup done: {} installed, {} roles bound",
            self.registry.len(),
            self.bindings.bound_count()
        );
        self.schedule.arm(now);
    }

    /// Runs a polling pass if one is due at `now`; returns whether it did.
    ///
    /// Bound roles are updated one after another in [`Role::ALL`] order. A
    /// sensor bound to more than one role is updated once per pass.
    pub async fn run(&mut self, now: Instant) -> bool {
        if !self.schedule.poll(now) {
            return false;
        }

        let mut updated: heapless::Vec<SensorId, { Role::COUNT }> = heapless::Vec::new();
        for (_, id) in self.bindings.iter() {
            if updated.contains(&id) {
                continue;
            }
            self.bank.update(id, &mut self.i2c).await;
            // At most one entry per role.
            let _ = updated.push(id);
        }

        self.firings = self.firings.wrapping_add(1);
        true
    }

    pub fn readings(&self) -> RoleReadings {
        let mut readings = RoleReadings::new();
        for (role, id) in self.bindings.iter() {
            readings.set(role, self.bank.info(id).reading());
        }
        readings
    }

    pub fn snapshot(&self, errors: ErrorLog, now: Instant) -> SensorSnapshot {
        SensorSnapshot {
            readings: self.readings(),
            errors,
            firings: self.firings,
            last_updated: now,
        }
    }

    pub fn bank(&self) -> &SensorBank {
        &self.bank
    }

    pub fn bindings(&self) -> &RoleBindings {
        &self.bindings
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    pub fn schedule(&self) -> &PollSchedule {
        &self.schedule
    }

    pub fn firings(&self) -> u32 {
        self.firings
    }
}
