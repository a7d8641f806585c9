//! Logical measurement roles and the sensors bound to them.

use crate::error::ErrorKind;
use crate::sensors::bank::SensorId;

/// Where on the device a measurement is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Role {
    Ambient,
    Intake,
    Desiccant,
    Output,
    InPressure,
    OutPressure,
    Color,
}

impl Role {
    pub const COUNT: usize = 7;

    /// Polling order.
    pub const ALL: [Role; Self::COUNT] = [
        Role::Ambient,
        Role::Intake,
        Role::Desiccant,
        Role::Output,
        Role::InPressure,
        Role::OutPressure,
        Role::Color,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Role::Ambient => "ambient",
            Role::Intake => "intake",
            Role::Desiccant => "desiccant",
            Role::Output => "output",
            Role::InPressure => "in-pressure",
            Role::OutPressure => "out-pressure",
            Role::Color => "color",
        }
    }

    /// Error raised when the role is configured but its sensor is missing.
    ///
    /// The inlet pressure role has no configuration and is never resolved.
    pub fn not_found_error(self) -> Option<ErrorKind> {
        match self {
            Role::Ambient => Some(ErrorKind::AmbientHumiditySensorNotFound),
            Role::Intake => Some(ErrorKind::IntakeHumiditySensorNotFound),
            Role::Desiccant => Some(ErrorKind::DesiccantHumiditySensorNotFound),
            Role::Output => Some(ErrorKind::OutputHumiditySensorNotFound),
            Role::InPressure => None,
            Role::OutPressure => Some(ErrorKind::OutPressureSensorNotFound),
            Role::Color => Some(ErrorKind::ColorSensorNotFound),
        }
    }

    /// Whether a sensor bound to this role is entered in the registry.
    pub fn is_registered(self) -> bool {
        !matches!(self, Role::Color)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// One optional sensor per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleBindings {
    slots: [Option<SensorId>; Role::COUNT],
}

impl RoleBindings {
    pub const fn new() -> Self {
        Self {
            slots: [None; Role::COUNT],
        }
    }

    pub fn get(&self, role: Role) -> Option<SensorId> {
        self.slots[role.index()]
    }

    /// Binds `role`. A role that is already bound keeps its sensor; returns
    /// whether the binding was made.
    pub fn bind(&mut self, role: Role, id: SensorId) -> bool {
        let slot = &mut self.slots[role.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(id);
        true
    }

    /// Bound roles in polling order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, SensorId)> + '_ {
        Role::ALL
            .into_iter()
            .filter_map(|role| self.get(role).map(|id| (role, id)))
    }

    pub fn bound_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}
