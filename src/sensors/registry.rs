use crate::sensors::bank::SensorId;

pub const REGISTRY_CAPACITY: usize = 10;

// Each instance is registered at most once, so the registry can never overflow.
const _: () = assert!(SensorId::COUNT <= REGISTRY_CAPACITY);

/// Sensors bound to a role during setup, in the order they were found.
///
/// Only used for diagnostics; polling goes through the role bindings.
#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    installed: heapless::Vec<SensorId, REGISTRY_CAPACITY>,
}

impl SensorRegistry {
    pub const fn new() -> Self {
        Self {
            installed: heapless::Vec::new(),
        }
    }

    /// Appends `id` unless it is already registered. Returns whether it was added.
    pub fn register(&mut self, id: SensorId) -> bool {
        if self.contains(id) {
            return false;
        }
        // Cannot fail: see the capacity assertion above.
        self.installed.push(id).is_ok()
    }

    pub fn contains(&self, id: SensorId) -> bool {
        self.installed.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.installed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SensorId> + '_ {
        self.installed.iter().copied()
    }
}
