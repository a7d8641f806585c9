//! Operator-facing view of the sensor readings.
//!
//! Only roles whose reading changed since they were last shown are printed,
//! so a steady device stays quiet.

use crate::sensors::{Reading, Role, RoleReadings};

#[derive(Debug, Default)]
pub struct ReadingTracker {
    shown: RoleReadings,
}

impl ReadingTracker {
    pub const fn new() -> Self {
        Self {
            shown: RoleReadings::new(),
        }
    }

    /// Returns the roles whose reading differs from what was last shown and
    /// remembers the new values.
    pub fn changed(&mut self, current: &RoleReadings) -> heapless::Vec<(Role, Reading), { Role::COUNT }> {
        let mut changed = heapless::Vec::new();
        for (role, reading) in current.iter() {
            if reading == self.shown.get(role) {
                continue;
            }
            self.shown.set(role, reading);
            if let Some(reading) = reading {
                // One entry per role at most.
                let _ = changed.push((role, reading));
            }
        }
        changed
    }
}

#[cfg(target_arch = "riscv32")]
#[embassy_executor::task]
pub async fn status_task(snapshot: crate::sensors::SharedSnapshot) -> ! {
    use core::fmt::Write;

    let mut tracker = ReadingTracker::new();
    let mut ticker = embassy_time::Ticker::every(crate::config::CONFIG.status.interval);
    loop {
        ticker.next().await;
        let readings = snapshot.lock().await.readings;
        for (role, reading) in tracker.changed(&readings) {
            let mut line: heapless::String<48> = heapless::String::new();
            let _ = write!(line, "{}", reading);
            defmt::info!("{}: {}", role.label(), line.as_str());
        }
    }
}
