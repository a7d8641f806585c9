//! Feeds the external TPL5010 watchdog while the sensor pass keeps running.
//!
//! A bus transaction that hangs inside a driver stops the polling passes, the
//! shared snapshot goes stale, the kicks stop and the watchdog resets the
//! device.

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Whether sensor data published at `last_updated` is fresh enough at `now`.
pub fn sensors_healthy(now: Instant, last_updated: Instant, timeout: Duration) -> bool {
    now.saturating_duration_since(last_updated) <= timeout
}

/// Pulses the watchdog DONE pin: HIGH for `duration_ms`, then LOW.
pub fn kick<P: OutputPin, D: DelayNs>(
    pin: &mut P,
    delay: &mut D,
    duration_ms: u32,
) -> Result<(), P::Error> {
    pin.set_high()?;
    delay.delay_ms(duration_ms);
    pin.set_low()
}

#[cfg(target_arch = "riscv32")]
#[embassy_executor::task]
pub async fn watchdog_task(
    mut watchdog_pin: esp_hal::gpio::Output<'static>,
    mut delay: esp_hal::delay::Delay,
    snapshot: crate::sensors::SharedSnapshot,
) {
    use crate::config::CONFIG;
    use embassy_time::Ticker;

    // DONE idles low between pulses.
    watchdog_pin.set_low();
    let mut ticker = Ticker::every(CONFIG.watchdog.tick_interval);

    loop {
        ticker.next().await;
        let now = Instant::now();

        let last_updated = snapshot.lock().await.last_updated;
        if sensors_healthy(now, last_updated, CONFIG.watchdog.sensor_timeout) {
            let _ = kick(&mut watchdog_pin, &mut delay, CONFIG.watchdog.kick_duration_ms);
            defmt::info!("Fed external watchdog");
        } else {
            defmt::info!(
                "Watchdog: Sensors stale (Age: {:?}). Skipping watchdog kick.",
                defmt::Display2Format(&now.saturating_duration_since(last_updated))
            );
        }
    }
}
