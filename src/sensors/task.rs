use crate::config::CONFIG;
use crate::error::ErrorLog;
use crate::sensors::{SensorManager, SharedSnapshot};
use embassy_time::{Delay, Instant, Timer};

#[embassy_executor::task]
pub async fn sensor_task(
    mut manager: SensorManager<esp_hal::i2c::master::I2c<'static, esp_hal::Async>>,
    snapshot: SharedSnapshot,
) -> ! {
    defmt::info!("Setting up sensors...");
    let mut errors = ErrorLog::new();
    manager
        .setup(&mut Delay, &CONFIG.sensor.addresses, &mut errors, Instant::now())
        .await;
    if !errors.is_empty() {
        defmt::warn!("Sensor setup raised {}", errors);
    }
    snapshot.update(manager.snapshot(errors, Instant::now())).await;

    loop {
        let now = Instant::now();
        if manager.run(now).await {
            snapshot.update(manager.snapshot(errors, now)).await;
        }
        Timer::after(CONFIG.sensor.gate_interval).await;
    }
}
