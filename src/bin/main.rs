#![no_std]
#![no_main]
#![feature(type_alias_impl_trait)]
#![feature(impl_trait_in_assoc_type)]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_time::{Duration, Instant, Timer};
use esp_backtrace as _; // Register the panic handler.
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use esp_println as _; // Register the defmt UART global logger.
// use defmt_rtt as _; // Register the defmt RTT global logger.

use concentrator as lib;

// This creates a default app-descriptor required by the esp-idf bootloader.
esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    defmt::info!("Init...");

    let reset_reason = esp_hal::system::reset_reason();
    defmt::info!("Reset Reason: {:?}", defmt::Debug2Format(&reset_reason));

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timg0 = TimerGroup::new(peripherals.TIMG0);

    let sw_int =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);

    esp_rtos::start(timg0.timer0, sw_int.software_interrupt0);

    defmt::info!("RTOS scheduler initialized");

    let delay = esp_hal::delay::Delay::new();

    // External Watchdog (TPL5010) Kick on GPIO2.
    let watchdog_pin = esp_hal::gpio::Output::new(
        peripherals.GPIO2,
        esp_hal::gpio::Level::Low,
        esp_hal::gpio::OutputConfig::default().with_pull(esp_hal::gpio::Pull::Down),
    );

    // Every sensor shares I2C0; the sensor task is its only user.
    let i2c0 = esp_hal::i2c::master::I2c::new(
        peripherals.I2C0,
        esp_hal::i2c::master::Config::default(),
    )
    .expect("Failed to configure I2C0")
    .with_sda(peripherals.GPIO7)
    .with_scl(peripherals.GPIO6)
    .into_async();

    let sensor_manager =
        lib::sensors::SensorManager::new(i2c0, lib::config::CONFIG.sensor.poll_period);
    let snapshot = lib::sensors::SharedSnapshot::new(Instant::now());
    spawner.must_spawn(lib::sensors::sensor_task(sensor_manager, snapshot));
    spawner.must_spawn(lib::status::status_task(snapshot));
    spawner.must_spawn(lib::watchdog::watchdog_task(watchdog_pin, delay, snapshot));

    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}
