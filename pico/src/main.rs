#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{self, Adc, Async};
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::spi::{self, Spi};
use embassy_rp::trng;
use embassy_time::Timer;
use sweep_pico::{BATTERY_MV, Ili9341, Irqs, Trng, WRITE_HZ, run_display_core};
use {defmt_rtt as _, panic_probe as _};

/// VSYS is sensed through a 3:1 divider against the 3.3V reference.
fn vsys_millivolts(raw: u16) -> u16 {
    (raw as u32 * 3 * 3300 / 4096) as u16
}

#[embassy_executor::task]
async fn battery_monitor(mut adc: Adc<'static, Async>, mut vsys: adc::Channel<'static>) -> ! {
    loop {
        match adc.read(&mut vsys).await {
            Ok(raw) => BATTERY_MV.signal(vsys_millivolts(raw)),
            Err(e) => warn!("battery read failed: {}", e),
        }
        Timer::after_secs(1).await;
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("sweep-pico starting");

    let mut config = spi::Config::default();
    config.frequency = WRITE_HZ;
    let spi = Spi::new_blocking(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, config);
    let lcd = Ili9341::new(
        spi,
        Output::new(p.PIN_17, Level::High),
        Output::new(p.PIN_20, Level::Low),
        Output::new(p.PIN_21, Level::High),
        Output::new(p.PIN_22, Level::Low),
    );

    let adc = Adc::new(p.ADC, Irqs, adc::Config::default());
    let vsys = adc::Channel::new_pin(p.PIN_29, Pull::None);
    spawner.must_spawn(battery_monitor(adc, vsys));

    let rng = Trng::new(trng::Trng::new(p.TRNG, Irqs, trng::Config::default()));
    run_display_core(lcd, rng).await
}
