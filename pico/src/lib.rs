#![no_std]

mod display_core;
mod lcd;

pub use display_core::{BATTERY_MV, Trng, run_display_core};
pub use lcd::{Ili9341, LcdError, READ_HZ, WRITE_HZ};
use embassy_rp::{bind_interrupts, peripherals::TRNG};

bind_interrupts!(pub struct Irqs {
    TRNG_IRQ => embassy_rp::trng::InterruptHandler<TRNG>;
    ADC_IRQ_FIFO => embassy_rp::adc::InterruptHandler;
});
