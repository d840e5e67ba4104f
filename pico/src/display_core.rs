use embassy_rp::peripherals::TRNG;
use embassy_rp::spi::Instance;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use static_cell::StaticCell;
use sweep_plot::demo::track_markers;
use sweep_plot::{
    DemoSweep, GammaLut, Init, Measured, POINTS_COUNT, Plotter, Redraw, RngU32, Settings,
    TRACES_MAX, WaterfallMode,
};

use crate::lcd::Ili9341;

pub struct Trng<'d> {
    trng: embassy_rp::trng::Trng<'d, TRNG>,
}

impl<'d> Trng<'d> {
    pub fn new(trng: embassy_rp::trng::Trng<'d, TRNG>) -> Self {
        Trng { trng }
    }
}

impl RngU32 for Trng<'_> {
    fn next_u32(&mut self) -> u32 {
        self.trng.blocking_next_u32()
    }
}

static PLOTTER: StaticCell<Plotter<GammaLut<Init>>> = StaticCell::new();
static MEASURED: StaticCell<Measured> = StaticCell::new();

/// Latest battery voltage in millivolts.
pub static BATTERY_MV: Signal<CriticalSectionRawMutex, u16> = Signal::new();

const FRAME: Duration = Duration::from_millis(1000 / 60);

pub async fn run_display_core<T: Instance>(mut lcd: Ili9341<'static, T>, rng: Trng<'static>) -> ! {
    let plotter = PLOTTER.init_with(|| Plotter::new(GammaLut::new().init((2.2, 2.2, 2.2))));
    let measured = MEASURED.init_with(|| [[-120.0; POINTS_COUNT]; TRACES_MAX]);

    let mut settings = Settings::default();
    settings.waterfall = WaterfallMode::Small;
    settings.sweep.start = 88_000_000;
    settings.sweep.stop = 108_000_000;

    if let Err(e) = lcd.init().await {
        defmt::error!("lcd init failed: {}", e);
    }
    plotter.update_grid(&settings);
    if let Err(e) = plotter.redraw_frame(&mut lcd, &settings) {
        defmt::warn!("frame clear failed: {}", e);
    }

    let mut demo = DemoSweep::new(rng);
    let mut start_time = Instant::now();

    loop {
        let elapsed = start_time.elapsed();
        start_time = Instant::now();

        if let Some(mv) = BATTERY_MV.try_take() {
            if settings.battery_mv != Some(mv) {
                settings.battery_mv = Some(mv);
                plotter.request(Redraw::BATTERY);
            }
        }

        demo.fill(&settings, measured);
        if track_markers(&mut settings, measured) != 0 {
            plotter.request(Redraw::MARKER);
        }
        plotter.plot_into_index(&settings, measured);
        if let Err(e) = plotter.draw_all(&mut lcd, &settings, measured, true) {
            defmt::warn!("frame {} dropped: {}", demo.sweeps(), e);
        }

        let busy = start_time.elapsed();
        if demo.sweeps() % 64 == 0 {
            defmt::debug!(
                "frame {}us, render {}us, {} tiles dirty",
                elapsed.as_micros(),
                busy.as_micros(),
                plotter.markmap().dirty_count()
            );
        }
        if let Some(t) = FRAME.checked_sub(busy) {
            Timer::after(t).await;
        }
    }
}
