use std::path::Path;
use std::time::Duration;

use eframe::NativeOptions;
use egui::{CentralPanel, ColorImage, Image, Key, TextureHandle, TextureOptions, TopBottomPanel};
use embedded_graphics::pixelcolor::{Rgb565, Rgb888, raw::RawU16};
use embedded_graphics::prelude::RgbColor;
use sweep_plot::demo::track_markers;
use sweep_plot::settings::SWEEP_POINTS_CHOICES;
use sweep_plot::{
    DemoSweep, FrameBuffer, GammaLut, Init, LCD_HEIGHT, LCD_WIDTH, MARKERS_MAX, Measured,
    POINTS_COUNT, Plotter, Redraw, Settings, TRACES_MAX, XorShift32,
};

mod persistence;

use persistence::{SETTINGS_FILE, load_settings, save_settings};

const W: usize = LCD_WIDTH as usize;
const H: usize = LCD_HEIGHT as usize;

struct App {
    plotter: Plotter<GammaLut<Init>>,
    settings: Settings,
    measured: Measured,
    demo: DemoSweep<XorShift32>,
    screen: Vec<u16>,
    texture: TextureHandle,
    paused: bool,
    status: String,
}

impl App {
    pub fn new(cc: &eframe::CreationContext) -> Self {
        let texture = cc.egui_ctx.load_texture(
            "lcd",
            ColorImage::from_gray([W, H], &vec![0; W * H]),
            TextureOptions::NEAREST,
        );
        let path = Path::new(SETTINGS_FILE);
        let (settings, status) = if path.exists() {
            match load_settings(path) {
                Ok(s) => (s, format!("loaded {SETTINGS_FILE}")),
                Err(e) => (demo_settings(), format!("{SETTINGS_FILE}: {e}")),
            }
        } else {
            (demo_settings(), String::new())
        };
        let mut plotter = Plotter::new(GammaLut::new().init((2.2, 2.2, 2.2)));
        plotter.update_grid(&settings);

        App {
            plotter,
            settings,
            measured: [[-120.0; POINTS_COUNT]; TRACES_MAX],
            demo: DemoSweep::new(XorShift32::new(0x5eed)),
            screen: vec![0; W * H],
            texture,
            paused: false,
            status,
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let pressed = |k| ctx.input(|i| i.key_pressed(k));
        let s = &mut self.settings;
        if pressed(Key::W) {
            s.waterfall = s.waterfall.next();
            self.plotter.update_grid(s);
        }
        if pressed(Key::H) {
            s.ham_bands = !s.ham_bands;
            self.plotter.request_to_redraw_grid();
        }
        if pressed(Key::ArrowUp) || pressed(Key::ArrowDown) {
            s.reflevel += if pressed(Key::ArrowUp) { 10.0 } else { -10.0 };
            self.plotter.request_to_redraw_grid();
        }
        if pressed(Key::P) {
            let next = SWEEP_POINTS_CHOICES
                .iter()
                .position(|&n| n == s.sweep.points)
                .map_or(0, |i| (i + 1) % SWEEP_POINTS_CHOICES.len());
            s.sweep.points = SWEEP_POINTS_CHOICES[next];
            for m in s.markers.iter_mut() {
                m.index = m.index.min(s.sweep.points - 1);
                m.frequency = s.sweep.frequency(m.index);
            }
            self.plotter.request_to_redraw_grid();
        }
        if pressed(Key::S) {
            self.status = match save_settings(s, Path::new(SETTINGS_FILE)) {
                Ok(()) => format!("saved {SETTINGS_FILE}"),
                Err(e) => format!("{SETTINGS_FILE}: {e}"),
            };
        }
        if pressed(Key::Space) {
            self.paused = !self.paused;
        }
        if pressed(Key::Tab) {
            let next = s.active_marker.map_or(0, |m| (m + 1) % MARKERS_MAX);
            s.markers[next].enabled = true;
            s.active_marker = Some(next);
            self.plotter.request(Redraw::MARKER);
        }
        // manual marker moves only redraw around the marker
        let step = if pressed(Key::ArrowRight) {
            1
        } else if pressed(Key::ArrowLeft) {
            -1
        } else {
            0
        };
        if let Some(m) = s.active_marker.filter(|_| step != 0) {
            let points = s.sweep.points;
            let marker = &mut s.markers[m];
            marker.index = marker.index.saturating_add_signed(step).min(points - 1);
            marker.frequency = s.sweep.frequency(marker.index);
            let mut panel = FrameBuffer::new(&mut self.screen, W);
            let Ok(()) = self
                .plotter
                .redraw_marker(&mut panel, &self.settings, &self.measured, m);
        }
    }

    fn step(&mut self) {
        self.demo.fill(&self.settings, &mut self.measured);
        if track_markers(&mut self.settings, &self.measured) != 0 {
            self.plotter.request(Redraw::MARKER);
        }
        self.plotter.plot_into_index(&self.settings, &self.measured);
        let mut panel = FrameBuffer::new(&mut self.screen, W);
        let Ok(()) = self
            .plotter
            .draw_all(&mut panel, &self.settings, &self.measured, true);
    }

    fn upload(&mut self) {
        let rgb: Vec<u8> = self
            .screen
            .iter()
            .flat_map(|&px| {
                let c = Rgb888::from(Rgb565::from(RawU16::new(px)));
                [c.r(), c.g(), c.b()]
            })
            .collect();
        self.texture
            .set(ColorImage::from_rgb([W, H], &rgb), TextureOptions::NEAREST);
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);
        if !self.paused {
            self.step();
        }
        self.upload();

        TopBottomPanel::bottom("help").show(ctx, |ui| {
            ui.label(format!(
                "sweep {}  points {}  dirty {}  |  W waterfall, H ham bands, P points, up/down ref level, tab marker, left/right move, S save, space pause  {}",
                self.demo.sweeps(),
                self.settings.sweep.points,
                self.plotter.markmap().dirty_count(),
                self.status,
            ));
        });
        CentralPanel::default().show(ctx, |ui| {
            ui.add(Image::new(&self.texture).fit_to_original_size(3.0));
        });
        ctx.request_repaint_after(Duration::from_millis(1000 / 60));
    }
}

fn demo_settings() -> Settings {
    let mut settings = Settings::default();
    settings.sweep.start = 88_000_000;
    settings.sweep.stop = 108_000_000;
    settings.battery_mv = Some(3900);
    settings
}

fn main() -> eframe::Result {
    eframe::run_native(
        "sweep plot sim",
        NativeOptions::default(),
        Box::new(|cc| Ok(Box::new(App::new(cc)))),
    )
}
