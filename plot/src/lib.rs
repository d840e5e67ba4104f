#![no_std]

#[cfg(test)]
extern crate std;

// must come first so the logging macros are visible to the other modules
mod fmt;

pub mod cell;
pub mod demo;
pub mod framebuffer;
pub mod glyphs;
pub mod grid;
pub mod index;
pub mod markmap;
pub mod palette;
pub mod panel;
pub mod plot;
pub mod settings;
pub mod text;
pub mod units;
pub mod waterfall;

pub use demo::{DemoSweep, RngU32, XorShift32};
pub use framebuffer::FrameBuffer;
pub use palette::{GammaLut, Init, Palette, Uninit};
pub use panel::Panel;
pub use plot::{Plotter, Redraw};
pub use settings::{Marker, MarkerType, Measurement, Settings, Sweep, Trace};
pub use units::Unit;
pub use waterfall::WaterfallMode;

pub const LCD_WIDTH: i32 = 320;
pub const LCD_HEIGHT: i32 = 240;

/// Left margin of the plot area, holds the battery icon.
pub const OFFSETX: i32 = 30;
pub const OFFSETY: i32 = 0;
/// Number of horizontal grid divisions.
pub const NGRIDY: i32 = 10;
/// Last row usable by the chart, the frequency line sits below it.
pub const CHART_BOTTOM: i32 = LCD_HEIGHT - 10;
/// Plot width in pixels, the x axis spans `0..=WIDTH`.
pub const WIDTH: i32 = LCD_WIDTH - 1 - OFFSETX;
pub const AREA_WIDTH_NORMAL: i32 = WIDTH + 1;
/// Left edge of the reference level ladder in the right gutter.
pub const GRID_X_TEXT: i32 = AREA_WIDTH_NORMAL - 35;

pub const CELLWIDTH: i32 = 32;
pub const CELLHEIGHT: i32 = 32;

pub const POINTS_COUNT: usize = 450;
pub const TRACES_MAX: usize = 3;
pub const MARKERS_MAX: usize = 4;

pub const TRACE_ACTUAL: usize = 0;
pub const TRACE_STORED: usize = 1;
pub const TRACE_TEMP: usize = 2;

/// One row of raw dBm samples per measurement channel.
pub type Measured = [[f32; POINTS_COUNT]; TRACES_MAX];
