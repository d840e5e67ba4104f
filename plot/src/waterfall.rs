//! Scrolling colour history under a shortened plot.

use crate::index::TraceIndex;
use crate::palette::{Lut, raw};
use crate::panel::Panel;
use crate::{AREA_WIDTH_NORMAL, CHART_BOTTOM, LCD_WIDTH, NGRIDY, OFFSETX, WIDTH};

pub const SMALL_WATERFALL: i32 = 180;
pub const BIG_WATERFALL: i32 = 90;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WaterfallMode {
    #[default]
    Off,
    /// Plot keeps 180 rows.
    Small,
    /// Plot keeps 90 rows.
    Big,
}

impl WaterfallMode {
    /// Last row of the plot, the waterfall starts below it.
    pub const fn graph_bottom(self) -> i32 {
        match self {
            WaterfallMode::Off => CHART_BOTTOM,
            WaterfallMode::Small => SMALL_WATERFALL,
            WaterfallMode::Big => BIG_WATERFALL,
        }
    }

    /// Off, small, big, off.
    pub const fn next(self) -> Self {
        match self {
            WaterfallMode::Off => WaterfallMode::Small,
            WaterfallMode::Small => WaterfallMode::Big,
            WaterfallMode::Big => WaterfallMode::Off,
        }
    }

    pub const fn is_on(self) -> bool {
        !matches!(self, WaterfallMode::Off)
    }
}

/// Plot geometry that follows the waterfall mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Layout {
    pub mode: WaterfallMode,
    pub graph_bottom: i32,
    /// Pixels per vertical division.
    pub grid_y: i32,
    pub area_width: i32,
    pub area_height: i32,
}

impl Layout {
    pub const fn new(mode: WaterfallMode) -> Self {
        let graph_bottom = mode.graph_bottom();
        let grid_y = graph_bottom / NGRIDY;
        Layout {
            mode,
            graph_bottom,
            grid_y,
            area_width: AREA_WIDTH_NORMAL,
            area_height: grid_y * NGRIDY + 1,
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::new(WaterfallMode::Off)
    }
}

/// Gradient index for a plot row: strong signals near the top map high.
#[inline]
pub fn level_index(y: i16, mode: WaterfallMode) -> u8 {
    let k = if mode == WaterfallMode::Big { 2 } else { 1 };
    (SMALL_WATERFALL - y as i32 * k).clamp(0, u8::MAX as i32) as u8
}

/// Stretch `points` samples over `width` output columns. Sample `i`
/// covers every column `j` with `j * points < (i + 1) * width`, which
/// emits exactly `width` columns in total. Returns the number written.
pub fn rescale(
    samples: impl IntoIterator<Item = u16>,
    points: usize,
    width: usize,
    out: &mut [u16],
) -> usize {
    let mut j = 0;
    for (i, c) in samples.into_iter().take(points).enumerate() {
        while j * points < (i + 1) * width && j < out.len() {
            out[j] = c;
            j += 1;
        }
    }
    j
}

/// Owns the row buffer used to shuffle pixels through the panel.
pub struct Waterfall {
    row: [u16; LCD_WIDTH as usize],
}

impl Default for Waterfall {
    fn default() -> Self {
        Self::new()
    }
}

impl Waterfall {
    pub const fn new() -> Self {
        Waterfall {
            row: [0; LCD_WIDTH as usize],
        }
    }

    /// Push every waterfall row down by one and paint the newest sweep
    /// of trace `t` into the top row.
    pub fn update<P: Panel>(
        &mut self,
        panel: &mut P,
        layout: &Layout,
        index: &TraceIndex,
        t: usize,
        lut: &impl Lut,
    ) -> Result<(), P::Error> {
        if !layout.mode.is_on() {
            return Ok(());
        }
        let w = layout.area_width.min(WIDTH) as usize;
        let top = layout.graph_bottom + 1;
        let row = &mut self.row[..w];
        for y in (top..CHART_BOTTOM).rev() {
            panel.read_back(OFFSETX as u16, y as u16, w as u16, 1, row)?;
            // reads and writes share one buffer
            panel.finish()?;
            panel.bulk_blit(OFFSETX as u16, (y + 1) as u16, w as u16, 1, row)?;
        }
        let colours = index
            .ys(t)
            .iter()
            .map(|&y| raw(lut.lookup(level_index(y, layout.mode))));
        rescale(colours, index.points(), w, row);
        panel.bulk_blit(OFFSETX as u16, top as u16, w as u16, 1, row)?;
        panel.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;
    use crate::palette::Identity;
    use crate::units::{Unit, YMapper};
    use crate::{LCD_HEIGHT, POINTS_COUNT};

    #[test]
    fn rescale_fills_exact_width() {
        let mut out = [0u16; 320];
        let n = rescale(0..101u16, 101, 290, &mut out);
        assert_eq!(n, 290);
        // each sample covers two or three columns
        for s in 0..101u16 {
            let cols = out[..n].iter().filter(|&&c| c == s).count();
            assert!((2..=3).contains(&cols), "sample {s}: {cols}");
        }
        assert_eq!(out[0], 0);
        assert_eq!(out[289], 100);
        for points in [51, 201, 290, 450] {
            assert_eq!(rescale(core::iter::repeat(1), points, 289, &mut out), 289);
        }
    }

    #[test]
    fn layout_follows_mode() {
        let off = Layout::new(WaterfallMode::Off);
        assert_eq!((off.grid_y, off.area_height), (23, 231));
        let small = Layout::new(WaterfallMode::Small);
        assert_eq!((small.grid_y, small.area_height), (18, 181));
        let big = Layout::new(WaterfallMode::Big);
        assert_eq!((big.grid_y, big.area_height), (9, 91));
        assert_eq!(WaterfallMode::Big.next(), WaterfallMode::Off);
    }

    #[test]
    fn level_index_spans_gradient() {
        assert_eq!(level_index(0, WaterfallMode::Small), 180);
        assert_eq!(level_index(180, WaterfallMode::Small), 0);
        assert_eq!(level_index(90, WaterfallMode::Big), 0);
        assert_eq!(level_index(45, WaterfallMode::Big), 90);
    }

    #[test]
    fn update_scrolls_rows_down() {
        let layout = Layout::new(WaterfallMode::Big);
        let mut data = std::vec![0u16; (LCD_WIDTH * LCD_HEIGHT) as usize];
        let mut fb = FrameBuffer::new(&mut data, LCD_WIDTH as usize);
        let mut index = TraceIndex::new();
        index.update_x(290, WIDTH, 0);
        let mapper = YMapper::new(Unit::Dbm, 0.0, 10.0, layout.grid_y);
        index.update_y(0, &[-200.0; POINTS_COUNT], &mapper);
        let mut waterfall = Waterfall::new();
        let Ok(()) = waterfall.update(&mut fb, &layout, &index, 0, &Identity);
        let top = (layout.graph_bottom + 1) as usize;
        let bottom_colour = raw(Identity.lookup(0));
        assert_eq!(fb.pixel(OFFSETX as usize, top), Some(bottom_colour));
        assert_eq!(fb.pixel(OFFSETX as usize, top + 1), Some(0));

        index.update_y(0, &[0.0; POINTS_COUNT], &mapper);
        let Ok(()) = waterfall.update(&mut fb, &layout, &index, 0, &Identity);
        assert_eq!(fb.pixel(OFFSETX as usize, top + 1), Some(bottom_colour));
        assert_eq!(
            fb.pixel(OFFSETX as usize + 100, top),
            Some(raw(Identity.lookup(180)))
        );
        // nothing leaks left of the plot or past the chart
        assert_eq!(fb.pixel(OFFSETX as usize - 1, top), Some(0));
        assert_eq!(fb.pixel(OFFSETX as usize, CHART_BOTTOM as usize + 1), Some(0));
    }
}
