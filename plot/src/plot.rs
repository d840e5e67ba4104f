//! Incremental tile renderer.
//!
//! A frame is `plot_into_index` followed by `draw_all`. The first maps the
//! new sweep to screen points and marks the tiles it touches, the second
//! recomposes every tile dirty in this or the previous frame and sends it
//! to the panel.

use crate::cell::Cell;
use crate::glyphs::{
    self, BATTERY_HEIGHT, BATTERY_WARNING_LEVEL, BATTERY_WIDTH, MARKER_HEIGHT, MARKER_PLATE,
    MARKER_WIDTH, X_MARKER_OFFSET, Y_MARKER_OFFSET,
};
use crate::grid::{self, GridSpacing};
use crate::index::TraceIndex;
use crate::markmap::Markmap;
use crate::palette::{Lut, raw};
use crate::panel::Panel;
use crate::settings::{Settings, TriggerMode};
use crate::text::{self, FontSize, Overlay};
use crate::units::YMapper;
use crate::waterfall::{Layout, Waterfall};
use crate::{
    AREA_WIDTH_NORMAL, CELLHEIGHT, CELLWIDTH, CHART_BOTTOM, GRID_X_TEXT, LCD_HEIGHT, LCD_WIDTH,
    MARKERS_MAX, Measured, OFFSETX, OFFSETY, TRACE_ACTUAL, TRACES_MAX, WIDTH,
};

/// Top of the battery icon in the left margin.
pub const BATTERY_START: i32 = LCD_HEIGHT - 40;
const BATTERY_STRIP_HEIGHT: i32 = 30;
/// Row of the bottom status line.
pub const FREQUENCIES_YPOS: i32 = LCD_HEIGHT - 8;
/// Height of the marker readout band at the top of the plot.
const UPPER_AREA_HEIGHT: i32 = 31;

/// Pending redraw work, serviced and cleared by `draw_all`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Redraw(u8);

impl Redraw {
    pub const NONE: Redraw = Redraw(0);
    /// Tiles already marked dirty.
    pub const CELLS: Redraw = Redraw(1 << 0);
    /// Bottom status line.
    pub const FREQUENCY: Redraw = Redraw(1 << 1);
    /// Marker readouts on the top band.
    pub const MARKER: Redraw = Redraw(1 << 2);
    pub const BATTERY: Redraw = Redraw(1 << 3);
    /// The whole plot area.
    pub const AREA: Redraw = Redraw(1 << 4);
    /// Tile row under the trigger level.
    pub const TRIGGER: Redraw = Redraw(1 << 5);

    pub const fn contains(self, other: Redraw) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Redraw) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl core::ops::BitOr for Redraw {
    type Output = Redraw;

    fn bitor(self, rhs: Redraw) -> Redraw {
        Redraw(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for Redraw {
    fn bitor_assign(&mut self, rhs: Redraw) {
        self.0 |= rhs.0;
    }
}

pub struct Plotter<L: Lut> {
    index: TraceIndex,
    markmap: Markmap,
    cell: Cell,
    overlay: Overlay,
    waterfall: Waterfall,
    lut: L,
    layout: Layout,
    grid: GridSpacing,
    redraw: Redraw,
    /// Plot row of the trigger line as last marked, `None` in auto mode.
    trigger_row: Option<i32>,
    /// Top left corner of each marker glyph as last marked.
    marker_glyphs: [Option<(i32, i32)>; MARKERS_MAX],
    /// The waterfall region changed size and must be blanked once.
    clear_waterfall: bool,
}

impl<L: Lut> Plotter<L> {
    pub fn new(lut: L) -> Self {
        Plotter {
            index: TraceIndex::new(),
            markmap: Markmap::new(),
            cell: Cell::new(),
            overlay: Overlay::default(),
            waterfall: Waterfall::new(),
            lut,
            layout: Layout::default(),
            grid: GridSpacing::default(),
            redraw: Redraw::AREA | Redraw::FREQUENCY | Redraw::BATTERY,
            trigger_row: None,
            marker_glyphs: [None; MARKERS_MAX],
            clear_waterfall: false,
        }
    }

    pub fn index(&self) -> &TraceIndex {
        &self.index
    }

    pub fn markmap(&self) -> &Markmap {
        &self.markmap
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn grid(&self) -> &GridSpacing {
        &self.grid
    }

    pub fn pending(&self) -> Redraw {
        self.redraw
    }

    pub fn request(&mut self, redraw: Redraw) {
        self.redraw |= redraw;
    }

    /// Force the whole plot area to be redrawn, after anything that moves
    /// every pixel: reference level, scale, unit, palette.
    pub fn request_to_redraw_grid(&mut self) {
        self.redraw |= Redraw::AREA;
        trace!("redraw grid requested");
    }

    /// Recompute the vertical grid from the sweep. Zero span puts time on
    /// the x axis.
    pub fn update_grid(&mut self, settings: &Settings) {
        let sweep = &settings.sweep;
        self.grid = GridSpacing::new(
            sweep.start,
            sweep.span(),
            sweep.actual_sweep_time_us,
            settings.gridlines,
        );
        debug!(
            "grid step {} offset {} width {}",
            self.grid.step, self.grid.offset, self.grid.width
        );
        self.sync_layout(settings);
        if self.layout.mode.is_on() {
            self.clear_waterfall = true;
        }
        self.redraw |= Redraw::FREQUENCY | Redraw::AREA;
    }

    fn sync_layout(&mut self, settings: &Settings) {
        if settings.waterfall == self.layout.mode {
            return;
        }
        self.layout = Layout::new(settings.waterfall);
        self.clear_waterfall = true;
        self.redraw |= Redraw::AREA;
        info!(
            "waterfall {}: plot {} rows, grid {}",
            settings.waterfall as u8, self.layout.area_height, self.layout.grid_y
        );
    }

    fn mapper(&self, settings: &Settings) -> YMapper {
        YMapper::new(
            settings.unit,
            settings.reflevel,
            settings.scale,
            self.layout.grid_y,
        )
    }

    /// Map the sweep into screen points and mark every tile whose content
    /// may change: the trace polylines, the marker glyphs, the readout band
    /// and the trigger row.
    pub fn plot_into_index(&mut self, settings: &Settings, measured: &Measured) {
        self.sync_layout(settings);
        self.index.update_x(settings.sweep.points, WIDTH, 0);
        let points = self.index.points();
        let mapper = self.mapper(settings);

        let follow = settings.waterfall.is_on().then(|| settings.waterfall_trace());
        for (t, trace) in settings.traces.iter().enumerate() {
            if !trace.enabled && follow != Some(t) {
                continue;
            }
            let ch = trace.channel.min(TRACES_MAX - 1);
            self.index.update_y(t, &measured[ch][..points], &mapper);
        }

        for (t, _) in TraceIndex::enabled(&settings.traces) {
            let index = &self.index;
            self.markmap.mark_polyline(
                index
                    .xs()
                    .iter()
                    .zip(index.ys(t))
                    .map(|(&x, &y)| (x as i32, y as i32)),
            );
        }
        self.mark_markers(settings);
        self.mark_upper_area();
        self.sync_trigger(settings);
        self.redraw |= Redraw::CELLS;
    }

    fn mark_upper_area(&mut self) {
        self.markmap.mark_rect(0, 0, AREA_WIDTH_NORMAL, UPPER_AREA_HEIGHT);
    }

    fn marker_glyph(&self, settings: &Settings, i: usize) -> Option<(i32, i32)> {
        let marker = &settings.markers[i];
        if !marker.enabled || !settings.traces[TRACE_ACTUAL].enabled || self.index.points() == 0 {
            return None;
        }
        let p = self
            .index
            .point(TRACE_ACTUAL, marker.index.min(self.index.points() - 1));
        Some((p.x as i32 - X_MARKER_OFFSET, p.y as i32 - Y_MARKER_OFFSET))
    }

    fn mark_glyph(&mut self, (x, y): (i32, i32)) {
        self.markmap.mark_rect(x, y, x + MARKER_WIDTH - 1, y + MARKER_HEIGHT - 1);
    }

    fn mark_marker(&mut self, settings: &Settings, i: usize) {
        let glyph = self.marker_glyph(settings, i);
        if let Some(pos) = glyph {
            self.mark_glyph(pos);
        }
        self.marker_glyphs[i] = glyph;
    }

    fn mark_markers(&mut self, settings: &Settings) {
        for i in 0..MARKERS_MAX {
            self.mark_marker(settings, i);
        }
    }

    fn mark_trigger_row(&mut self, row: i32) {
        let n = row / CELLHEIGHT;
        self.markmap.mark_cells(0, n, AREA_WIDTH_NORMAL / CELLWIDTH, n);
    }

    /// Track the trigger line; when it moves both its old and new tile
    /// rows get redrawn.
    fn sync_trigger(&mut self, settings: &Settings) {
        let row = (settings.trigger != TriggerMode::Auto)
            .then(|| self.mapper(settings).map(settings.trigger_level) as i32);
        if row == self.trigger_row {
            return;
        }
        if let Some(old) = self.trigger_row {
            self.mark_trigger_row(old);
        }
        self.trigger_row = row;
        self.redraw |= Redraw::TRIGGER;
    }

    /// Service pending redraw requests. With `flush` the dirty map
    /// advances one frame afterwards; without it the next full frame still
    /// sees this frame's marks.
    pub fn draw_all<P: Panel>(
        &mut self,
        panel: &mut P,
        settings: &Settings,
        measured: &Measured,
        flush: bool,
    ) -> Result<(), P::Error> {
        self.sync_layout(settings);
        self.sync_trigger(settings);
        if self.redraw.is_empty() {
            return Ok(());
        }

        if self.redraw.contains(Redraw::AREA) {
            self.markmap.force_all();
        }
        if self.redraw.contains(Redraw::MARKER) {
            self.mark_upper_area();
        }
        if self.redraw.contains(Redraw::TRIGGER) {
            if let Some(row) = self.trigger_row {
                self.mark_trigger_row(row);
            }
        }
        let cells = Redraw::CELLS | Redraw::MARKER | Redraw::AREA | Redraw::TRIGGER;
        if self.redraw.intersects(cells) {
            if self.clear_waterfall {
                self.clear_waterfall_area(panel, settings)?;
            }
            self.overlay = Overlay::build(settings, measured);
            self.draw_all_cells(panel, settings, flush)?;
            if settings.waterfall.is_on() {
                self.waterfall.update(
                    panel,
                    &self.layout,
                    &self.index,
                    settings.waterfall_trace(),
                    &self.lut,
                )?;
            }
        }
        if self.redraw.contains(Redraw::FREQUENCY) {
            self.draw_frequencies(panel, settings)?;
        }
        if self.redraw.contains(Redraw::BATTERY) {
            self.draw_battery_status(panel, settings)?;
        }
        self.redraw = Redraw::NONE;
        Ok(())
    }

    /// Fast path for moving one marker: only its old and new glyph and the
    /// readout band are recomposed, and the dirty map is left for the next
    /// full frame.
    pub fn redraw_marker<P: Panel>(
        &mut self,
        panel: &mut P,
        settings: &Settings,
        measured: &Measured,
        marker: usize,
    ) -> Result<(), P::Error> {
        if marker >= MARKERS_MAX {
            return Ok(());
        }
        if let Some(old) = self.marker_glyphs[marker] {
            self.mark_glyph(old);
        }
        self.mark_marker(settings, marker);
        self.mark_upper_area();
        self.overlay = Overlay::build(settings, measured);
        self.draw_all_cells(panel, settings, false)
    }

    /// Blank the whole panel and redraw the static parts.
    pub fn redraw_frame<P: Panel>(
        &mut self,
        panel: &mut P,
        settings: &Settings,
    ) -> Result<(), P::Error> {
        panel.set_background(settings.palette.background);
        panel.fill(0, 0, LCD_WIDTH as u16, LCD_HEIGHT as u16)?;
        self.draw_frequencies(panel, settings)?;
        self.redraw |= Redraw::AREA | Redraw::BATTERY;
        Ok(())
    }

    fn clear_waterfall_area<P: Panel>(
        &mut self,
        panel: &mut P,
        settings: &Settings,
    ) -> Result<(), P::Error> {
        self.clear_waterfall = false;
        let top = self.layout.graph_bottom + 1;
        if top > CHART_BOTTOM {
            return Ok(());
        }
        panel.set_background(settings.palette.background);
        panel.fill(
            OFFSETX as u16,
            top as u16,
            (LCD_WIDTH - OFFSETX) as u16,
            (CHART_BOTTOM + 1 - top) as u16,
        )
    }

    fn draw_all_cells<P: Panel>(
        &mut self,
        panel: &mut P,
        settings: &Settings,
        flush: bool,
    ) -> Result<(), P::Error> {
        let cols = (self.layout.area_width + CELLWIDTH - 1) / CELLWIDTH;
        let rows = (self.layout.area_height + CELLHEIGHT - 1) / CELLHEIGHT;
        for m in 0..cols {
            for n in 0..rows {
                if self.markmap.is_dirty(m as usize, n as usize) {
                    self.draw_cell(panel, settings, m, n)?;
                }
            }
        }
        panel.finish()?;
        if flush {
            self.markmap.swap_and_clear();
        }
        Ok(())
    }

    fn draw_cell<P: Panel>(
        &mut self,
        panel: &mut P,
        settings: &Settings,
        m: i32,
        n: i32,
    ) -> Result<(), P::Error> {
        let x0 = m * CELLWIDTH;
        let y0 = n * CELLHEIGHT;
        let w = CELLWIDTH.min(self.layout.area_width - x0);
        let h = CELLHEIGHT.min(self.layout.area_height - y0);
        if w <= 0 || h <= 0 {
            return Ok(());
        }
        // the previous tile may still be in flight
        panel.finish()?;

        let palette = &settings.palette;
        let cell = &mut self.cell;
        cell.reset(w, h, raw(palette.background));

        let grid_colour = raw(palette.grid);
        let sweep = &settings.sweep;
        let ham = settings.ham_bands && !sweep.is_cw();
        for x in 0..w {
            if ham && grid::in_ham_band(grid::column_frequency(sweep.start, sweep.span(), x + x0)) {
                cell.fill_column(x, raw(palette.ham));
            }
            if self.grid.is_vertical(x + x0) {
                cell.fill_column(x, grid_colour);
            }
        }
        // horizontal lines stop at the right edge of the plot
        let right = w.min(WIDTH + 1 - x0);
        for y in 0..h {
            if grid::is_horizontal(y + y0, self.layout.grid_y) {
                cell.fill_row(y, 0, right, grid_colour);
            }
        }

        if let Some(row) = self.trigger_row {
            let tp = row - y0;
            if (0..h).contains(&tp) {
                cell.fill_row(tp, 0, right, raw(palette.trigger));
            }
        }

        if m >= GRID_X_TEXT / CELLWIDTH {
            text::draw_grid_ladder(
                cell,
                GRID_X_TEXT - x0,
                y0,
                settings,
                self.layout.grid_y,
                palette.grid_value,
            );
        }

        for (t, _) in TraceIndex::enabled(&settings.traces) {
            let Some((i0, i1)) = self.index.search_index_range_x(x0, w) else {
                continue;
            };
            let colour = raw(palette.trace[t]);
            for i in i0..i1 {
                let a = self.index.point(t, i);
                let b = self.index.point(t, i + 1);
                cell.draw_line(
                    a.x as i32 - x0,
                    a.y as i32 - y0,
                    b.x as i32 - x0,
                    b.y as i32 - y0,
                    colour,
                );
            }
        }

        for i in 0..MARKERS_MAX {
            let Some((gx, gy)) = self.marker_glyph(settings, i) else {
                continue;
            };
            let (x, y) = (gx - x0, gy - y0);
            let trace_colour = raw(palette.trace[TRACE_ACTUAL]);
            let cell = &mut self.cell;
            cell.blit_bitmap(x, y, MARKER_WIDTH, MARKER_HEIGHT, &MARKER_PLATE, trace_colour);
            cell.blit_bitmap(
                x,
                y,
                MARKER_WIDTH,
                MARKER_HEIGHT,
                glyphs::marker_numeral(i),
                raw(palette.background),
            );
        }

        if n == 0 {
            self.overlay.draw(&mut self.cell, x0, y0);
        }

        let pixels = self.cell.pixels();
        panel.bulk_blit(
            (OFFSETX + x0) as u16,
            (OFFSETY + y0) as u16,
            w as u16,
            h as u16,
            pixels,
        )
    }

    /// Bottom status line: sweep position and grid step on the left,
    /// extent right aligned.
    pub fn draw_frequencies<P: Panel>(
        &mut self,
        panel: &mut P,
        settings: &Settings,
    ) -> Result<(), P::Error> {
        let (left, right) = text::frequency_line(settings, self.grid.step);
        let size = FontSize::Small;
        let h = size.height();
        let right_x = LCD_WIDTH - size.advance() * right.chars().count() as i32;
        let bg = raw(settings.palette.background);
        let fg = settings.palette.foreground;
        for x0 in (OFFSETX..LCD_WIDTH).step_by(CELLWIDTH as usize) {
            let w = CELLWIDTH.min(LCD_WIDTH - x0);
            panel.finish()?;
            self.cell.reset(w, h, bg);
            text::draw_text(&mut self.cell, &left, OFFSETX - x0, 0, size, fg);
            text::draw_text(&mut self.cell, &right, right_x - x0, 0, size, fg);
            panel.bulk_blit(
                x0 as u16,
                FREQUENCIES_YPOS as u16,
                w as u16,
                h as u16,
                self.cell.pixels(),
            )?;
        }
        panel.finish()
    }

    /// Battery icon and voltage in the left margin. Nothing is drawn while
    /// the voltage is unknown.
    pub fn draw_battery_status<P: Panel>(
        &mut self,
        panel: &mut P,
        settings: &Settings,
    ) -> Result<(), P::Error> {
        let Some(mv) = settings.battery_mv.filter(|&mv| mv > 0) else {
            return Ok(());
        };
        let palette = &settings.palette;
        let colour = if mv < BATTERY_WARNING_LEVEL {
            palette.low_battery
        } else {
            palette.normal_battery
        };
        panel.finish()?;
        let cell = &mut self.cell;
        cell.reset(OFFSETX, BATTERY_STRIP_HEIGHT, raw(palette.background));
        cell.blit_bitmap(
            7,
            0,
            BATTERY_WIDTH,
            BATTERY_HEIGHT,
            &glyphs::battery(mv),
            raw(colour),
        );
        text::draw_text(
            cell,
            &text::battery_text(mv),
            1,
            BATTERY_HEIGHT + 3,
            FontSize::Small,
            colour,
        );
        panel.bulk_blit(
            0,
            BATTERY_START as u16,
            OFFSETX as u16,
            BATTERY_STRIP_HEIGHT as u16,
            cell.pixels(),
        )?;
        panel.finish()
    }
}
