//! The tile buffer and the primitives that draw into it.
//!
//! Coordinates are local to the tile. Everything clips against the full
//! `CELLWIDTH x CELLHEIGHT` buffer; edge tiles narrower than that are
//! compacted just before they are sent to the panel.

use embedded_graphics::{
    Pixel,
    pixelcolor::Rgb565,
    prelude::{DrawTarget, OriginDimensions, Size},
};

use crate::palette::raw;
use crate::{CELLHEIGHT, CELLWIDTH};

pub const CELL_PIXELS: usize = (CELLWIDTH * CELLHEIGHT) as usize;

pub struct Cell {
    buf: [u16; CELL_PIXELS],
    w: i32,
    h: i32,
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}

impl Cell {
    pub const fn new() -> Self {
        Cell {
            buf: [0; CELL_PIXELS],
            w: CELLWIDTH,
            h: CELLHEIGHT,
        }
    }

    /// Start a new tile of `w x h` visible pixels filled with `bg`.
    pub fn reset(&mut self, w: i32, h: i32, bg: u16) {
        self.w = w.clamp(0, CELLWIDTH);
        self.h = h.clamp(0, CELLHEIGHT);
        self.buf[..(self.h * CELLWIDTH) as usize].fill(bg);
    }

    pub const fn width(&self) -> i32 {
        self.w
    }

    pub const fn height(&self) -> i32 {
        self.h
    }

    #[inline]
    fn offset(x: i32, y: i32) -> Option<usize> {
        if (0..CELLWIDTH).contains(&x) && (0..CELLHEIGHT).contains(&y) {
            Some((y * CELLWIDTH + x) as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u16> {
        Self::offset(x, y).map(|i| self.buf[i])
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, c: u16) {
        if let Some(i) = Self::offset(x, y) {
            self.buf[i] = c;
        }
    }

    /// Paint column `x` over the visible height.
    pub fn fill_column(&mut self, x: i32, c: u16) {
        if !(0..CELLWIDTH).contains(&x) {
            return;
        }
        for y in 0..self.h {
            self.buf[(y * CELLWIDTH + x) as usize] = c;
        }
    }

    /// Paint row `y` between columns `x0..x1`.
    pub fn fill_row(&mut self, y: i32, x0: i32, x1: i32, c: u16) {
        if !(0..CELLHEIGHT).contains(&y) {
            return;
        }
        let x0 = x0.max(0);
        let x1 = x1.min(self.w);
        if x0 >= x1 {
            return;
        }
        let row = (y * CELLWIDTH) as usize;
        self.buf[row + x0 as usize..row + x1 as usize].fill(c);
    }

    /// Bresenham line OR-ed into the buffer so crossing traces mix.
    /// Segments that miss the tile on either axis are rejected up front.
    pub fn draw_line(&mut self, mut x0: i32, mut y0: i32, mut x1: i32, mut y1: i32, c: u16) {
        if x0 < 0 && x1 < 0 {
            return;
        }
        if y0 < 0 && y1 < 0 {
            return;
        }
        if x0 >= CELLWIDTH && x1 >= CELLWIDTH {
            return;
        }
        if y0 >= CELLHEIGHT && y1 >= CELLHEIGHT {
            return;
        }

        if x1 < x0 {
            core::mem::swap(&mut x0, &mut x1);
            core::mem::swap(&mut y0, &mut y1);
        }
        let dx = x1 - x0;
        let (dy, sy) = if y1 < y0 { (y0 - y1, -1) } else { (y1 - y0, 1) };
        let mut err = (if dx > dy { dx } else { -dy }) / 2;

        loop {
            if let Some(i) = Self::offset(x0, y0) {
                self.buf[i] |= c;
            }
            if x0 == x1 && y0 == y1 {
                return;
            }
            let e2 = err;
            if e2 > -dx {
                err -= dy;
                x0 += 1;
            }
            if e2 < dy {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// 1bpp bitmap, MSB first, each row padded to whole bytes. Zero bits
    /// are transparent.
    pub fn blit_bitmap(&mut self, x: i32, y: i32, w: i32, h: i32, bitmap: &[u8], c: u16) {
        if x <= -w || y <= -h || x >= CELLWIDTH || y >= CELLHEIGHT {
            return;
        }
        let stride = ((w + 7) / 8) as usize;
        for (r, row) in bitmap.chunks(stride).take(h as usize).enumerate() {
            let py = y + r as i32;
            if !(0..CELLHEIGHT).contains(&py) {
                continue;
            }
            for col in 0..w {
                let bits = row[(col / 8) as usize];
                if bits & (0x80 >> (col % 8)) == 0 {
                    continue;
                }
                if let Some(i) = Self::offset(x + col, py) {
                    self.buf[i] = c;
                }
            }
        }
    }

    /// Visible pixels, packed `w` per row. Partial tiles are compacted
    /// in place first.
    pub fn pixels(&mut self) -> &[u16] {
        let (w, h) = (self.w as usize, self.h as usize);
        if w < CELLWIDTH as usize {
            for y in 1..h {
                let src = y * CELLWIDTH as usize;
                self.buf.copy_within(src..src + w, y * w);
            }
        }
        &self.buf[..w * h]
    }
}

impl OriginDimensions for Cell {
    fn size(&self) -> Size {
        Size::new(CELLWIDTH as u32, CELLHEIGHT as u32)
    }
}

impl DrawTarget for Cell {
    type Color = Rgb565;

    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels.into_iter() {
            self.set(coord.x, coord.y, raw(color));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(cell: &Cell) -> usize {
        cell.buf.iter().filter(|&&p| p != 0).count()
    }

    #[test]
    fn line_outside_tile_writes_nothing() {
        let mut cell = Cell::new();
        cell.reset(CELLWIDTH, CELLHEIGHT, 0);
        cell.draw_line(-10, 5, -1, 20, 0xffff);
        cell.draw_line(40, 5, 100, 20, 0xffff);
        cell.draw_line(3, -20, 20, -1, 0xffff);
        cell.draw_line(3, CELLHEIGHT, 20, CELLHEIGHT + 50, 0xffff);
        assert_eq!(lit(&cell), 0);
    }

    #[test]
    fn diagonal_is_clipped_to_tile() {
        let mut cell = Cell::new();
        cell.reset(CELLWIDTH, CELLHEIGHT, 0);
        cell.draw_line(-5, -5, CELLWIDTH + 5, CELLHEIGHT + 5, 0x0001);
        assert_eq!(lit(&cell), CELLWIDTH as usize);
        for i in 0..CELLWIDTH {
            assert_eq!(cell.get(i, i), Some(1));
        }
    }

    #[test]
    fn line_direction_does_not_matter() {
        let mut a = Cell::new();
        let mut b = Cell::new();
        a.reset(CELLWIDTH, CELLHEIGHT, 0);
        b.reset(CELLWIDTH, CELLHEIGHT, 0);
        a.draw_line(2, 30, 29, 3, 1);
        b.draw_line(29, 3, 2, 30, 1);
        assert_eq!(a.buf, b.buf);
        assert_eq!(a.get(2, 30), Some(1));
        assert_eq!(a.get(29, 3), Some(1));
    }

    #[test]
    fn lines_combine_by_or() {
        let mut cell = Cell::new();
        cell.reset(CELLWIDTH, CELLHEIGHT, 0);
        cell.draw_line(0, 10, 31, 10, 0b01);
        cell.draw_line(10, 0, 10, 31, 0b10);
        assert_eq!(cell.get(10, 10), Some(0b11));
        assert_eq!(cell.get(11, 10), Some(0b01));
    }

    #[test]
    fn bitmap_clips_per_pixel() {
        const SQUARE: [u8; 3] = [0b1110_0000, 0b1010_0000, 0b1110_0000];
        let mut cell = Cell::new();
        cell.reset(CELLWIDTH, CELLHEIGHT, 0);
        cell.blit_bitmap(-3, 0, 3, 3, &SQUARE, 5);
        assert_eq!(lit(&cell), 0);
        cell.blit_bitmap(-1, -1, 3, 3, &SQUARE, 5);
        // only the bottom right corner lands
        assert_eq!(lit(&cell), 3);
        assert_eq!(cell.get(0, 1), Some(5));
        assert_eq!(cell.get(1, 1), Some(5));
        assert_eq!(cell.get(1, 0), Some(5));
        assert_eq!(cell.get(0, 0), Some(0));
    }

    #[test]
    fn wide_bitmap_rows_span_bytes() {
        let bitmap = [0x80, 0x80, 0x00, 0x80];
        let mut cell = Cell::new();
        cell.reset(CELLWIDTH, CELLHEIGHT, 0);
        cell.blit_bitmap(0, 0, 9, 2, &bitmap, 7);
        assert_eq!(cell.get(0, 0), Some(7));
        assert_eq!(cell.get(8, 0), Some(7));
        assert_eq!(cell.get(0, 1), Some(0));
        assert_eq!(cell.get(8, 1), Some(7));
    }

    #[test]
    fn partial_tile_compacts_rows() {
        let mut cell = Cell::new();
        cell.reset(2, 3, 0);
        for y in 0..3 {
            cell.set(0, y, y as u16 * 10);
            cell.set(1, y, y as u16 * 10 + 1);
        }
        assert_eq!(cell.pixels(), &[0, 1, 10, 11, 20, 21]);
    }
}
