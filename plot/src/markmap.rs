//! Double buffered per-tile dirty flags.
//!
//! A tile is redrawn while its bit is set in either page. The pages swap
//! once per completed frame and the new current page starts empty, so a
//! tile touched in one frame is reconsidered in the next one as well and
//! the pixels it used to carry get cleared.

use core::mem;

use crate::{CELLHEIGHT, CELLWIDTH, LCD_HEIGHT, LCD_WIDTH};

pub const MAX_MARKMAP_X: usize = ((LCD_WIDTH + CELLWIDTH - 1) / CELLWIDTH) as usize;
pub const MAX_MARKMAP_Y: usize = ((LCD_HEIGHT + CELLHEIGHT - 1) / CELLHEIGHT) as usize;

type Page = [u16; MAX_MARKMAP_Y];

const ALL_COLUMNS: u16 = ((1u32 << MAX_MARKMAP_X) - 1) as u16;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Markmap {
    current: Page,
    previous: Page,
}

impl Markmap {
    pub const fn new() -> Self {
        Markmap {
            current: [0; MAX_MARKMAP_Y],
            previous: [0; MAX_MARKMAP_Y],
        }
    }

    pub fn current(&self) -> &Page {
        &self.current
    }

    pub fn previous(&self) -> &Page {
        &self.previous
    }

    /// Mark a single tile. Out of range tiles are ignored.
    #[inline]
    pub fn mark(&mut self, m: i32, n: i32) {
        if (0..MAX_MARKMAP_X as i32).contains(&m) && (0..MAX_MARKMAP_Y as i32).contains(&n) {
            self.current[n as usize] |= 1 << m;
        }
    }

    /// Mark every tile in the inclusive tile rectangle spanned by two
    /// corners, in any order.
    pub fn mark_cells(&mut self, m0: i32, n0: i32, m1: i32, n1: i32) {
        let (m0, m1) = (m0.min(m1).max(0), m0.max(m1).min(MAX_MARKMAP_X as i32 - 1));
        let (n0, n1) = (n0.min(n1).max(0), n0.max(n1).min(MAX_MARKMAP_Y as i32 - 1));
        if m0 > m1 || n0 > n1 {
            return;
        }
        let bits = (((1u32 << (m1 - m0 + 1)) - 1) << m0) as u16;
        for row in &mut self.current[n0 as usize..=n1 as usize] {
            *row |= bits;
        }
    }

    /// Mark every tile touched by the inclusive pixel rectangle.
    pub fn mark_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        if x1 < 0 || y1 < 0 {
            return;
        }
        self.mark_cells(x0 / CELLWIDTH, y0 / CELLHEIGHT, x1 / CELLWIDTH, y1 / CELLHEIGHT);
    }

    /// Mark the tiles crossed by a polyline. Whenever consecutive points
    /// fall in different tiles the whole tile rectangle between them is
    /// marked, which over-covers steep segments but never misses one.
    pub fn mark_polyline(&mut self, points: impl IntoIterator<Item = (i32, i32)>) {
        let mut prev: Option<(i32, i32)> = None;
        for (x, y) in points {
            let cell = (x / CELLWIDTH, y / CELLHEIGHT);
            match prev {
                None => self.mark(cell.0, cell.1),
                Some(p) if p != cell => self.mark_cells(p.0, p.1, cell.0, cell.1),
                Some(_) => {}
            }
            prev = Some(cell);
        }
    }

    pub fn force_all(&mut self) {
        self.current = [ALL_COLUMNS; MAX_MARKMAP_Y];
        trace!("markmap: all tiles dirty");
    }

    pub fn swap_and_clear(&mut self) {
        mem::swap(&mut self.current, &mut self.previous);
        self.current = [0; MAX_MARKMAP_Y];
    }

    /// Columns of row `n` that need drawing this frame.
    #[inline]
    pub fn row(&self, n: usize) -> u16 {
        self.current[n] | self.previous[n]
    }

    #[inline]
    pub fn is_dirty(&self, m: usize, n: usize) -> bool {
        self.row(n) & (1 << m) != 0
    }

    pub fn dirty_count(&self) -> u32 {
        (0..MAX_MARKMAP_Y).map(|n| self.row(n).count_ones()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marked_tile_survives_one_extra_frame() {
        let mut map = Markmap::new();
        map.mark(3, 2);
        assert!(map.is_dirty(3, 2));
        map.swap_and_clear();
        assert!(map.is_dirty(3, 2));
        assert_eq!(map.current()[2], 0);
        map.swap_and_clear();
        assert!(!map.is_dirty(3, 2));
        assert_eq!(map.dirty_count(), 0);
    }

    #[test]
    fn rect_marks_all_touched_tiles() {
        let mut map = Markmap::new();
        map.mark_rect(30, 31, 33, 64);
        for n in 0..=2 {
            assert!(map.is_dirty(0, n));
            assert!(map.is_dirty(1, n));
        }
        assert_eq!(map.dirty_count(), 6);
    }

    #[test]
    fn rect_clips_to_map() {
        let mut map = Markmap::new();
        map.mark_rect(-10, -10, -1, 5);
        assert_eq!(map.dirty_count(), 0);
        map.mark_rect(-10, -10, 5, 5);
        assert!(map.is_dirty(0, 0));
        map.mark_rect(300, 200, 1000, 1000);
        assert!(map.is_dirty(MAX_MARKMAP_X - 1, MAX_MARKMAP_Y - 1));
        assert_eq!(map.dirty_count(), 1 + 1 * 2);
    }

    #[test]
    fn polyline_covers_diagonal_span() {
        let mut map = Markmap::new();
        map.mark_polyline([(5, 5), (10, 6), (100, 100)]);
        // (0,0) to (3,3) marks the full 4x4 block
        assert_eq!(map.dirty_count(), 16);
        for n in 0..4 {
            assert_eq!(map.current()[n], 0b1111);
        }
    }

    #[test]
    fn force_all_sets_every_tile() {
        let mut map = Markmap::new();
        map.force_all();
        assert_eq!(map.dirty_count() as usize, MAX_MARKMAP_X * MAX_MARKMAP_Y);
        map.swap_and_clear();
        map.swap_and_clear();
        assert_eq!(map.dirty_count(), 0);
    }
}
