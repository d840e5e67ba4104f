//! Rectangular grid: vertical line spacing from the sweep span, horizontal
//! lines every `grid_y` rows, plus amateur band shading.

use crate::WIDTH;

/// Amateur bands, sorted by start frequency.
pub const HAM_BANDS: [(u64, u64); 15] = [
    (135_700, 137_800),
    (472_000, 479_000),
    (1_800_000, 2_000_000),
    (3_500_000, 3_800_000),
    (5_250_000, 5_450_000),
    (7_000_000, 7_200_000),
    (10_100_000, 10_150_000),
    (14_000_000, 14_350_000),
    (18_068_000, 18_168_000),
    (21_000_000, 21_450_000),
    (24_890_000, 24_990_000),
    (28_000_000, 29_700_000),
    (50_000_000, 52_000_000),
    (70_000_000, 70_500_000),
    (144_000_000, 146_000_000),
];

const DEFAULT_GRIDLINES: u16 = 6;
const MIN_SPAN: u64 = 1000;

/// Largest step from the 1-2-5 series that still gives at least
/// `gridlines` divisions over `span`. Never below 1000.
pub fn select_step(span: u64, gridlines: u16) -> u64 {
    let gridlines = if gridlines < 3 {
        DEFAULT_GRIDLINES
    } else {
        gridlines
    } as u64;
    let mut gdigit: u64 = 1_000_000_000;
    let mut step = gdigit;
    while gdigit > 100 {
        for mult in [5, 2, 1] {
            step = mult * gdigit;
            if span / step >= gridlines {
                return step;
            }
        }
        gdigit /= 10;
    }
    step
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GridSpacing {
    /// Distance between vertical lines in Hz, or µs in zero span.
    pub step: u64,
    /// Phase of the first line in pixels.
    pub offset: i32,
    /// Distance between vertical lines in tenths of a pixel.
    pub width: i32,
}

impl Default for GridSpacing {
    fn default() -> Self {
        GridSpacing::new(0, 0, 0, DEFAULT_GRIDLINES)
    }
}

impl GridSpacing {
    /// A zero `span` switches the axis to time, `sweep_time_us` wide.
    pub fn new(start: u64, span: u64, sweep_time_us: u32, gridlines: u16) -> Self {
        let (start, span) = if span == 0 {
            (0, sweep_time_us as u64)
        } else {
            (start, span)
        };
        let span = span.max(MIN_SPAN);
        let step = select_step(span, gridlines);
        let w = WIDTH as u64;
        let offset = w * ((start % step) / 100) / (span / 100);
        let width = w * (step / 100) / (span / 1000);
        GridSpacing {
            step,
            offset: offset as i32,
            width: (width as i32).max(1),
        }
    }

    /// Column `x` of the plot area carries a vertical grid line.
    #[inline]
    pub fn is_vertical(&self, x: i32) -> bool {
        if x < 0 {
            return false;
        }
        if x == 0 || x == WIDTH {
            return true;
        }
        ((x + self.offset) * 10) % self.width < 10
    }
}

/// Row `y` of the plot area carries a horizontal grid line.
#[inline]
pub fn is_horizontal(y: i32, grid_y: i32) -> bool {
    y >= 0 && grid_y > 0 && y % grid_y == 0
}

pub fn in_ham_band(f: u64) -> bool {
    HAM_BANDS
        .binary_search_by(|&(start, stop)| {
            if stop < f {
                core::cmp::Ordering::Less
            } else if start > f {
                core::cmp::Ordering::Greater
            } else {
                core::cmp::Ordering::Equal
            }
        })
        .is_ok()
}

/// Frequency under plot column `x`.
#[inline]
pub fn column_frequency(start: u64, span: u64, x: i32) -> u64 {
    start + span * x.clamp(0, WIDTH) as u64 / WIDTH as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_one_two_five_steps() {
        assert_eq!(select_step(350_000_000, 6), 50_000_000);
        assert_eq!(select_step(100_000_000, 6), 10_000_000);
        assert_eq!(select_step(12_000_000, 6), 2_000_000);
        assert_eq!(select_step(30_000, 6), 5_000);
        // too few gridlines requested falls back to 6
        assert_eq!(select_step(100_000_000, 1), 10_000_000);
        assert_eq!(select_step(100_000_000, 3), 20_000_000);
        // tiny spans bottom out
        assert_eq!(select_step(1500, 6), 1000);
    }

    #[test]
    fn step_grows_with_span() {
        for gridlines in [3, 6, 10] {
            let mut last = 0;
            let mut span = 1000u64;
            while span < 10_000_000_000 {
                let step = select_step(span, gridlines);
                assert!(step >= last, "span {span} step {step} < {last}");
                last = step;
                span = span * 11 / 10 + 7;
            }
        }
    }

    #[test]
    fn ten_divisions_over_hundred_megahertz() {
        let g = GridSpacing::new(100_000_000, 100_000_000, 0, 6);
        assert_eq!(g.step, 10_000_000);
        assert_eq!(g.offset, 0);
        assert_eq!(g.width, 289);
        let lines = (0..=WIDTH).filter(|&x| g.is_vertical(x)).count();
        // 11 lines including both edges
        assert_eq!(lines, 11);
        assert!(g.is_vertical(0));
        assert!(g.is_vertical(WIDTH));
        assert!(!g.is_vertical(-1));
    }

    #[test]
    fn zero_span_uses_sweep_time() {
        let g = GridSpacing::new(433_000_000, 0, 100_000, 6);
        assert_eq!(g.step, 10_000);
        assert_eq!(g.offset, 0);
        // no sweep time either: no division by zero
        let g = GridSpacing::new(433_000_000, 0, 0, 6);
        assert!(g.width >= 1);
    }

    #[test]
    fn horizontal_lines_follow_pitch() {
        assert!(is_horizontal(0, 23));
        assert!(is_horizontal(46, 23));
        assert!(!is_horizontal(47, 23));
        assert!(!is_horizontal(-23, 23));
    }

    #[test]
    fn ham_band_lookup() {
        assert!(in_ham_band(7_100_000));
        assert!(in_ham_band(135_700));
        assert!(in_ham_band(146_000_000));
        assert!(!in_ham_band(146_000_001));
        assert!(!in_ham_band(6_000_000));
        assert!(!in_ham_band(0));
        assert_eq!(column_frequency(0, 289_000, 100), 100_000);
    }
}
