//! Bitmaps blitted into tiles and status strips.

use crate::MARKERS_MAX;

pub const MARKER_WIDTH: i32 = 7;
pub const MARKER_HEIGHT: i32 = 10;
/// Glyph tip is this far right of its left edge.
pub const X_MARKER_OFFSET: i32 = 3;
/// Glyph tip is this far below its top edge.
pub const Y_MARKER_OFFSET: i32 = 10;

type MarkerBitmap = [u8; MARKER_HEIGHT as usize];

/// Backing plate, an arrow pointing down at the sample.
pub const MARKER_PLATE: MarkerBitmap = [
    0b11111110, 0b11111110, 0b11111110, 0b11111110, 0b11111110, 0b11111110, 0b11111110, 0b01111100,
    0b00111000, 0b00010000,
];

const MARKER_NUMERALS: [MarkerBitmap; MARKERS_MAX] = [
    [
        0b00000000, 0b00010000, 0b00110000, 0b00010000, 0b00010000, 0b00010000, 0b00111000,
        0b00000000, 0b00000000, 0b00000000,
    ],
    [
        0b00000000, 0b00111000, 0b01000100, 0b00000100, 0b00111000, 0b01000000, 0b01111100,
        0b00000000, 0b00000000, 0b00000000,
    ],
    [
        0b00000000, 0b00111000, 0b01000100, 0b00011000, 0b00000100, 0b01000100, 0b00111000,
        0b00000000, 0b00000000, 0b00000000,
    ],
    [
        0b00000000, 0b00001000, 0b00011000, 0b00101000, 0b01001000, 0b01001000, 0b01111100,
        0b00001000, 0b00000000, 0b00000000,
    ],
];

/// Numeral cut out of the plate for marker `i`.
pub fn marker_numeral(i: usize) -> &'static [u8] {
    &MARKER_NUMERALS[i % MARKERS_MAX]
}

pub const BATTERY_WIDTH: i32 = 8;
pub const BATTERY_HEIGHT: i32 = 18;
pub const BATTERY_TOP_LEVEL: u16 = 4100;
pub const BATTERY_BOTTOM_LEVEL: u16 = 3200;
pub const BATTERY_WARNING_LEVEL: u16 = 3300;

/// Battery outline with one bar per 100mV above the bottom level, every
/// fourth row a gap.
pub fn battery(mv: u16) -> [u8; BATTERY_HEIGHT as usize] {
    const EMPTY: u8 = 0b10000001;
    const FULL: u8 = 0b10111101;
    let mut rows = [EMPTY; BATTERY_HEIGHT as usize];
    rows[..4].copy_from_slice(&[0b00000000, 0b00111100, 0b00111100, 0b11111111]);
    let mut power = BATTERY_TOP_LEVEL;
    let mut x = 4;
    while power > BATTERY_BOTTOM_LEVEL {
        if x & 3 != 0 {
            rows[x] = if power > mv { EMPTY } else { FULL };
            power -= 100;
        }
        x += 1;
    }
    rows[x] = EMPTY;
    rows[x + 1] = 0b11111111;
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(rows: &[u8]) -> usize {
        rows.iter().filter(|&&r| r == 0b10111101).count()
    }

    #[test]
    fn battery_bars_follow_voltage() {
        assert_eq!(bars(&battery(4200)), 9);
        assert_eq!(bars(&battery(4100)), 9);
        assert_eq!(bars(&battery(3750)), 5);
        assert_eq!(bars(&battery(3300)), 1);
        assert_eq!(bars(&battery(3000)), 0);
        let b = battery(3000);
        assert_eq!(b[3], 0xff);
        assert_eq!(b[BATTERY_HEIGHT as usize - 1], 0xff);
    }

    #[test]
    fn numerals_sit_inside_plate() {
        for i in 0..MARKERS_MAX {
            for (n, p) in marker_numeral(i).iter().zip(MARKER_PLATE) {
                assert_eq!(n & !p, 0, "marker {i}");
            }
        }
    }
}
