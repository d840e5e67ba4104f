//! Conversion between the raw dBm samples delivered by the sweep and the
//! display units selectable on the instrument.

use libm::{expf, log10f, roundf};

use crate::NGRIDY;

const SQRT_50: f32 = 7.071_067_8;
/// `10^(-30/20) * sqrt(50)`
const POW_SQRT: f32 = 0.223_606_8;
/// `30 + 20 * log10(sqrt(50))`
const DBMV_SHIFT: f32 = 46.989_7;
/// `90 + 20 * log10(sqrt(50))`
const DBUV_SHIFT: f32 = 106.989_7;
const VOLT_EXP: f32 = core::f32::consts::LN_10 / 20.0;
const WATT_EXP: f32 = core::f32::consts::LN_10 / 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    #[default]
    Dbm,
    Dbmv,
    Dbuv,
    Volt,
    Watt,
}

impl Unit {
    pub const ALL: [Unit; 5] = [Unit::Dbm, Unit::Dbmv, Unit::Dbuv, Unit::Volt, Unit::Watt];

    pub const fn is_linear(self) -> bool {
        matches!(self, Unit::Volt | Unit::Watt)
    }

    /// Convert a raw level in dBm into this unit. `-inf` stays `-inf` for the
    /// logarithmic units and becomes `0.0` for the linear ones.
    pub fn to_display(self, v: f32) -> f32 {
        match self {
            Unit::Dbm => v,
            Unit::Dbmv => v + DBMV_SHIFT,
            Unit::Dbuv => v + DBUV_SHIFT,
            Unit::Volt => expf(v * VOLT_EXP) * POW_SQRT,
            Unit::Watt => expf(v * WATT_EXP) / 1000.0,
        }
    }

    /// Inverse of [`Unit::to_display`].
    pub fn to_dbm(self, v: f32) -> f32 {
        match self {
            Unit::Dbm => v,
            Unit::Dbmv => v - DBMV_SHIFT,
            Unit::Dbuv => v - DBUV_SHIFT,
            Unit::Volt => log10f(v / SQRT_50) * 20.0 + 30.0,
            Unit::Watt => log10f(v * 1000.0) * 10.0,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Unit::Dbm => "dBm",
            Unit::Dbmv => "dBmV",
            Unit::Dbuv => "dB\u{b5}V",
            Unit::Volt => "V",
            Unit::Watt => "W",
        }
    }

    /// Unit of a level difference against the reference marker.
    pub const fn delta_symbol(self) -> &'static str {
        match self {
            Unit::Dbm | Unit::Dbmv | Unit::Dbuv => "dBc",
            Unit::Volt => "Vc",
            Unit::Watt => "Wc",
        }
    }
}

/// Normalise a raw noise level to a 1Hz bandwidth. `rbw_x10` is the
/// resolution bandwidth in units of 100Hz.
pub fn noise_normalized(raw: f32, rbw_x10: f32) -> f32 {
    raw - 10.0 * log10f(rbw_x10 * 100.0)
}

/// Per-frame constants that map a raw dBm sample straight to a pixel row,
/// so the per-point loop never branches on the unit.
#[derive(Clone, Copy, Debug)]
pub struct YMapper {
    linear: bool,
    /// reference level with the unit offset folded in
    ref_shift: f32,
    inv_scale: f32,
    vmult: f32,
    lin_gain: f32,
    grid_y: f32,
}

impl YMapper {
    /// `reflevel` and `scale` are in display units, `scale` per division.
    pub fn new(unit: Unit, reflevel: f32, scale: f32, grid_y: i32) -> Self {
        let inv_scale = if scale > 0.0 { 1.0 / scale } else { 1.0 };
        let (linear, ref_shift, vmult, lin_gain) = match unit {
            Unit::Dbm => (false, reflevel, 0.0, 0.0),
            Unit::Dbmv => (false, reflevel - DBMV_SHIFT, 0.0, 0.0),
            Unit::Dbuv => (false, reflevel - DBUV_SHIFT, 0.0, 0.0),
            Unit::Volt => (true, reflevel, VOLT_EXP, POW_SQRT),
            Unit::Watt => (true, reflevel, WATT_EXP, 1.0 / 1000.0),
        };
        YMapper {
            linear,
            ref_shift,
            inv_scale,
            vmult,
            lin_gain,
            grid_y: grid_y as f32,
        }
    }

    /// Distance below the reference level in grid divisions, unclamped.
    #[inline]
    pub fn divisions(&self, raw: f32) -> f32 {
        let v = if self.linear {
            expf(raw * self.vmult) * self.lin_gain
        } else {
            raw
        };
        (self.ref_shift - v) * self.inv_scale
    }

    /// Pixel row inside the plot, clamped to `[0, NGRIDY * grid_y]`.
    #[inline]
    pub fn map(&self, raw: f32) -> i16 {
        let d = self.divisions(raw);
        let d = if d.is_nan() {
            NGRIDY as f32
        } else {
            d.clamp(0.0, NGRIDY as f32)
        };
        roundf(d * self.grid_y) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trip() {
        for unit in Unit::ALL {
            let mut v = -120.0f32;
            while v <= 20.0 {
                let back = unit.to_dbm(unit.to_display(v));
                assert!((back - v).abs() < 1e-4, "{unit:?} {v} -> {back}");
                v += 0.5;
            }
        }
    }

    #[test]
    fn known_conversions() {
        assert!((Unit::Dbmv.to_display(0.0) - 46.9897).abs() < 1e-3);
        assert!((Unit::Dbuv.to_display(-100.0) - 6.9897).abs() < 1e-3);
        // 0dBm into 50 ohm is 0.2236V rms and 1mW
        assert!((Unit::Volt.to_display(0.0) - 0.223_606_8).abs() < 1e-6);
        assert!((Unit::Watt.to_display(0.0) - 0.001).abs() < 1e-9);
        assert!((Unit::Watt.to_display(30.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn negative_infinity_is_not_nan() {
        for unit in [Unit::Dbm, Unit::Dbmv, Unit::Dbuv] {
            assert_eq!(unit.to_display(f32::NEG_INFINITY), f32::NEG_INFINITY);
        }
        for unit in [Unit::Volt, Unit::Watt] {
            let v = unit.to_display(f32::NEG_INFINITY);
            assert_eq!(v, 0.0);
            assert_eq!(unit.to_dbm(v), f32::NEG_INFINITY);
        }
    }

    #[test]
    fn noise_normalisation_uses_rbw_in_hz() {
        // 300kHz RBW is 3000 in units of 100Hz
        let v = noise_normalized(-80.0, 3000.0);
        assert!((v - (-80.0 - 54.771_21)).abs() < 1e-3);
    }

    #[test]
    fn mapper_places_level_on_grid() {
        let grid_y = 23;
        let m = YMapper::new(Unit::Dbm, 0.0, 10.0, grid_y);
        assert_eq!(m.map(-30.0), (3 * grid_y) as i16);
        assert_eq!(m.map(0.0), 0);
        assert_eq!(m.map(15.0), 0);
        assert_eq!(m.map(-200.0), (NGRIDY * grid_y) as i16);
        assert_eq!(m.map(f32::NEG_INFINITY), (NGRIDY * grid_y) as i16);
        assert_eq!(m.map(f32::NAN), (NGRIDY * grid_y) as i16);
    }

    #[test]
    fn mapper_matches_unit_conversion() {
        let grid_y = 18;
        for unit in Unit::ALL {
            let (reflevel, scale) = if unit.is_linear() {
                (unit.to_display(-10.0), unit.to_display(-10.0) / 10.0)
            } else {
                (unit.to_display(-10.0), 5.0)
            };
            let m = YMapper::new(unit, reflevel, scale, grid_y);
            for raw in [-60.0f32, -42.5, -25.0, -11.0] {
                let expect = ((reflevel - unit.to_display(raw)) / scale).clamp(0.0, 10.0);
                let expect = libm::roundf(expect * grid_y as f32) as i16;
                assert_eq!(m.map(raw), expect, "{unit:?} {raw}");
            }
        }
    }
}
