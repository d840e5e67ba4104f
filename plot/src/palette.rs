use core::marker::PhantomData;

use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use libm::{powf, roundf};

use crate::TRACES_MAX;
use crate::settings::MarkerType;

/// 8 bit per channel colour, squeezed into rgb565.
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

#[inline]
pub fn raw(colour: Rgb565) -> u16 {
    colour.into_storage()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgb565,
    pub foreground: Rgb565,
    pub grid: Rgb565,
    /// Reference level ladder text.
    pub grid_value: Rgb565,
    pub trace: [Rgb565; TRACES_MAX],
    pub trigger: Rgb565,
    pub ham: Rgb565,
    pub marker_reference: Rgb565,
    pub marker_delta: Rgb565,
    pub marker_noise: Rgb565,
    pub marker_default: Rgb565,
    pub normal_battery: Rgb565,
    pub low_battery: Rgb565,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            background: rgb(0, 0, 0),
            foreground: rgb(255, 255, 255),
            grid: rgb(128, 128, 128),
            grid_value: rgb(196, 196, 196),
            trace: [rgb(255, 255, 0), rgb(0, 255, 0), rgb(255, 0, 0)],
            trigger: rgb(0, 0, 255),
            ham: rgb(80, 80, 80),
            marker_reference: rgb(255, 255, 255),
            marker_delta: rgb(0, 255, 0),
            marker_noise: rgb(0, 255, 255),
            marker_default: rgb(255, 255, 0),
            normal_battery: rgb(31, 227, 0),
            low_battery: rgb(255, 0, 0),
        }
    }
}

impl Palette {
    /// Reference beats delta beats noise.
    pub fn marker(&self, mtype: MarkerType) -> Rgb565 {
        if mtype.is_reference() {
            self.marker_reference
        } else if mtype.is_delta() {
            self.marker_delta
        } else if mtype.is_noise() {
            self.marker_noise
        } else {
            self.marker_default
        }
    }
}

/// Stops of the waterfall gradient, one every 32 entries.
const GRADIENT: [(u8, u8, u8); 8] = [
    (127, 0, 0),
    (255, 127, 0),
    (255, 255, 127),
    (255, 255, 255),
    (127, 255, 255),
    (0, 127, 255),
    (0, 0, 127),
    (0, 0, 0),
];

fn gradient(index: u8) -> (u8, u8, u8) {
    let seg = (index / 32) as usize;
    let t = (index % 32) as i32;
    let (r0, g0, b0) = GRADIENT[seg];
    let (r1, g1, b1) = GRADIENT[(seg + 1).min(GRADIENT.len() - 1)];
    let lerp = |a: u8, b: u8| (a as i32 + (b as i32 - a as i32) * t / 32) as u8;
    (lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Maps a waterfall level index to a panel colour.
pub trait Lut {
    fn lookup(&self, index: u8) -> Rgb565;
}

pub trait LutState {}
pub struct Uninit;
pub struct Init;
impl LutState for Uninit {}
impl LutState for Init {}

/// Waterfall gradient with per channel gamma, computed once.
pub struct GammaLut<S> {
    table: [u16; 1 << 8],
    _state: PhantomData<S>,
}

impl GammaLut<Uninit> {
    pub const fn new() -> Self {
        Self {
            table: [0; 1 << 8],
            _state: PhantomData,
        }
    }

    pub fn init(mut self, gamma: (f32, f32, f32)) -> GammaLut<Init> {
        fn correct(value: u8, gamma: f32) -> u8 {
            let max = u8::MAX as f32;
            let v = roundf(powf(value as f32 / max, gamma) * max);
            u8::try_from(v as u32).unwrap_or(u8::MAX)
        }

        let mut i = 0;
        while i < self.table.len() {
            let (r, g, b) = gradient(i as u8);
            self.table[i] = raw(rgb(
                correct(r, gamma.0),
                correct(g, gamma.1),
                correct(b, gamma.2),
            ));
            i += 1;
        }

        GammaLut {
            table: self.table,
            _state: PhantomData,
        }
    }
}

impl Default for GammaLut<Uninit> {
    fn default() -> Self {
        Self::new()
    }
}

impl Lut for GammaLut<Init> {
    fn lookup(&self, index: u8) -> Rgb565 {
        Rgb565::from(embedded_graphics::pixelcolor::raw::RawU16::new(
            self.table[index as usize],
        ))
    }
}

/// Uncorrected gradient, evaluated on every lookup.
pub struct Identity;

impl Lut for Identity {
    fn lookup(&self, index: u8) -> Rgb565 {
        let (r, g, b) = gradient(index);
        rgb(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::RgbColor;

    #[test]
    fn gradient_hits_stops() {
        for (i, stop) in GRADIENT.iter().enumerate() {
            assert_eq!(gradient((i * 32) as u8), *stop);
        }
        // past the last stop stays black
        assert_eq!(gradient(255), (0, 0, 0));
        assert_eq!(gradient(16), (191, 63, 0));
    }

    #[test]
    fn unit_gamma_matches_identity() {
        let lut = GammaLut::new().init((1.0, 1.0, 1.0));
        for i in 0..=255u8 {
            assert_eq!(lut.lookup(i), Identity.lookup(i), "index {i}");
        }
    }

    #[test]
    fn gamma_darkens_mid_tones() {
        let lut = GammaLut::new().init((2.2, 2.2, 2.2));
        // (255, 255, 127): full channels survive, blue drops
        let c = lut.lookup(64);
        assert_eq!(c.r(), Rgb565::MAX_R);
        assert_eq!(c.g(), Rgb565::MAX_G);
        assert!(c.b() < Identity.lookup(64).b());
        assert_eq!(lut.lookup(224), Rgb565::BLACK);
    }

    #[test]
    fn marker_colour_priority() {
        let p = Palette::default();
        let both = MarkerType::REFERENCE | MarkerType::DELTA;
        assert_eq!(p.marker(both), p.marker_reference);
        assert_eq!(p.marker(MarkerType::DELTA | MarkerType::NOISE), p.marker_delta);
        assert_eq!(p.marker(MarkerType::NOISE), p.marker_noise);
        assert_eq!(p.marker(MarkerType::TRACKING), p.marker_default);
    }
}
