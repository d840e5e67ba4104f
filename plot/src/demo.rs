//! Synthetic sweeps for the simulator and the firmware demo: a noisy
//! floor with a few carriers drifting across the span.

use libm::{fabsf, log10f};

use crate::settings::Settings;
use crate::{Measured, TRACE_ACTUAL, TRACE_TEMP};

/// Source of random words. The firmware backs this with the TRNG.
pub trait RngU32 {
    fn next_u32(&mut self) -> u32;

    /// Uniform in `[0, 1)`.
    fn unit_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// Small xorshift generator for hosts without a hardware source.
#[derive(Clone, Debug)]
pub struct XorShift32(u32);

impl XorShift32 {
    pub const fn new(seed: u32) -> Self {
        XorShift32(if seed == 0 { 0x9e37_79b9 } else { seed })
    }
}

impl RngU32 for XorShift32 {
    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}

#[derive(Clone, Copy, Debug)]
struct Carrier {
    /// Position as a fraction of the span.
    pos: f32,
    /// Movement per sweep, fraction of the span.
    drift: f32,
    level: f32,
}

const CARRIERS: [Carrier; 3] = [
    Carrier {
        pos: 0.25,
        drift: 0.003,
        level: -25.0,
    },
    Carrier {
        pos: 0.6,
        drift: -0.0015,
        level: -48.0,
    },
    Carrier {
        pos: 0.8,
        drift: 0.0007,
        level: -70.0,
    },
];

pub struct DemoSweep<R> {
    rng: R,
    carriers: [Carrier; CARRIERS.len()],
    floor: f32,
    sweeps: u32,
}

impl<R: RngU32> DemoSweep<R> {
    pub fn new(rng: R) -> Self {
        DemoSweep {
            rng,
            carriers: CARRIERS,
            floor: -95.0,
            sweeps: 0,
        }
    }

    pub fn sweeps(&self) -> u32 {
        self.sweeps
    }

    /// Log-distributed noise around the floor, roughly what a detector
    /// shows on a quiet input.
    fn noise(&mut self) -> f32 {
        let u = self.rng.unit_f32().max(1e-6);
        self.floor + 5.0 * log10f(u) + 3.0
    }

    /// Produce the next sweep into the actual trace channel. With
    /// averaging on, the temp channel keeps a running mean.
    pub fn fill(&mut self, settings: &Settings, measured: &mut Measured) {
        let points = settings.sweep.points.clamp(2, measured[0].len());
        let scale = (points - 1) as f32;
        let ch = settings.traces[TRACE_ACTUAL].channel.min(measured.len() - 1);
        for i in 0..points {
            let at = i as f32 / scale;
            let mut level = self.noise();
            for c in &self.carriers {
                // carriers are about three points wide
                let d = fabsf(at - c.pos) * scale / 3.0;
                level = level.max(c.level - 10.0 * d * d);
            }
            measured[ch][i] = level;
        }
        if settings.average {
            let temp = settings.traces[TRACE_TEMP].channel.min(measured.len() - 1);
            if temp != ch {
                let k = if self.sweeps == 0 { 1.0 } else { 0.25 };
                for i in 0..points {
                    let v = measured[ch][i];
                    measured[temp][i] += (v - measured[temp][i]) * k;
                }
            }
        }
        for c in self.carriers.iter_mut() {
            c.pos += c.drift;
            if !(0.0..=1.0).contains(&c.pos) {
                c.drift = -c.drift;
                c.pos = c.pos.clamp(0.0, 1.0);
            }
        }
        self.sweeps = self.sweeps.wrapping_add(1);
    }
}

/// Move every tracking marker onto the highest sample of the actual
/// trace. Returns the markers that moved as a bitmask.
pub fn track_markers(settings: &mut Settings, measured: &Measured) -> u8 {
    let points = settings.sweep.points.clamp(1, measured[0].len());
    let ch = settings.traces[TRACE_ACTUAL].channel.min(measured.len() - 1);
    let row = &measured[ch][..points];
    let Some(peak) = (0..points).reduce(|a, b| if row[b] > row[a] { b } else { a }) else {
        return 0;
    };
    let frequency = settings.sweep.frequency(peak);
    let mut moved = 0;
    for (i, m) in settings.markers.iter_mut().enumerate() {
        if m.enabled && m.mtype.is_tracking() && m.index != peak {
            m.index = peak;
            m.frequency = frequency;
            moved |= 1 << i;
        }
    }
    moved
}
