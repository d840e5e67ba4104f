//! Read-only configuration snapshot handed to the renderer once per frame.

use crate::palette::Palette;
use crate::units::Unit;
use crate::waterfall::WaterfallMode;
use crate::{MARKERS_MAX, TRACES_MAX};

pub const SWEEP_POINTS_CHOICES: [usize; 5] = [51, 101, 201, 290, 450];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trace {
    pub enabled: bool,
    /// Row of the measurement array this trace displays.
    pub channel: usize,
}

/// Marker type flags. A marker can carry several at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerType(u8);

impl MarkerType {
    pub const NORMAL: MarkerType = MarkerType(0);
    pub const REFERENCE: MarkerType = MarkerType(1 << 0);
    pub const DELTA: MarkerType = MarkerType(1 << 1);
    pub const NOISE: MarkerType = MarkerType(1 << 2);
    pub const TRACKING: MarkerType = MarkerType(1 << 3);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: MarkerType) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn union(self, other: MarkerType) -> MarkerType {
        MarkerType(self.0 | other.0)
    }

    pub const fn is_reference(self) -> bool {
        self.contains(Self::REFERENCE)
    }

    pub const fn is_delta(self) -> bool {
        self.contains(Self::DELTA)
    }

    pub const fn is_noise(self) -> bool {
        self.contains(Self::NOISE)
    }

    pub const fn is_tracking(self) -> bool {
        self.contains(Self::TRACKING)
    }
}

impl core::ops::BitOr for MarkerType {
    type Output = MarkerType;

    fn bitor(self, rhs: MarkerType) -> MarkerType {
        self.union(rhs)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    pub enabled: bool,
    pub mtype: MarkerType,
    /// Sweep point the marker sits on.
    pub index: usize,
    pub frequency: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriggerMode {
    #[default]
    Auto,
    Normal,
    Single,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Measurement {
    #[default]
    None,
    Oip3,
    PassBand,
    Am,
    Fm,
    Thd,
}

/// How the sweep range was entered; selects the bottom readout format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrequencyMode {
    #[default]
    StartStop,
    CenterSpan,
}

/// Which sweep parameter the lever (jog wheel) currently edits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LeverMode {
    #[default]
    Marker,
    Center,
    Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sweep {
    pub points: usize,
    pub start: u64,
    pub stop: u64,
    pub actual_sweep_time_us: u32,
    pub mode: FrequencyMode,
}

impl Sweep {
    pub const fn span(&self) -> u64 {
        self.stop.saturating_sub(self.start)
    }

    pub const fn center(&self) -> u64 {
        self.start + self.span() / 2
    }

    /// Zero span: the x axis is time.
    pub const fn is_cw(&self) -> bool {
        self.start == self.stop
    }

    /// Frequency of sweep point `i`.
    pub fn frequency(&self, i: usize) -> u64 {
        if self.points < 2 {
            return self.start;
        }
        self.start + self.span() * i as u64 / (self.points as u64 - 1)
    }

    /// Nearest sweep point to `f`, clamped to the sweep.
    pub fn index_of(&self, f: u64) -> usize {
        let span = self.span();
        if span == 0 || f <= self.start || self.points < 2 {
            return 0;
        }
        let last = self.points as u64 - 1;
        let i = ((f - self.start) * last + span / 2) / span;
        i.min(last) as usize
    }
}

impl Default for Sweep {
    fn default() -> Self {
        Sweep {
            points: 290,
            start: 0,
            stop: 350_000_000,
            actual_sweep_time_us: 250_000,
            mode: FrequencyMode::StartStop,
        }
    }
}

/// Everything the renderer reads during one frame. Owned by the settings
/// store; the renderer only ever borrows it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    pub unit: Unit,
    /// Level at the top grid line, in display units.
    pub reflevel: f32,
    /// Display units per vertical division.
    pub scale: f32,
    pub trigger: TriggerMode,
    /// Trigger level, raw dBm.
    pub trigger_level: f32,
    pub waterfall: WaterfallMode,
    /// Minimum number of vertical grid lines; values below 3 fall back to 6.
    pub gridlines: u16,
    pub ham_bands: bool,
    pub measurement: Measurement,
    /// Resolution bandwidth in units of 100Hz.
    pub actual_rbw_x10: f32,
    /// Averaging is on; the waterfall then follows the averaged trace.
    pub average: bool,
    pub lever_mode: LeverMode,
    pub sweep: Sweep,
    pub traces: [Trace; TRACES_MAX],
    pub markers: [Marker; MARKERS_MAX],
    pub active_marker: Option<usize>,
    /// Battery voltage in millivolts, `None` while unknown.
    pub battery_mv: Option<u16>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub palette: Palette,
}

impl Default for Settings {
    fn default() -> Self {
        let mut markers = [Marker::default(); MARKERS_MAX];
        markers[0] = Marker {
            enabled: true,
            mtype: MarkerType::REFERENCE | MarkerType::TRACKING,
            index: 0,
            frequency: 0,
        };
        Settings {
            unit: Unit::Dbm,
            reflevel: -10.0,
            scale: 10.0,
            trigger: TriggerMode::Auto,
            trigger_level: -40.0,
            waterfall: WaterfallMode::Off,
            gridlines: 6,
            ham_bands: false,
            measurement: Measurement::None,
            actual_rbw_x10: 3000.0,
            average: false,
            lever_mode: LeverMode::Marker,
            sweep: Sweep::default(),
            traces: [
                Trace {
                    enabled: true,
                    channel: 0,
                },
                Trace {
                    enabled: false,
                    channel: 1,
                },
                Trace {
                    enabled: false,
                    channel: 2,
                },
            ],
            markers,
            active_marker: Some(0),
            battery_mv: None,
            palette: Palette::default(),
        }
    }
}

impl Settings {
    /// Index of the reference marker, the last enabled marker flagged as
    /// such, or marker 0.
    pub fn reference_marker(&self) -> usize {
        self.markers
            .iter()
            .rposition(|m| m.enabled && m.mtype.is_reference())
            .unwrap_or(0)
    }

    pub fn active_markers(&self) -> usize {
        self.markers.iter().filter(|m| m.enabled).count()
    }

    /// Index array followed by the waterfall and the trigger line.
    pub const fn waterfall_trace(&self) -> usize {
        if self.average {
            crate::TRACE_TEMP
        } else {
            crate::TRACE_ACTUAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_flags_combine() {
        let t = MarkerType::DELTA | MarkerType::NOISE;
        assert!(t.is_delta());
        assert!(t.is_noise());
        assert!(!t.is_reference());
        assert!(!t.is_tracking());
        assert!(!MarkerType::NORMAL.contains(MarkerType::NORMAL));
        assert_eq!(t.bits(), 0b0110);
    }

    #[test]
    fn sweep_index_and_frequency_agree() {
        let sweep = Sweep {
            points: 101,
            start: 100_000_000,
            stop: 200_000_000,
            ..Sweep::default()
        };
        assert_eq!(sweep.frequency(0), 100_000_000);
        assert_eq!(sweep.frequency(100), 200_000_000);
        assert_eq!(sweep.index_of(150_000_000), 50);
        assert_eq!(sweep.index_of(10), 0);
        assert_eq!(sweep.index_of(900_000_000), 100);
        for i in [0, 7, 33, 99] {
            assert_eq!(sweep.index_of(sweep.frequency(i)), i);
        }
    }

    #[test]
    fn reference_marker_falls_back_to_first() {
        let mut s = Settings::default();
        assert_eq!(s.reference_marker(), 0);
        s.markers[0].mtype = MarkerType::NORMAL;
        s.markers[2] = Marker {
            enabled: true,
            mtype: MarkerType::REFERENCE,
            index: 10,
            frequency: 1,
        };
        assert_eq!(s.reference_marker(), 2);
        assert_eq!(s.active_markers(), 2);
    }
}
