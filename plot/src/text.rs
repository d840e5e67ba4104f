//! Readout strings and their placement.

use core::fmt::{self, Write};

use embedded_graphics::{
    mono_font::{
        MonoFont, MonoTextStyle,
        iso_8859_1::{FONT_5X7, FONT_7X13},
    },
    pixelcolor::Rgb565,
    prelude::{DrawTarget, Point},
    text::{Baseline, Text},
    Drawable,
};
use heapless::{String, Vec};
use libm::{fabsf, powf, roundf, sqrtf};

use crate::settings::{FrequencyMode, LeverMode, Marker, Measurement, Settings};
use crate::units::{Unit, noise_normalized};
use crate::{CELLHEIGHT, CELLWIDTH, MARKERS_MAX, Measured, NGRIDY, TRACE_ACTUAL, TRACES_MAX, WIDTH};

pub type Line = String<48>;

/// Height of one overlay slot row.
pub const SLOT_HEIGHT: i32 = 16;
/// Readouts switch to the small font once this many markers show.
const SMALL_FONT_MARKERS: usize = 2;
const INF_TOKEN: &str = "-INF";
/// Level difference between the carrier and the sidebands at 100% AM.
const AM_FULL_DEPTH_DB: f32 = 6.02;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontSize {
    Small,
    Big,
}

impl FontSize {
    pub fn font(self) -> &'static MonoFont<'static> {
        match self {
            FontSize::Small => &FONT_5X7,
            FontSize::Big => &FONT_7X13,
        }
    }

    pub fn advance(self) -> i32 {
        let font = self.font();
        (font.character_size.width + font.character_spacing) as i32
    }

    pub fn height(self) -> i32 {
        self.font().character_size.height as i32
    }
}

/// Honour width and alignment but not precision, which the wrappers below
/// use for their own purpose.
fn pad(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let fill = f.width().unwrap_or(0).saturating_sub(s.chars().count());
    let (pre, post) = match f.align() {
        Some(fmt::Alignment::Left) => (0, fill),
        Some(fmt::Alignment::Center) => (fill / 2, fill - fill / 2),
        _ => (fill, 0),
    };
    let c = f.fill();
    for _ in 0..pre {
        f.write_char(c)?;
    }
    f.write_str(s)?;
    for _ in 0..post {
        f.write_char(c)?;
    }
    Ok(())
}

fn int_digits(a: f32) -> usize {
    if a >= 100.0 {
        3
    } else if a >= 10.0 {
        2
    } else {
        1
    }
}

/// Value with an SI prefix. The formatter precision is the number of
/// significant digits, default 3.
#[derive(Clone, Copy, Debug)]
pub struct Si(pub f32);

impl fmt::Display for Si {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREFIX: [&str; 9] = ["f", "p", "n", "\u{b5}", "m", "", "k", "M", "G"];
        let digits = f.precision().unwrap_or(3).max(1);
        let mut s: String<24> = String::new();
        let v = self.0;
        if !v.is_finite() {
            write!(s, "{v}")?;
        } else if v == 0.0 {
            write!(s, "{:.*}", digits - 1, 0.0f32)?;
        } else {
            let mut a = fabsf(v);
            let mut e = 5;
            while a >= 1000.0 && e < PREFIX.len() - 1 {
                a /= 1000.0;
                e += 1;
            }
            while a < 1.0 && e > 0 {
                a *= 1000.0;
                e -= 1;
            }
            // rounding may carry into another digit or the next prefix
            let scale = powf(10.0, digits.saturating_sub(int_digits(a)) as f32);
            a = roundf(a * scale) / scale;
            if a >= 1000.0 && e < PREFIX.len() - 1 {
                a /= 1000.0;
                e += 1;
            }
            let sign = if v < 0.0 { "-" } else { "" };
            write!(
                s,
                "{sign}{:.*}{}",
                digits.saturating_sub(int_digits(a)),
                a,
                PREFIX[e]
            )?;
        }
        pad(f, &s)
    }
}

/// Frequency in Hz with a prefix. The formatter precision is the number of
/// decimals kept, default 3.
#[derive(Clone, Copy, Debug)]
pub struct Freq(pub u64);

impl fmt::Display for Freq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hz = self.0;
        let (div, prefix) = if hz < 1_000 {
            (1u64, "")
        } else if hz < 1_000_000 {
            (1_000, "k")
        } else if hz < 1_000_000_000 {
            (1_000_000, "M")
        } else {
            (1_000_000_000, "G")
        };
        let max = div.ilog10();
        let decimals = (f.precision().unwrap_or(3) as u32).min(max);
        let mut s: String<24> = String::new();
        if decimals == 0 {
            write!(s, "{}{prefix}Hz", hz / div)?;
        } else {
            let frac = (hz % div) / 10u64.pow(max - decimals);
            write!(
                s,
                "{}.{:0width$}{prefix}Hz",
                hz / div,
                frac,
                width = decimals as usize
            )?;
        }
        pad(f, &s)
    }
}

/// Draw `text` with its top left corner at `(x, y)`, transparent
/// background.
pub fn draw_text<D>(target: &mut D, text: &str, x: i32, y: i32, size: FontSize, colour: Rgb565)
where
    D: DrawTarget<Color = Rgb565, Error = core::convert::Infallible>,
{
    let style = MonoTextStyle::new(size.font(), colour);
    let Ok(_) = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(target);
}

/// Sweep row shown by the readouts.
fn actual_row<'a>(settings: &Settings, measured: &'a Measured) -> &'a [f32] {
    let ch = settings.traces[TRACE_ACTUAL].channel.min(TRACES_MAX - 1);
    let points = settings.sweep.points.clamp(1, measured[ch].len());
    &measured[ch][..points]
}

fn sample(row: &[f32], i: usize) -> f32 {
    row[i.min(row.len() - 1)]
}

/// `>1RT 433.920MHz -45.3dBm`: marker number and type letters, then the
/// position and level, both relative to the reference marker for delta
/// markers.
pub fn marker_line(settings: &Settings, row: &[f32], i: usize) -> Line {
    let mut line = Line::new();
    let _ = marker_line_into(&mut line, settings, row, i);
    line
}

fn marker_line_into(out: &mut Line, settings: &Settings, row: &[f32], i: usize) -> fmt::Result {
    let marker = &settings.markers[i];
    let reference = &settings.markers[settings.reference_marker()];
    let mtype = marker.mtype;

    out.push(if settings.active_marker == Some(i) { '>' } else { ' ' })
        .map_err(|_| fmt::Error)?;
    write!(out, "{}", i + 1)?;
    for (set, letter) in [
        (mtype.is_reference(), 'R'),
        (mtype.is_tracking(), 'T'),
        (mtype.is_delta(), 'D'),
        (mtype.is_noise(), 'N'),
    ] {
        if set {
            out.push(letter).map_err(|_| fmt::Error)?;
        }
    }
    out.push(' ').map_err(|_| fmt::Error)?;

    let unit = settings.unit;
    let mut raw = sample(row, marker.index);
    if mtype.is_noise() {
        raw = noise_normalized(raw, settings.actual_rbw_x10);
    }
    // a delta against an empty reference sample is just as undefined
    let reference_empty = mtype.is_delta() && sample(row, reference.index) == f32::NEG_INFINITY;
    if raw == f32::NEG_INFINITY || reference_empty {
        return out.push_str(INF_TOKEN).map_err(|_| fmt::Error);
    }

    let sweep = &settings.sweep;
    let (offset, steps, rlevel, unit_symbol) = if mtype.is_delta() {
        let (sign, df) = if reference.index > marker.index {
            ('-', reference.frequency.saturating_sub(marker.frequency))
        } else {
            ('+', marker.frequency.saturating_sub(reference.frequency))
        };
        write!(out, "d{sign}")?;
        let rlevel = unit.to_display(sample(row, reference.index));
        (df, marker.index.abs_diff(reference.index), rlevel, unit.delta_symbol())
    } else {
        (marker.frequency, marker.index, 0.0, unit.symbol())
    };

    if sweep.is_cw() {
        let t = steps as f32 * sweep.actual_sweep_time_us as f32
            / (sweep.points.max(2) - 1) as f32;
        write!(out, "{:.3}s", Si(t / 1_000_000.0))?;
    } else {
        write!(out, "{:.3}", Freq(offset))?;
    }

    let v = unit.to_display(raw) - rlevel;
    if unit.is_linear() {
        write!(out, " {:.3}", Si(v))?;
    } else {
        write!(out, " {v:.1}")?;
    }
    out.push_str(unit_symbol).map_err(|_| fmt::Error)?;
    if mtype.is_noise() {
        out.push_str("/Hz").map_err(|_| fmt::Error)?;
    }
    Ok(())
}

pub fn pass_band_width(a: &Marker, b: &Marker) -> u64 {
    a.frequency.abs_diff(b.frequency)
}

/// Modulation depth in percent from a carrier and its two sidebands, all
/// raw dBm. `None` unless the sidebands are balanced within 5dB and sit
/// between 0 and 70dB below the carrier.
pub fn am_depth(carrier: f32, lower: f32, upper: f32) -> Option<i32> {
    let delta = lower - upper;
    if !(-5.0..=5.0).contains(&delta) {
        return None;
    }
    let level = (lower + upper) / 2.0 - carrier;
    if !(-70.0..=0.0).contains(&level) {
        return None;
    }
    Some(powf(10.0, 2.0 + (level + AM_FULL_DEPTH_DB) / 20.0) as i32)
}

/// Peak deviation from the outermost FM sidebands, corrected for the
/// resolution bandwidth. `None` when the markers are too close.
pub fn fm_deviation(lower: u64, upper: u64, rbw_x10: f32) -> Option<u64> {
    let floor = lower + (rbw_x10 * 100.0) as u64;
    (upper >= floor).then(|| (upper - floor) >> 1)
}

/// Output third order intercept on both sides, from the two tones and the
/// two intermodulation products, in display units.
pub fn oip3(left: f32, right: f32, im_left: f32, im_right: f32) -> (f32, f32) {
    (left + (right - im_left) / 2.0, right + (left - im_right) / 2.0)
}

/// Total harmonic distortion in percent. Each harmonic of the fundamental
/// at `f0` is taken as the strongest sample within `4 * n` points of where
/// it should be.
pub fn thd(settings: &Settings, row: &[f32], f0: u64, fundamental: usize) -> Option<f32> {
    let sweep = &settings.sweep;
    let p = Unit::Watt.to_display(sample(row, fundamental));
    if !(p > 0.0) || f0 == 0 {
        return None;
    }
    let last = sweep.frequency(row.len() - 1);
    let mut h = 0.0;
    let mut n = 2u64;
    while f0 * n < last {
        let centre = sweep.index_of(f0 * n);
        let reach = 4 * n as usize;
        let lo = centre.saturating_sub(reach);
        let hi = (centre + reach).min(row.len() - 1);
        let peak = row[lo..=hi].iter().copied().fold(f32::NEG_INFINITY, f32::max);
        h += Unit::Watt.to_display(peak);
        n += 1;
    }
    Some(100.0 * sqrtf(h / p))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Top left corner, plot area coordinates.
    pub x: i32,
    pub y: i32,
    pub colour: Rgb565,
    pub size: FontSize,
    pub text: Line,
}

/// Readouts on the top band, laid out in a two column grid of slots.
/// Built once per frame and drawn into every tile of the top row.
#[derive(Clone, Debug, Default)]
pub struct Overlay {
    entries: Vec<Entry, { MARKERS_MAX + 2 }>,
}

impl Overlay {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn push(&mut self, slot: usize, colour: Rgb565, size: FontSize, text: Line) {
        let entry = Entry {
            x: 1 + (slot as i32 % 2) * (WIDTH / 2),
            y: 1 + (slot as i32 / 2) * SLOT_HEIGHT,
            colour,
            size,
            text,
        };
        if self.entries.push(entry).is_err() {
            warn!("overlay full, dropped slot {}", slot);
        }
    }

    pub fn build(settings: &Settings, measured: &Measured) -> Self {
        let mut overlay = Overlay::default();
        let row = actual_row(settings, measured);
        let markers = &settings.markers;
        let palette = &settings.palette;
        let show_markers = settings.traces[TRACE_ACTUAL].enabled;

        let mut active = settings.active_markers();
        if settings.measurement == Measurement::Thd && active >= 1 {
            active = SMALL_FONT_MARKERS;
        }
        let size = if active >= SMALL_FONT_MARKERS {
            FontSize::Small
        } else {
            FontSize::Big
        };

        let mut j = 0;
        for i in 0..MARKERS_MAX {
            if i == 3 {
                let mut text = Line::new();
                match settings.measurement {
                    Measurement::PassBand => {
                        let _ = write!(text, "WIDTH: {:.3}", Freq(pass_band_width(&markers[1], &markers[2])));
                    }
                    Measurement::Am => {
                        let Some(depth) = am_depth(
                            sample(row, markers[0].index),
                            sample(row, markers[1].index),
                            sample(row, markers[2].index),
                        ) else {
                            break;
                        };
                        let _ = write!(text, "DEPTH: {depth:3}%");
                    }
                    Measurement::Fm => {
                        let Some(dev) = fm_deviation(
                            markers[1].frequency,
                            markers[2].frequency,
                            settings.actual_rbw_x10,
                        ) else {
                            break;
                        };
                        let _ = write!(text, "DEVIATION:{:.1}", Freq(dev));
                    }
                    Measurement::Thd
                        if markers[0].enabled && markers[0].index * 32 > row.len() =>
                    {
                        if let Some(v) = thd(settings, row, markers[0].frequency, markers[0].index) {
                            let _ = write!(text, "THD: {v:4.1}%");
                            overlay.push(j, palette.marker(markers[0].mtype), FontSize::Big, text);
                        }
                        break;
                    }
                    _ => {}
                }
                if !text.is_empty() {
                    j = 3;
                    overlay.push(j, palette.foreground, FontSize::Big, text);
                }
            } else if i >= 2
                && settings.measurement == Measurement::Oip3
                && markers[2].enabled
                && markers[3].enabled
            {
                let value = |k: usize| settings.unit.to_display(sample(row, markers[k].index));
                let (left, right) = oip3(value(0), value(1), value(2), value(3));
                for (slot, ip) in [(2, left), (3, right)] {
                    let mut text = Line::new();
                    let _ = if ip.is_finite() {
                        write!(text, "OIP3: {ip:4.1}dB")
                    } else {
                        write!(text, "OIP3: {INF_TOKEN}")
                    };
                    overlay.push(slot, palette.foreground, FontSize::Small, text);
                }
                break;
            }

            if !markers[i].enabled || !show_markers {
                continue;
            }
            let text = marker_line(settings, row, i);
            overlay.push(j, palette.marker(markers[i].mtype), size, text);
            j += 1;
        }
        overlay
    }

    /// Draw the entries that reach into the tile at `(x0, y0)`.
    pub fn draw<D>(&self, target: &mut D, x0: i32, y0: i32)
    where
        D: DrawTarget<Color = Rgb565, Error = core::convert::Infallible>,
    {
        for e in &self.entries {
            let (x, y) = (e.x - x0, e.y - y0);
            let w = e.text.chars().count() as i32 * e.size.advance();
            if y >= CELLHEIGHT || y + e.size.height() <= 0 || x >= CELLWIDTH || x + w <= 0 {
                continue;
            }
            draw_text(target, &e.text, x, y, e.size, e.colour);
        }
    }
}

/// Reference level ladder, one label per horizontal grid line.
pub fn draw_grid_ladder<D>(
    target: &mut D,
    x: i32,
    y0: i32,
    settings: &Settings,
    grid_y: i32,
    colour: Rgb565,
) where
    D: DrawTarget<Color = Rgb565, Error = core::convert::Infallible>,
{
    let size = FontSize::Small;
    let mut ypos = 2 - y0;
    let mut level = settings.reflevel;
    for _ in 0..NGRIDY {
        if ypos >= CELLHEIGHT {
            break;
        }
        if ypos >= -size.height() {
            let mut s: String<12> = String::new();
            let _ = write!(s, "{:>7.3}", Si(level));
            draw_text(target, &s, x, ypos, size, colour);
        }
        ypos += grid_y;
        level -= settings.scale;
    }
}

/// The two halves of the bottom status line: left aligned sweep
/// position and step, right aligned extent.
pub fn frequency_line(settings: &Settings, grid_step: u64) -> (Line, Line) {
    let sweep = &settings.sweep;
    let mut left = Line::new();
    let mut right = Line::new();
    let _ = if sweep.is_cw() {
        let t = sweep.actual_sweep_time_us as f32 / 1_000_000.0;
        write!(left, " CW {:.3}", Freq(sweep.start))
            .and_then(|_| write!(right, " TIME {:.3}s", Si(t)))
    } else {
        match sweep.mode {
            FrequencyMode::StartStop => {
                write!(left, " START {:.3}    {:.1}/", Freq(sweep.start), Freq(grid_step))
                    .and_then(|_| write!(right, " STOP {:.3}", Freq(sweep.stop)))
            }
            FrequencyMode::CenterSpan => write!(
                left,
                " CENTER {:.3}    {:.1}/",
                Freq(sweep.center()),
                Freq(grid_step)
            )
            .and_then(|_| write!(right, " SPAN {:.3}", Freq(sweep.span()))),
        }
    };
    match settings.lever_mode {
        LeverMode::Center => mark_lever(&mut left),
        LeverMode::Span => mark_lever(&mut right),
        LeverMode::Marker => {}
    }
    (left, right)
}

fn mark_lever(line: &mut Line) {
    if line.starts_with(' ') {
        let mut marked = Line::new();
        let _ = marked.push('>');
        let _ = marked.push_str(&line[1..]);
        *line = marked;
    }
}

pub fn battery_text(mv: u16) -> String<8> {
    let mut s = String::new();
    let _ = write!(s, "{:.2}v", mv as f32 / 1000.0);
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MarkerType, Sweep};
    use crate::{POINTS_COUNT, TRACE_STORED};
    use std::format;

    fn measured(level: f32) -> Measured {
        [[level; POINTS_COUNT]; TRACES_MAX]
    }

    #[test]
    fn si_prefixes() {
        assert_eq!(format!("{:.3}", Si(0.223_606_8)), "224m");
        assert_eq!(format!("{:.3}", Si(-10.0)), "-10.0");
        assert_eq!(format!("{:.3}", Si(1.5e-6)), "1.50\u{b5}");
        assert_eq!(format!("{:.3}", Si(2500.0)), "2.50k");
        assert_eq!(format!("{:.3}", Si(0.0)), "0.00");
        assert_eq!(format!("{:>7.3}", Si(-10.0)), "  -10.0");
    }

    #[test]
    fn si_rounding_carries_into_prefix() {
        assert_eq!(format!("{:.3}", Si(0.99996)), "1.00");
        assert_eq!(format!("{:.3}", Si(999.7)), "1.00k");
        assert_eq!(format!("{:.3}", Si(9.997)), "10.0");
        assert_eq!(format!("{:.3}", Si(-99.96)), "-100");
        assert_eq!(format!("{:.3}", Si(0.000_999_9)), "1.00m");
        assert_eq!(format!("{:.3}", Si(12.34)), "12.3");
    }

    #[test]
    fn frequency_prefixes() {
        assert_eq!(format!("{:.3}", Freq(433_920_000)), "433.920MHz");
        assert_eq!(format!("{:.1}", Freq(50_000_000)), "50.0MHz");
        assert_eq!(format!("{:.3}", Freq(1_500)), "1.500kHz");
        assert_eq!(format!("{:.3}", Freq(999)), "999Hz");
        assert_eq!(format!("{:.3}", Freq(2_400_000_000)), "2.400GHz");
        assert_eq!(format!("{}", Freq(0)), "0Hz");
    }

    #[test]
    fn plain_marker_readout() {
        let mut s = Settings::default();
        s.markers[0].index = 10;
        s.markers[0].frequency = 100_000_000;
        let m = measured(-45.3);
        let line = marker_line(&s, &m[0][..290], 0);
        assert_eq!(line.as_str(), ">1RT 100.000MHz -45.3dBm");
    }

    #[test]
    fn negative_infinity_prints_token() {
        let s = Settings::default();
        let m = measured(f32::NEG_INFINITY);
        assert_eq!(marker_line(&s, &m[0][..290], 0).as_str(), ">1RT -INF");
        let mut s = s;
        s.unit = Unit::Watt;
        assert_eq!(marker_line(&s, &m[0][..290], 0).as_str(), ">1RT -INF");
    }

    #[test]
    fn delta_against_empty_reference_prints_token() {
        let mut s = Settings::default();
        s.markers[1] = Marker {
            enabled: true,
            mtype: MarkerType::DELTA,
            index: 5,
            frequency: 99_000_000,
        };
        let mut row = [-60.0f32; 290];
        row[s.markers[0].index] = f32::NEG_INFINITY;
        assert_eq!(marker_line(&s, &row, 1).as_str(), " 2D -INF");
        s.unit = Unit::Watt;
        assert_eq!(marker_line(&s, &row, 1).as_str(), " 2D -INF");
        s.unit = Unit::Dbm;
        row[s.markers[0].index] = -20.0;
        assert_eq!(marker_line(&s, &row, 1).as_str(), " 2D d+99.000MHz -40.0dBc");
    }

    #[test]
    fn delta_and_noise_markers() {
        let mut s = Settings::default();
        s.markers[1] = Marker {
            enabled: true,
            mtype: MarkerType::DELTA,
            index: 5,
            frequency: 99_000_000,
        };
        s.markers[0].index = 20;
        s.markers[0].frequency = 100_000_000;
        let mut row = [-60.0f32; 290];
        row[20] = -20.0;
        let line = marker_line(&s, &row, 1);
        assert_eq!(line.as_str(), " 2D d-1.000MHz -40.0dBc");

        s.markers[2] = Marker {
            enabled: true,
            mtype: MarkerType::NOISE,
            index: 7,
            frequency: 5_000,
        };
        s.actual_rbw_x10 = 100.0;
        let line = marker_line(&s, &row, 2);
        // 10kHz rbw is 40dB
        assert_eq!(line.as_str(), " 3N 5.000kHz -100.0dBm/Hz");
    }

    #[test]
    fn zero_span_readout_is_time() {
        let mut s = Settings::default();
        s.sweep = Sweep {
            points: 101,
            start: 433_000_000,
            stop: 433_000_000,
            actual_sweep_time_us: 100_000,
            ..Sweep::default()
        };
        s.markers[0].index = 50;
        let row = [-30.0f32; 101];
        assert_eq!(marker_line(&s, &row, 0).as_str(), ">1RT 50.0ms -30.0dBm");
    }

    #[test]
    fn measurement_helpers() {
        // sidebands 6dB down is 100% modulation
        assert_eq!(am_depth(0.0, -6.02, -6.02), Some(100));
        assert_eq!(am_depth(0.0, -26.02, -26.02), Some(10));
        assert_eq!(am_depth(-20.0, -26.0, -40.0), None);
        assert_eq!(am_depth(-20.0, -10.0, -10.0), None);
        assert_eq!(fm_deviation(100_000_000, 100_030_000, 100.0), Some(10_000));
        assert_eq!(fm_deviation(100_000_000, 100_005_000, 100.0), None);
        assert_eq!(oip3(-10.0, -10.0, -50.0, -50.0), (10.0, 10.0));
    }

    #[test]
    fn thd_sums_harmonics() {
        let mut s = Settings::default();
        s.sweep = Sweep {
            points: 101,
            start: 0,
            stop: 100_000_000,
            ..Sweep::default()
        };
        let mut row = [-120.0f32; 101];
        // fundamental at 20MHz, second harmonic 20dB down
        row[20] = 0.0;
        row[40] = -20.0;
        let v = thd(&s, &row, 20_000_000, 20).unwrap();
        assert!((v - 10.0).abs() < 0.1, "{v}");
        row[20] = f32::NEG_INFINITY;
        assert_eq!(thd(&s, &row, 20_000_000, 20), None);
    }

    #[test]
    fn overlay_slots_and_fonts() {
        let mut s = Settings::default();
        let m = measured(-50.0);
        let single = Overlay::build(&s, &m);
        assert_eq!(single.entries().len(), 1);
        assert_eq!(single.entries()[0].size, FontSize::Big);
        assert_eq!((single.entries()[0].x, single.entries()[0].y), (1, 1));

        for i in 1..3 {
            s.markers[i].enabled = true;
        }
        let three = Overlay::build(&s, &m);
        let pos: std::vec::Vec<(i32, i32)> = three.entries().iter().map(|e| (e.x, e.y)).collect();
        assert_eq!(pos, [(1, 1), (1 + WIDTH / 2, 1), (1, 17)]);
        assert!(three.entries().iter().all(|e| e.size == FontSize::Small));

        s.traces[TRACE_ACTUAL].enabled = false;
        s.traces[TRACE_STORED].enabled = true;
        assert!(Overlay::build(&s, &m).entries().is_empty());
    }

    #[test]
    fn pass_band_goes_to_last_slot() {
        let mut s = Settings::default();
        s.measurement = Measurement::PassBand;
        s.markers[1] = Marker {
            enabled: true,
            mtype: MarkerType::NORMAL,
            index: 100,
            frequency: 101_000_000,
        };
        s.markers[2] = Marker {
            enabled: true,
            mtype: MarkerType::NORMAL,
            index: 120,
            frequency: 103_500_000,
        };
        let o = Overlay::build(&s, &measured(-50.0));
        let last = o.entries().last().unwrap();
        assert_eq!(last.text.as_str(), "WIDTH: 2.500MHz");
        assert_eq!((last.x, last.y), (1 + WIDTH / 2, 17));
    }

    #[test]
    fn oip3_replaces_third_and_fourth_marker() {
        let mut s = Settings::default();
        s.measurement = Measurement::Oip3;
        for i in 1..4 {
            s.markers[i].enabled = true;
            s.markers[i].index = i * 10;
        }
        let o = Overlay::build(&s, &measured(-50.0));
        let texts: std::vec::Vec<&str> = o.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts.len(), 4);
        assert_eq!(texts[2], "OIP3: -50.0dB");
        assert_eq!(texts[3], "OIP3: -50.0dB");

        let o = Overlay::build(&s, &measured(f32::NEG_INFINITY));
        let texts: std::vec::Vec<&str> = o.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts[2], "OIP3: -INF");
        assert_eq!(texts[3], "OIP3: -INF");
    }

    #[test]
    fn status_line_modes() {
        let mut s = Settings::default();
        s.sweep.start = 100_000_000;
        s.sweep.stop = 200_000_000;
        let (l, r) = frequency_line(&s, 10_000_000);
        assert_eq!(l.as_str(), " START 100.000MHz    10.0MHz/");
        assert_eq!(r.as_str(), " STOP 200.000MHz");

        s.sweep.mode = FrequencyMode::CenterSpan;
        s.lever_mode = LeverMode::Span;
        let (l, r) = frequency_line(&s, 10_000_000);
        assert_eq!(l.as_str(), " CENTER 150.000MHz    10.0MHz/");
        assert_eq!(r.as_str(), ">SPAN 100.000MHz");

        s.sweep.stop = s.sweep.start;
        s.sweep.actual_sweep_time_us = 25_000;
        s.lever_mode = LeverMode::Center;
        let (l, r) = frequency_line(&s, 1_000);
        assert_eq!(l.as_str(), ">CW 100.000MHz");
        assert_eq!(r.as_str(), " TIME 25.0ms");
        assert_eq!(battery_text(3712).as_str(), "3.71v");
    }
}
