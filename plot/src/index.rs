//! Screen coordinates of every sweep point of every trace.

use crate::settings::Trace;
use crate::units::YMapper;
use crate::{POINTS_COUNT, TRACES_MAX};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScreenPoint {
    pub x: i16,
    pub y: i16,
}

/// The x axis only depends on the point count, so it is shared by all
/// traces and recomputed when the count changes.
pub struct TraceIndex {
    x: [i16; POINTS_COUNT],
    y: [[i16; POINTS_COUNT]; TRACES_MAX],
    points: usize,
    width: i32,
    offset: i32,
}

impl Default for TraceIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceIndex {
    pub const fn new() -> Self {
        TraceIndex {
            x: [0; POINTS_COUNT],
            y: [[0; POINTS_COUNT]; TRACES_MAX],
            points: 0,
            width: 0,
            offset: 0,
        }
    }

    pub const fn points(&self) -> usize {
        self.points
    }

    /// Recompute the x memo if the point count or plot width changed.
    /// Returns true when it did.
    pub fn update_x(&mut self, points: usize, width: i32, offset: i32) -> bool {
        let points = points.clamp(2, POINTS_COUNT);
        if points == self.points && width == self.width && offset == self.offset {
            return false;
        }
        let sp = points as i32;
        for (i, x) in self.x[..points].iter_mut().enumerate() {
            *x = ((i as i32 * width + sp / 2) / (sp - 1) + offset) as i16;
        }
        self.points = points;
        self.width = width;
        self.offset = offset;
        debug!("index x axis: {} points over {} px", points, width);
        true
    }

    /// Map one row of raw samples into trace `t`'s y array.
    pub fn update_y(&mut self, t: usize, samples: &[f32], mapper: &YMapper) {
        let n = self.points.min(samples.len());
        for (y, v) in self.y[t][..n].iter_mut().zip(&samples[..n]) {
            *y = mapper.map(*v);
        }
    }

    #[inline]
    pub fn x(&self, i: usize) -> i16 {
        self.x[i]
    }

    #[inline]
    pub fn point(&self, t: usize, i: usize) -> ScreenPoint {
        ScreenPoint {
            x: self.x[i],
            y: self.y[t][i],
        }
    }

    pub fn ys(&self, t: usize) -> &[i16] {
        &self.y[t][..self.points]
    }

    pub fn xs(&self) -> &[i16] {
        &self.x[..self.points]
    }

    /// Range of point indices whose segments may touch the columns
    /// `x..x + w`. The range includes one point either side so the
    /// segments entering and leaving the span are drawn too.
    pub fn search_index_range_x(&self, x: i32, w: i32) -> Option<(usize, usize)> {
        let xs = self.xs();
        let last = xs.len().checked_sub(1)?;
        let x1 = x + w;
        if (xs[0] as i32) >= x1 || (xs[last] as i32) < x {
            return None;
        }
        // first point at or right of x
        let head = xs.partition_point(|&px| (px as i32) < x);
        // first point at or right of x + w
        let tail = xs.partition_point(|&px| (px as i32) < x1);
        let i0 = head.saturating_sub(1);
        let i1 = tail.min(last);
        Some((i0, i1))
    }

    /// Visit the enabled traces only; disabled ones keep whatever they had.
    pub fn enabled<'a>(traces: &'a [Trace]) -> impl Iterator<Item = (usize, &'a Trace)> + 'a {
        traces.iter().enumerate().filter(|(_, t)| t.enabled)
    }
}
