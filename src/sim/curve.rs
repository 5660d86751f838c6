//! Piecewise cubic Bezier track curve
//!
//! The curve is an ordered run of knots. Consecutive knots are joined by a cubic
//! segment built from their positions and tangents:
//! - `P0 = a.position`, `P1 = a.position + a.tangent_out`
//! - `P2 = b.position + b.tangent_in`, `P3 = b.position`
//!
//! Distances come in two flavours. A *local* distance is arc length from the
//! current head knot and is what `evaluate` takes. A *global* distance is arc length
//! from the very first knot ever appended; `removed_distance` is the arc length
//! trimmed off the head so far, so `local = global - removed_distance`.

use std::collections::VecDeque;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::frame::{Frame, compute_frame};
use crate::consts::{CURVE_EPSILON, TAIL_GUARD};
use crate::{repeat, slerp_direction};

/// Chord steps per segment in the arc-length table
pub const ARC_TABLE_STEPS: usize = 32;

/// A control point of the track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knot {
    pub position: Vec3,
    /// Offset from `position` toward the previous knot
    pub tangent_in: Vec3,
    /// Offset from `position` toward the next knot
    pub tangent_out: Vec3,
    /// Orientation hint, interpolated along segments into the sample's `up_hint`
    pub up: Vec3,
}

impl Knot {
    pub fn new(position: Vec3, tangent_in: Vec3, tangent_out: Vec3) -> Self {
        Self {
            position,
            tangent_in,
            tangent_out,
            up: Vec3::Y,
        }
    }

    /// Knot with mirrored tangents (`tangent_in = -tangent`)
    pub fn smooth(position: Vec3, tangent: Vec3) -> Self {
        Self::new(position, -tangent, tangent)
    }

    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }
}

/// Raw curve evaluation at one distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    pub position: Vec3,
    /// Derivative with respect to the segment parameter (not unit length)
    pub tangent: Vec3,
    pub up_hint: Vec3,
}

/// One cubic span plus its arc-length table
#[derive(Debug, Clone)]
struct Segment {
    p0: Vec3,
    p1: Vec3,
    p2: Vec3,
    p3: Vec3,
    up0: Vec3,
    up1: Vec3,
    /// Cumulative chord length at `t = i / ARC_TABLE_STEPS`
    table: [f32; ARC_TABLE_STEPS + 1],
}

impl Segment {
    fn between(a: &Knot, b: &Knot) -> Self {
        let mut seg = Self {
            p0: a.position,
            p1: a.position + a.tangent_out,
            p2: b.position + b.tangent_in,
            p3: b.position,
            up0: a.up,
            up1: b.up,
            table: [0.0; ARC_TABLE_STEPS + 1],
        };

        let mut prev = seg.p0;
        let mut acc = 0.0;
        for i in 1..=ARC_TABLE_STEPS {
            let p = seg.point(i as f32 / ARC_TABLE_STEPS as f32);
            acc += p.distance(prev);
            seg.table[i] = acc;
            prev = p;
        }
        seg
    }

    #[inline]
    fn length(&self) -> f32 {
        self.table[ARC_TABLE_STEPS]
    }

    fn point(&self, t: f32) -> Vec3 {
        let u = 1.0 - t;
        self.p0 * (u * u * u)
            + self.p1 * (3.0 * u * u * t)
            + self.p2 * (3.0 * u * t * t)
            + self.p3 * (t * t * t)
    }

    fn derivative(&self, t: f32) -> Vec3 {
        let u = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * u * u)
            + (self.p2 - self.p1) * (6.0 * u * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }

    fn up_at(&self, t: f32) -> Vec3 {
        slerp_direction(self.up0, self.up1, t)
    }

    /// Segment parameter for an arc length measured from the segment start
    fn param_at(&self, distance: f32) -> f32 {
        let d = distance.clamp(0.0, self.length());
        let idx = self
            .table
            .partition_point(|&v| v <= d)
            .saturating_sub(1)
            .min(ARC_TABLE_STEPS - 1);

        let lo = self.table[idx];
        let span = self.table[idx + 1] - lo;
        let frac = if span > 0.0 { ((d - lo) / span).clamp(0.0, 1.0) } else { 0.0 };
        (idx as f32 + frac) / ARC_TABLE_STEPS as f32
    }
}

/// Mutable, head-trimmable track curve
#[derive(Debug, Clone, Default)]
pub struct TrackCurve {
    knots: VecDeque<Knot>,
    /// `segments[i]` joins `knots[i]` and `knots[i + 1]`
    segments: VecDeque<Segment>,
    /// Last-to-first span, present only on closed curves
    closing: Option<Segment>,
    /// Local distance at which each span starts (open spans, then closing)
    offsets: Vec<f32>,
    length: f32,
    closed: bool,
    removed_distance: f32,
}

impl TrackCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an open or closed curve from a knot list
    pub fn from_knots(knots: impl IntoIterator<Item = Knot>, closed: bool) -> Self {
        let mut curve = Self::new();
        curve.closed = closed;
        for knot in knots {
            curve.append(knot);
        }
        curve
    }

    /// Drop every knot and start a fresh curve (removed distance back to zero)
    pub fn clear(&mut self) {
        self.knots.clear();
        self.segments.clear();
        self.closing = None;
        self.offsets.clear();
        self.length = 0.0;
        self.removed_distance = 0.0;
    }

    /// Add a knot at the tail
    pub fn append(&mut self, knot: Knot) {
        if let Some(last) = self.knots.back() {
            self.segments.push_back(Segment::between(last, &knot));
        }
        self.knots.push_back(knot);
        self.refresh();
    }

    pub fn append_parts(&mut self, position: Vec3, tangent_in: Vec3, tangent_out: Vec3) {
        self.append(Knot::new(position, tangent_in, tangent_out));
    }

    /// Remove head knots lying within `target_local_distance` of the head.
    ///
    /// Knots go one at a time while the whole first span fits in the remaining
    /// budget and at least `min_knot_count` knots (never fewer than two) stay.
    /// `removed_distance` grows by exactly the arc length that left the curve.
    /// Returns the number of knots removed.
    pub fn trim_head(&mut self, target_local_distance: f32, min_knot_count: usize) -> usize {
        if !self.is_ready() || !(target_local_distance > 0.0) {
            return 0;
        }

        let floor = min_knot_count.max(2);
        let before = self.length;
        let mut budget = target_local_distance;
        let mut popped_length = 0.0;
        let mut removed = 0;

        while self.knots.len() > floor {
            let Some(first) = self.segments.front() else {
                break;
            };
            let span = first.length();
            if span > budget {
                break;
            }
            budget -= span;
            popped_length += span;
            self.segments.pop_front();
            self.knots.pop_front();
            removed += 1;
        }

        if removed == 0 {
            return 0;
        }

        self.refresh();
        // The closing span changes shape when the head moves, so measure the delta
        let delta = if self.closed {
            (before - self.length).max(0.0)
        } else {
            popped_length
        };
        self.removed_distance += delta;
        removed
    }

    /// Total arc length of the retained knots
    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Arc length permanently trimmed from the head
    #[inline]
    pub fn removed_distance(&self) -> f32 {
        self.removed_distance
    }

    /// Global distance of the current tail
    #[inline]
    pub fn global_end(&self) -> f32 {
        self.removed_distance + self.length
    }

    /// False while the curve is too short to sample
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.length >= CURVE_EPSILON
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        if self.closed != closed {
            self.closed = closed;
            self.refresh();
        }
    }

    #[inline]
    pub fn knot_count(&self) -> usize {
        self.knots.len()
    }

    pub fn knots(&self) -> impl Iterator<Item = &Knot> {
        self.knots.iter()
    }

    pub fn last_knot(&self) -> Option<&Knot> {
        self.knots.back()
    }

    /// Arc length of every span in order (closing span last)
    pub fn segment_lengths(&self) -> impl Iterator<Item = f32> + '_ {
        self.segments.iter().chain(self.closing.iter()).map(Segment::length)
    }

    /// Normalized `0..1` curve parameter for a local distance
    pub fn normalized_param(&self, local_distance: f32, looping: bool) -> f32 {
        if !self.is_ready() {
            return 0.0;
        }
        self.resolve_distance(local_distance, looping) / self.length
    }

    /// Position, tangent and up hint at a local distance.
    ///
    /// Returns `None` while the curve is not ready.
    pub fn evaluate(&self, local_distance: f32, looping: bool) -> Option<CurveSample> {
        if !self.is_ready() {
            return None;
        }

        let d = self.resolve_distance(local_distance, looping);
        let idx = self
            .offsets
            .partition_point(|&o| o <= d)
            .saturating_sub(1);
        let seg = self.span(idx)?;
        let t = seg.param_at(d - self.offsets[idx]);

        Some(CurveSample {
            position: seg.point(t),
            tangent: seg.derivative(t),
            up_hint: seg.up_at(t),
        })
    }

    /// Convert a global distance to a local one valid for `evaluate`
    pub fn to_local(&self, global_distance: f32, looping: bool) -> f32 {
        if looping && self.closed {
            global_distance
        } else {
            (global_distance - self.removed_distance).max(0.0)
        }
    }

    /// Oriented frame at a global distance, carrying `last_up` for this stream
    pub fn frame_at(
        &self,
        global_distance: f32,
        looping: bool,
        last_up: &mut Vec3,
    ) -> Option<Frame> {
        compute_frame(self, self.to_local(global_distance, looping), looping, last_up)
    }

    fn resolve_distance(&self, local_distance: f32, looping: bool) -> f32 {
        let d = if local_distance.is_finite() { local_distance } else { 0.0 };
        if looping && self.closed {
            repeat(d, self.length)
        } else {
            d.clamp(0.0, (self.length - TAIL_GUARD).max(0.0))
        }
    }

    fn span(&self, idx: usize) -> Option<&Segment> {
        if idx < self.segments.len() {
            self.segments.get(idx)
        } else {
            self.closing.as_ref()
        }
    }

    /// Rebuild the closing span and the offset index after a mutation
    fn refresh(&mut self) {
        self.closing = match (self.closed, self.knots.back(), self.knots.front()) {
            (true, Some(last), Some(first)) if self.knots.len() >= 2 => {
                Some(Segment::between(last, first))
            }
            _ => None,
        };

        self.offsets.clear();
        let mut acc = 0.0;
        for seg in self.segments.iter().chain(self.closing.iter()) {
            self.offsets.push(acc);
            acc += seg.length();
        }
        self.length = acc;
    }
}
