//! Materialization window around the runner
//!
//! The track exists only from `trim_behind` behind the runner to `look_ahead` in
//! front of it. Everything that places content on the track must stay inside that
//! window, minus a safety margin, or it would sample a clamped pose off the tail.

use serde::{Deserialize, Serialize};

use super::curve::TrackCurve;

/// How far ahead to grow and how far behind to keep the curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtensionPolicy {
    pub look_ahead: f32,
    pub trim_behind: f32,
    pub safety_margin: f32,
    pub min_knots: usize,
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self {
            look_ahead: 240.0,
            trim_behind: 120.0,
            safety_margin: 5.0,
            min_knots: 10,
        }
    }
}

/// Extension and trim targets for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackWindow {
    /// Grow until the tail's global distance reaches this
    pub extend_up_to: f32,
    /// Local distance budget for head trimming (nothing to trim when <= 0)
    pub trim_before: f32,
    /// Knot count the trim must never go below
    pub min_knots: usize,
}

/// Spawn distances ahead of the runner, already clamped to the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRange {
    pub start: f32,
    pub up_to: f32,
}

impl ExtensionPolicy {
    /// Copy with negative distances clamped to zero
    pub fn normalized(&self) -> Self {
        Self {
            look_ahead: self.look_ahead.max(0.0),
            trim_behind: self.trim_behind.max(0.0),
            safety_margin: self.safety_margin.max(0.0),
            min_knots: self.min_knots.max(2),
        }
    }

    pub fn compute_window(&self, player_global: f32, removed_distance: f32) -> TrackWindow {
        let p = self.normalized();
        let player_local = player_global - removed_distance;
        TrackWindow {
            extend_up_to: player_global + p.look_ahead,
            trim_before: player_local - p.trim_behind,
            min_knots: p.min_knots,
        }
    }

    /// True while the curve's tail is short of the look-ahead target
    pub fn needs_extension(&self, player_global: f32, curve: &TrackCurve) -> bool {
        let window = self.compute_window(player_global, curve.removed_distance());
        curve.global_end() < window.extend_up_to
    }

    /// Furthest distance ahead of the runner that content may be placed
    pub fn max_spawn_ahead(&self) -> f32 {
        let p = self.normalized();
        (p.look_ahead - p.safety_margin).max(0.0)
    }

    /// Clamp a configured spawn range to what the track will actually hold
    pub fn spawn_range(&self, start: f32, up_to: f32) -> SpawnRange {
        let cap = self.max_spawn_ahead();
        let start = start.max(0.0).min(cap);
        let up_to = up_to.min(cap).max(start);
        SpawnRange { start, up_to }
    }

    /// Global ceiling for spawn requests against the curve as it is right now
    pub fn spawn_limit(&self, curve: &TrackCurve) -> f32 {
        curve.global_end() - self.normalized().safety_margin
    }
}
