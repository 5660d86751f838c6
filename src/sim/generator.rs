//! Infinite track generation
//!
//! `TrackGenerator` owns the `TrackCurve` and is the only thing that mutates it.
//! Each tick it grows the tail until the look-ahead budget is covered, then trims
//! the head behind the runner. Everything else reads the curve.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::curve::TrackCurve;
use super::frame::Frame;
use super::noise::{CurveNoise, heading_direction};
use super::window::ExtensionPolicy;
use crate::config::TrackConfig;

/// Upper bound on knots appended in one update
const MAX_APPEND_PER_UPDATE: usize = 4096;
/// Seeds are drawn from `[0, SEED_RANGE)`
const SEED_RANGE: f32 = 9999.0;

/// What one `update` did to the curve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackUpdate {
    pub appended: usize,
    pub trimmed: usize,
}

/// Grows and trims the shared track curve
#[derive(Debug, Clone)]
pub struct TrackGenerator {
    config: TrackConfig,
    policy: ExtensionPolicy,
    noise: CurveNoise,
    curve: TrackCurve,
    seed_a: f32,
    seed_b: f32,
    /// Cumulative distance fed to the noise for the next knot
    next_distance: f32,
    y_smoothed: f32,
}

impl TrackGenerator {
    /// Generator with seeds drawn from a run seed
    pub fn new(config: TrackConfig, seed: u64) -> Self {
        let (seed_a, seed_b) = draw_seeds(seed);
        Self::with_seeds(config, seed_a, seed_b)
    }

    /// Generator with explicit noise seeds
    pub fn with_seeds(config: TrackConfig, seed_a: f32, seed_b: f32) -> Self {
        let policy = config.policy().normalized();
        let mut generator = Self {
            config,
            policy,
            noise: CurveNoise::new(),
            curve: TrackCurve::new(),
            seed_a,
            seed_b,
            next_distance: 0.0,
            y_smoothed: 0.0,
        };
        generator.build_initial();
        generator
    }

    /// Throw the curve away and lay down the starting knots again
    pub fn build_initial(&mut self) {
        self.curve.clear();
        self.next_distance = 0.0;
        self.y_smoothed = 0.0;

        let step = self.step();
        let mut p = Vec3::ZERO;
        self.add_knot(p, self.next_distance);
        self.next_distance += step;

        for _ in 1..self.config.start_points.max(2) {
            p = self.next_point(p, self.next_distance);
            self.add_knot(p, self.next_distance);
            self.next_distance += step;
        }

        log::info!(
            "Track built: seeds=({:.2}, {:.2}) knots={} length={:.1}",
            self.seed_a,
            self.seed_b,
            self.curve.knot_count(),
            self.curve.length()
        );
    }

    /// Rebuild from the current seeds
    pub fn reset(&mut self) {
        self.build_initial();
    }

    /// Draw fresh seeds from `seed` and rebuild
    pub fn reseed(&mut self, seed: u64) {
        let (seed_a, seed_b) = draw_seeds(seed);
        self.seed_a = seed_a;
        self.seed_b = seed_b;
        self.build_initial();
    }

    /// Extend ahead of, then trim behind, the runner's global distance
    pub fn update(&mut self, player_global: f32) -> TrackUpdate {
        let appended = self.extend_ahead(player_global);
        let trimmed = self.trim_behind(player_global);
        TrackUpdate { appended, trimmed }
    }

    fn extend_ahead(&mut self, player_global: f32) -> usize {
        let target = self
            .policy
            .compute_window(player_global, self.curve.removed_distance())
            .extend_up_to;

        let mut appended = 0;
        while self.curve.global_end() < target && appended < MAX_APPEND_PER_UPDATE {
            let Some(from) = self.curve.last_knot().map(|k| k.position) else {
                break;
            };
            let next = self.next_point(from, self.next_distance);
            self.add_knot(next, self.next_distance);
            self.next_distance += self.step();
            appended += 1;
        }

        if appended == MAX_APPEND_PER_UPDATE {
            log::warn!("Track extension capped at {} knots this tick", MAX_APPEND_PER_UPDATE);
        }
        appended
    }

    fn trim_behind(&mut self, player_global: f32) -> usize {
        let window = self
            .policy
            .compute_window(player_global, self.curve.removed_distance());
        if window.trim_before <= 0.0 {
            return 0;
        }

        let trimmed = self.curve.trim_head(window.trim_before, window.min_knots);
        if trimmed > 0 {
            log::debug!(
                "Trimmed {} knots, removed distance now {:.1}",
                trimmed,
                self.curve.removed_distance()
            );
        }
        trimmed
    }

    /// Next knot position one step along the noise heading from `from`
    fn next_point(&mut self, from: Vec3, s: f32) -> Vec3 {
        let c = &self.config;
        let yaw = self.noise.next_heading(self.seed_a, s, c.turn_degrees, c.turn_scale);
        let h = self.noise.next_height(self.seed_b, s, c.height_amplitude, c.height_scale);

        let mut p = from + heading_direction(yaw) * self.step();
        let follow = c.height_follow.clamp(0.0, 1.0);
        self.y_smoothed += (h - self.y_smoothed) * follow;
        p.y = self.y_smoothed;
        p
    }

    fn add_knot(&mut self, position: Vec3, s: f32) {
        let c = &self.config;
        let yaw = self.noise.next_heading(self.seed_a, s, c.turn_degrees, c.turn_scale);
        let tangent = heading_direction(yaw) * (self.step() * c.tangent_scale);
        self.curve.append_parts(position, -tangent, tangent);
    }

    #[inline]
    fn step(&self) -> f32 {
        self.config.step.max(0.1)
    }

    #[inline]
    pub fn curve(&self) -> &TrackCurve {
        &self.curve
    }

    #[inline]
    pub fn removed_distance(&self) -> f32 {
        self.curve.removed_distance()
    }

    #[inline]
    pub fn policy(&self) -> &ExtensionPolicy {
        &self.policy
    }

    #[inline]
    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn seeds(&self) -> (f32, f32) {
        (self.seed_a, self.seed_b)
    }

    /// Frame at a global distance on the generated (open) track
    pub fn sample_frame_at(&self, global_distance: f32, last_up: &mut Vec3) -> Option<Frame> {
        self.curve.frame_at(global_distance, false, last_up)
    }
}

fn draw_seeds(seed: u64) -> (f32, f32) {
    let mut rng = Pcg32::seed_from_u64(seed);
    let a: f32 = rng.random_range(0.0..SEED_RANGE);
    let b: f32 = rng.random_range(0.0..SEED_RANGE);
    (a, b)
}
