//! Noise-driven heading and height for track synthesis
//!
//! The track is grown one step at a time. Each step asks for a yaw and a height as a
//! pure function of `(seed, cumulative distance)`, so re-evaluating an earlier
//! distance (e.g. to rebuild a knot tangent) gives back exactly the same answer.

use glam::{Quat, Vec3};
use noise::{NoiseFn, Perlin};

/// Lattice seed shared by every track; per-run variety comes from the sample seeds
const LATTICE_SEED: u32 = 0;

/// 2D smooth noise sampled along the track
#[derive(Debug, Clone)]
pub struct CurveNoise {
    perlin: Perlin,
}

impl Default for CurveNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl CurveNoise {
    pub fn new() -> Self {
        Self {
            perlin: Perlin::new(LATTICE_SEED),
        }
    }

    /// Smooth noise at `(seed, x)` remapped to `[0, 1]`
    pub fn unit(&self, seed: f32, x: f32) -> f32 {
        let n = self.perlin.get([seed as f64, x as f64]) as f32;
        (n * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    /// Smooth noise at `(seed, x)` in `[-1, 1]`
    #[inline]
    pub fn signed(&self, seed: f32, x: f32) -> f32 {
        self.unit(seed, x) * 2.0 - 1.0
    }

    /// Yaw (degrees) of the track direction at cumulative distance `distance`
    pub fn next_heading(
        &self,
        seed_a: f32,
        distance: f32,
        turn_degrees: f32,
        turn_scale: f32,
    ) -> f32 {
        self.signed(seed_a, distance * turn_scale) * turn_degrees
    }

    /// Target height of the track at cumulative distance `distance`
    pub fn next_height(
        &self,
        seed_b: f32,
        distance: f32,
        amplitude: f32,
        height_scale: f32,
    ) -> f32 {
        self.signed(seed_b, distance * height_scale) * amplitude
    }
}

/// Horizontal unit direction for a yaw in degrees (0 = +Z, positive turns toward +X)
#[inline]
pub fn heading_direction(yaw_degrees: f32) -> Vec3 {
    (Quat::from_rotation_y(yaw_degrees.to_radians()) * Vec3::Z).normalize()
}
