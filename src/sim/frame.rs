//! Orthonormal frames along the track
//!
//! A raw curve sample gives a position, a tangent and an up hint. The hint alone is
//! unreliable: it can collapse onto the tangent, and the tangent itself can vanish
//! at cusps. Each sampling stream (one runner, one spawned item) carries the up
//! vector of its previous frame and leans on it whenever the hint degenerates.

use glam::{Quat, Vec3};

use super::curve::{CurveSample, TrackCurve};
use crate::consts::FRAME_EPSILON;
use crate::look_rotation;

/// Position plus a right-handed `(right, up, forward)` basis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub right: Vec3,
}

impl Frame {
    /// Rotation taking local +Z to `forward` and +Y to `up`
    pub fn rotation(&self) -> Quat {
        look_rotation(self.forward, self.up)
    }

    /// Point displaced sideways along `right` and vertically along `up`
    #[inline]
    pub fn offset(&self, lateral: f32, vertical: f32) -> Vec3 {
        self.position + self.right * lateral + self.up * vertical
    }
}

/// Sample the curve at a local distance and build a stable frame.
///
/// `last_up` is read as the fallback anchor and overwritten with the new `up`.
/// Returns `None` (and leaves `last_up` alone) while the curve is not ready.
pub fn compute_frame(
    curve: &TrackCurve,
    local_distance: f32,
    looping: bool,
    last_up: &mut Vec3,
) -> Option<Frame> {
    let sample = curve.evaluate(local_distance, looping)?;
    Some(frame_from_sample(&sample, last_up))
}

/// Build a frame from an already evaluated sample
pub fn frame_from_sample(sample: &CurveSample, last_up: &mut Vec3) -> Frame {
    let forward = if sample.tangent.length_squared() < FRAME_EPSILON {
        Vec3::Z
    } else {
        sample.tangent.normalize()
    };

    let hinted = sample.up_hint.reject_from_normalized(forward);
    let mut base_up = if hinted.length_squared() > FRAME_EPSILON {
        hinted.normalize()
    } else {
        let fallback = if last_up.length_squared() < FRAME_EPSILON {
            Vec3::Y
        } else {
            *last_up
        };
        let projected = fallback.reject_from_normalized(forward);
        if projected.length_squared() > FRAME_EPSILON {
            projected.normalize()
        } else {
            Vec3::Y
        }
    };

    let mut right = base_up.cross(forward);
    if right.length_squared() < FRAME_EPSILON {
        base_up = Vec3::Y;
        right = base_up.cross(forward);
    }
    // Track running straight up or down: any sideways axis will do
    let right = if right.length_squared() < FRAME_EPSILON {
        forward.any_orthonormal_vector()
    } else {
        right.normalize()
    };
    let up = forward.cross(right).normalize();

    *last_up = up;

    Frame {
        position: sample.position,
        forward,
        up,
        right,
    }
}

/// One sampling stream and its carried up vector
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    last_up: Vec3,
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self { last_up: Vec3::Y }
    }
}

impl FrameSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame at a global distance on `curve`
    pub fn sample(
        &mut self,
        curve: &TrackCurve,
        global_distance: f32,
        looping: bool,
    ) -> Option<Frame> {
        curve.frame_at(global_distance, looping, &mut self.last_up)
    }

    #[inline]
    pub fn last_up(&self) -> Vec3 {
        self.last_up
    }

    pub fn reset(&mut self) {
        self.last_up = Vec3::Y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle_between_deg;
    use crate::sim::curve::Knot;

    fn assert_orthonormal(f: &Frame) {
        assert!((f.forward.length() - 1.0).abs() < 1e-4);
        assert!((f.up.length() - 1.0).abs() < 1e-4);
        assert!((f.right.length() - 1.0).abs() < 1e-4);
        assert!(f.forward.dot(f.up).abs() < 1e-4);
        assert!(f.forward.dot(f.right).abs() < 1e-4);
        assert!(f.up.dot(f.right).abs() < 1e-4);
        // Right-handed: up = forward x right
        assert!((f.forward.cross(f.right) - f.up).length() < 1e-4);
    }

    #[test]
    fn test_flat_track_frame() {
        let sample = CurveSample {
            position: Vec3::new(1.0, 2.0, 3.0),
            tangent: Vec3::Z * 20.0,
            up_hint: Vec3::Y,
        };
        let mut last_up = Vec3::Y;
        let f = frame_from_sample(&sample, &mut last_up);
        assert_orthonormal(&f);
        assert!((f.forward - Vec3::Z).length() < 1e-5);
        assert!((f.up - Vec3::Y).length() < 1e-5);
        assert!((f.right - Vec3::X).length() < 1e-5);
        assert_eq!(last_up, f.up);
    }

    #[test]
    fn test_zero_tangent_falls_back_to_forward_axis() {
        let sample = CurveSample {
            position: Vec3::ZERO,
            tangent: Vec3::ZERO,
            up_hint: Vec3::Y,
        };
        let mut last_up = Vec3::Y;
        let f = frame_from_sample(&sample, &mut last_up);
        assert_orthonormal(&f);
        assert_eq!(f.forward, Vec3::Z);
    }

    #[test]
    fn test_collinear_hint_uses_last_up() {
        // Hint points along the tangent: fall back to the carried up
        let tilted = Vec3::new(0.3, 1.0, 0.0).normalize();
        let sample = CurveSample {
            position: Vec3::ZERO,
            tangent: Vec3::Z,
            up_hint: Vec3::Z,
        };
        let mut last_up = tilted;
        let f = frame_from_sample(&sample, &mut last_up);
        assert_orthonormal(&f);
        assert!((f.up - tilted).length() < 1e-4);
    }

    #[test]
    fn test_vertical_tangent_with_vertical_fallback() {
        let sample = CurveSample {
            position: Vec3::ZERO,
            tangent: Vec3::Y * 5.0,
            up_hint: Vec3::Y,
        };
        let mut last_up = Vec3::ZERO;
        let f = frame_from_sample(&sample, &mut last_up);
        assert_orthonormal(&f);
        assert!((f.forward - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_no_flip_across_degenerate_hint() {
        // Middle knot's up hint lies along the track, the neighbours are tilted
        let roll = Vec3::new(0.4, 1.0, 0.0).normalize();
        let curve = TrackCurve::from_knots(
            [
                Knot::smooth(Vec3::ZERO, Vec3::Z * 3.0).with_up(roll),
                Knot::smooth(Vec3::Z * 10.0, Vec3::Z * 3.0).with_up(Vec3::Z),
                Knot::smooth(Vec3::Z * 20.0, Vec3::Z * 3.0).with_up(roll),
            ],
            false,
        );

        let mut sampler = FrameSampler::new();
        let mut prev = sampler.sample(&curve, 0.0, false).unwrap();
        let mut d = 0.0;
        while d < 19.5 {
            d += 0.25;
            let f = sampler.sample(&curve, d, false).unwrap();
            assert_orthonormal(&f);
            assert!(
                angle_between_deg(prev.up, f.up) < 30.0,
                "up flipped at d={}: {:?} -> {:?}",
                d,
                prev.up,
                f.up
            );
            prev = f;
        }
    }

    #[test]
    fn test_not_ready_leaves_last_up() {
        let curve = TrackCurve::new();
        let mut last_up = Vec3::X;
        assert!(compute_frame(&curve, 0.0, false, &mut last_up).is_none());
        assert_eq!(last_up, Vec3::X);
    }

    #[test]
    fn test_frame_offset_and_rotation() {
        let f = Frame {
            position: Vec3::ZERO,
            forward: Vec3::Z,
            up: Vec3::Y,
            right: Vec3::X,
        };
        assert_eq!(f.offset(2.0, 1.0), Vec3::new(2.0, 1.0, 0.0));
        let q = f.rotation();
        assert!((q * Vec3::Z - Vec3::Z).length() < 1e-5);
    }
}
