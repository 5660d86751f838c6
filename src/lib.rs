//! Voidwave - an endless surf track
//!
//! Core modules:
//! - `sim`: Deterministic simulation (track generation, sampling, runner, spawners)
//! - `config`: Data-driven tuning loaded from JSON

pub mod config;
pub mod sim;

pub use config::GameConfig;

use glam::{Mat3, Quat, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Below this length a curve is "not ready" and is never sampled
    pub const CURVE_EPSILON: f32 = 1.0e-4;
    /// Squared-magnitude threshold for degenerate vectors in frame math
    pub const FRAME_EPSILON: f32 = 1.0e-4;
    /// Open curves are sampled no closer than this to their tail
    pub const TAIL_GUARD: f32 = 1.0e-4;

    /// Distance ahead of the runner used to measure track curvature
    pub const CURVATURE_PROBE: f32 = 1.0;
}

/// Wrap `t` into `[0, length)`.
///
/// Returns 0 for a non-positive `length`.
#[inline]
pub fn repeat(t: f32, length: f32) -> f32 {
    if length <= 0.0 {
        return 0.0;
    }
    let wrapped = t.rem_euclid(length);
    // rem_euclid can round up to `length` for tiny negative inputs
    if wrapped >= length { 0.0 } else { wrapped }
}

/// Critically damped spring toward `target`.
///
/// `velocity` is the spring state carried between calls. A zero or negative `dt`
/// leaves both value and velocity untouched.
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(1.0e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    // Never overshoot the target
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = (output - target) / dt;
    }

    output
}

/// Blend factor for frame-rate independent exponential smoothing: `1 - e^(-rate*dt)`
#[inline]
pub fn exp_smoothing_factor(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate.max(1.0e-3) * dt.max(0.0)).exp()
}

/// Unsigned angle between two vectors, in degrees
#[inline]
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom < 1.0e-15 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Signed angle from `from` to `to` around `axis`, in degrees.
///
/// The sign is taken from `dot(cross(from, to), axis)`; a zero dot counts as positive.
pub fn signed_angle(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    let sign = if from.cross(to).dot(axis) < 0.0 { -1.0 } else { 1.0 };
    sign * angle_between_deg(from, to)
}

/// Spherical interpolation between two directions (unit-length result)
pub fn slerp_direction(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let a = from.normalize_or_zero();
    let b = to.normalize_or_zero();
    if a == Vec3::ZERO || b == Vec3::ZERO {
        return a.lerp(b, t).normalize_or(Vec3::Y);
    }
    let t = t.clamp(0.0, 1.0);
    let arc = Quat::from_rotation_arc(a, b);
    (Quat::IDENTITY.slerp(arc, t) * a).normalize_or(b)
}

/// Rotation mapping local +Z onto `forward` and local +Y toward `up`.
///
/// Local +X ends up on `up × forward`, the same "right" the track frames use.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let f = forward.normalize_or(Vec3::Z);
    let mut r = up.cross(f);
    if r.length_squared() < consts::FRAME_EPSILON {
        r = Vec3::Y.cross(f);
        if r.length_squared() < consts::FRAME_EPSILON {
            r = Vec3::X;
        }
    }
    let r = r.normalize();
    let u = f.cross(r).normalize();
    Quat::from_mat3(&Mat3::from_cols(r, u, f))
}
