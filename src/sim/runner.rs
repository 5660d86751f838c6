//! The runner: a distance-driven actor riding the track
//!
//! The runner's only real state along the track is a scalar global distance. Each
//! tick it advances that distance by the ramped speed, then turns it into a world
//! pose through the track frame, a smoothed lane offset, hover, a jump arc, and a
//! bank that leans into both the lane offset and the curvature just ahead.

use glam::{Quat, Vec3};

use super::curve::TrackCurve;
use super::frame::compute_frame;
use super::ramp::SpeedRamp;
use crate::config::RunnerConfig;
use crate::consts::CURVATURE_PROBE;
use crate::{
    exp_smoothing_factor, look_rotation, repeat, signed_angle, slerp_direction, smooth_damp,
};

/// Discrete lane input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneChange {
    /// One lane toward lane 0
    Left,
    /// One lane toward the last lane
    Right,
    /// Straight to a lane (clamped to the lane count)
    To(usize),
}

/// Player intent for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerInput {
    pub lane_change: Option<LaneChange>,
    pub jump: bool,
}

/// What changed during one pose update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerStep {
    pub posed: bool,
    pub lane_changed: bool,
    pub jumped: bool,
    pub landed: bool,
}

/// Distance-driven actor
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRunner {
    config: RunnerConfig,
    ramp: SpeedRamp,

    /// Global distance along the track
    distance: f32,
    /// Seconds since the run started
    elapsed: f32,
    speed: f32,

    lane: usize,
    lateral: f32,
    lateral_vel: f32,
    y_vel: f32,
    jump_offset: f32,
    jump_vel: f32,
    /// Carried up vector for this runner's frame stream
    last_up: Vec3,
    /// Bank in degrees applied on the last pose update
    roll: f32,

    position: Vec3,
    rotation: Quat,
}

impl TrackRunner {
    pub fn new(config: RunnerConfig) -> Self {
        let ramp = SpeedRamp::from_config(&config);
        let mut runner = Self {
            config,
            ramp,
            distance: 0.0,
            elapsed: 0.0,
            speed: 0.0,
            lane: 0,
            lateral: 0.0,
            lateral_vel: 0.0,
            y_vel: 0.0,
            jump_offset: 0.0,
            jump_vel: 0.0,
            last_up: Vec3::Y,
            roll: 0.0,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        };
        runner.reset_run();
        runner
    }

    /// Drop all run state back to the start, instantly.
    ///
    /// Safe to call any number of times; the pose goes back to the origin until
    /// `snap_to_start` places it on a track.
    pub fn reset_run(&mut self) {
        self.distance = 0.0;
        self.elapsed = 0.0;
        self.speed = self.ramp.start_speed();

        self.lane = 0;
        self.lateral = self.lane_offset(self.lane);
        self.lateral_vel = 0.0;
        self.y_vel = 0.0;
        self.jump_offset = 0.0;
        self.jump_vel = 0.0;
        self.last_up = Vec3::Y;
        self.roll = 0.0;

        self.position = Vec3::ZERO;
        self.rotation = Quat::IDENTITY;
    }

    /// Place the runner on the start of `curve` (when configured to)
    pub fn snap_to_start(&mut self, curve: &TrackCurve) {
        if !self.config.snap_to_start_on_reset {
            return;
        }
        let looping = self.is_looping(curve);
        if let Some(frame) = curve.frame_at(0.0, looping, &mut self.last_up) {
            self.position = frame.offset(self.lateral, self.config.hover);
            self.rotation = frame.rotation();
        }
    }

    /// Advance along the track and update the pose in one go
    pub fn tick(&mut self, dt: f32, curve: &TrackCurve, input: &RunnerInput) -> RunnerStep {
        if !self.advance(dt, curve) {
            return RunnerStep::default();
        }
        self.update_pose(dt, curve, input)
    }

    /// Move the distance forward by the current speed.
    ///
    /// Returns false (and does nothing) while the curve is not ready.
    pub fn advance(&mut self, dt: f32, curve: &TrackCurve) -> bool {
        if !curve.is_ready() || dt <= 0.0 {
            return false;
        }

        self.elapsed += dt;
        self.speed = self.ramp.speed_at(self.elapsed);
        self.distance += self.speed * dt;

        if self.is_looping(curve) {
            self.distance = repeat(self.distance, curve.length());
        }
        true
    }

    /// Recompute the world pose from the current distance
    pub fn update_pose(&mut self, dt: f32, curve: &TrackCurve, input: &RunnerInput) -> RunnerStep {
        let looping = self.is_looping(curve);
        let local = curve.to_local(self.distance, looping);
        let Some(frame) = compute_frame(curve, local, looping, &mut self.last_up) else {
            return RunnerStep::default();
        };

        let mut step = RunnerStep {
            posed: true,
            lane_changed: self.apply_lane_change(input.lane_change),
            ..Default::default()
        };

        let c = &self.config;
        let lane_smooth = if c.lane_switch_smooth > 0.0 {
            c.lane_switch_smooth
        } else {
            c.steer_damp
        };
        let target_x = self.lane_offset(self.lane);
        self.lateral = smooth_damp(
            self.lateral,
            target_x,
            &mut self.lateral_vel,
            1.0 / lane_smooth.max(1.0e-3),
            dt,
        );

        (step.jumped, step.landed) = self.update_jump(input.jump, dt);
        let want = frame.offset(self.lateral, self.config.hover + self.jump_offset);

        // Bank: lean toward the lane offset plus into the bend just ahead
        let c = &self.config;
        let steer_roll = (self.lateral / c.lane_width.max(1.0e-3)).clamp(-1.0, 1.0) * c.roll_max;
        let mut probe_up = self.last_up;
        let curve_roll = curve
            .frame_at(self.distance + CURVATURE_PROBE, looping, &mut probe_up)
            .map(|ahead| signed_angle(frame.forward, ahead.forward, frame.up) * c.roll_from_curve)
            .unwrap_or(0.0);
        self.roll = steer_roll + curve_roll;

        let blended_up = slerp_direction(Vec3::Y, frame.up, c.align_to_track.clamp(0.0, 1.0));
        let bank = Quat::from_rotation_z(self.roll.to_radians());
        let target_rot = look_rotation(frame.forward, blended_up) * bank;

        let y = smooth_damp(
            self.position.y,
            want.y,
            &mut self.y_vel,
            1.0 / c.y_smooth.max(1.0e-3),
            dt,
        );
        self.position = Vec3::new(want.x, y, want.z);

        let blend = exp_smoothing_factor(c.rotation_smooth, dt);
        self.rotation = self.rotation.slerp(target_rot, blend).normalize();

        step
    }

    fn apply_lane_change(&mut self, change: Option<LaneChange>) -> bool {
        let Some(change) = change else {
            return false;
        };
        let last = self.config.lane_count() - 1;
        let target = match change {
            LaneChange::Left => self.lane.saturating_sub(1),
            LaneChange::Right => (self.lane + 1).min(last),
            LaneChange::To(lane) => lane.min(last),
        };
        let changed = target != self.lane;
        self.lane = target;
        changed
    }

    /// Integrate the jump arc. Returns `(jumped, landed)`.
    fn update_jump(&mut self, wants_jump: bool, dt: f32) -> (bool, bool) {
        let gravity = self.config.gravity.max(0.0);
        let airborne = self.jump_offset > 0.0;

        let jumped = wants_jump && self.is_grounded();
        if jumped {
            self.jump_vel = (2.0 * gravity * self.config.jump_height.max(1.0e-3)).sqrt();
        }

        self.jump_vel -= gravity * dt;
        self.jump_offset += self.jump_vel * dt;

        let mut landed = false;
        if self.jump_offset < 0.0 {
            self.jump_offset = 0.0;
            self.jump_vel = 0.0;
            landed = airborne;
        }
        (jumped, landed)
    }

    fn is_looping(&self, curve: &TrackCurve) -> bool {
        self.config.loop_if_closed && curve.is_closed()
    }

    /// Sideways offset of a lane's centre from the track centre line
    pub fn lane_offset(&self, lane: usize) -> f32 {
        let lanes = self.config.lane_count();
        let center = (lanes - 1) as f32 * 0.5;
        (lane as f32 - center) * self.config.lane_width
    }

    /// Global distance travelled
    #[inline]
    pub fn distance_on_track(&self) -> f32 {
        self.distance
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub fn lane(&self) -> usize {
        self.lane
    }

    #[inline]
    pub fn lateral_offset(&self) -> f32 {
        self.lateral
    }

    #[inline]
    pub fn jump_offset(&self) -> f32 {
        self.jump_offset
    }

    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.jump_offset <= f32::EPSILON
    }

    #[inline]
    pub fn roll(&self) -> f32 {
        self.roll
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::curve::Knot;

    const DT: f32 = 1.0 / 60.0;

    fn straight(count: usize) -> TrackCurve {
        TrackCurve::from_knots(
            (0..count).map(|i| Knot::smooth(Vec3::Z * 8.0 * i as f32, Vec3::Z * 2.4)),
            false,
        )
    }

    fn runner_on(curve: &TrackCurve) -> TrackRunner {
        let mut runner = TrackRunner::new(RunnerConfig::default());
        runner.snap_to_start(curve);
        runner
    }

    fn run(runner: &mut TrackRunner, curve: &TrackCurve, ticks: usize, input: RunnerInput) {
        for _ in 0..ticks {
            runner.tick(DT, curve, &input);
        }
    }

    #[test]
    fn test_not_ready_curve_means_no_movement() {
        let curve = TrackCurve::new();
        let mut runner = TrackRunner::new(RunnerConfig::default());
        let step = runner.tick(DT, &curve, &RunnerInput::default());
        assert_eq!(step, RunnerStep::default());
        assert_eq!(runner.distance_on_track(), 0.0);
        assert_eq!(runner.elapsed(), 0.0);
    }

    #[test]
    fn test_distance_integrates_speed() {
        let curve = straight(200);
        let mut runner = runner_on(&curve);
        let mut expected = 0.0;
        for _ in 0..120 {
            runner.tick(DT, &curve, &RunnerInput::default());
            expected += runner.speed() * DT;
        }
        assert!((runner.distance_on_track() - expected).abs() < 1e-3);
        assert!(runner.speed() >= 18.0);
        // Right is +X on a +Z track, lane 0 sits at -1.1
        let p = runner.position();
        assert!((p.z - runner.distance_on_track()).abs() < 0.05);
        assert!((p.x + 1.1).abs() < 1e-3);
        assert!((p.y - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_closed_track_wraps_distance() {
        let square = [
            Vec3::ZERO,
            Vec3::new(20.0, 0.0, 0.0),
            Vec3::new(20.0, 0.0, 20.0),
            Vec3::new(0.0, 0.0, 20.0),
        ];
        let corners = square.iter().map(|&p| Knot::new(p, Vec3::ZERO, Vec3::ZERO));
        let curve = TrackCurve::from_knots(corners, true);
        let mut runner = runner_on(&curve);
        for _ in 0..600 {
            runner.tick(DT, &curve, &RunnerInput::default());
            assert!(runner.distance_on_track() >= 0.0);
            assert!(runner.distance_on_track() < curve.length());
        }
        assert!(runner.elapsed() > 9.9);
    }

    #[test]
    fn test_lane_switch_is_smooth() {
        let curve = straight(200);
        let mut runner = runner_on(&curve);
        let right = RunnerInput {
            lane_change: Some(LaneChange::Right),
            jump: false,
        };
        let step = runner.tick(DT, &curve, &right);
        assert!(step.lane_changed);
        assert_eq!(runner.lane(), 1);
        // One tick moves part of the way, not a teleport
        assert!(runner.lateral_offset() > -1.1 && runner.lateral_offset() < 1.0);

        run(&mut runner, &curve, 120, RunnerInput::default());
        assert!((runner.lateral_offset() - 1.1).abs() < 1e-2);

        // Already in the last lane
        let step = runner.tick(DT, &curve, &right);
        assert!(!step.lane_changed);
    }

    #[test]
    fn test_lane_offsets_for_three_lanes() {
        let runner = TrackRunner::new(RunnerConfig {
            lanes: 3,
            lane_width: 2.0,
            ..Default::default()
        });
        assert_eq!(runner.lane_offset(0), -2.0);
        assert_eq!(runner.lane_offset(1), 0.0);
        assert_eq!(runner.lane_offset(2), 2.0);
    }

    #[test]
    fn test_lane_to_is_clamped() {
        let curve = straight(50);
        let mut runner = runner_on(&curve);
        runner.tick(
            DT,
            &curve,
            &RunnerInput {
                lane_change: Some(LaneChange::To(9)),
                jump: false,
            },
        );
        assert_eq!(runner.lane(), 1);
    }

    #[test]
    fn test_jump_arc() {
        let curve = straight(400);
        let mut runner = runner_on(&curve);
        let jump = RunnerInput {
            lane_change: None,
            jump: true,
        };
        let step = runner.tick(DT, &curve, &jump);
        assert!(step.jumped);
        assert!(!runner.is_grounded());

        let mut peak: f32 = 0.0;
        let mut landed = false;
        for _ in 0..120 {
            // Holding jump mid-air does nothing
            let step = runner.tick(DT, &curve, &jump);
            peak = peak.max(runner.jump_offset());
            assert!(runner.jump_offset() >= 0.0);
            if step.landed {
                landed = true;
                break;
            }
            assert!(!step.jumped);
        }
        assert!(landed);
        assert!(runner.is_grounded());
        assert!((peak - 1.6).abs() < 0.15, "peak {}", peak);
    }

    #[test]
    fn test_no_land_event_while_grounded() {
        let curve = straight(100);
        let mut runner = runner_on(&curve);
        for _ in 0..30 {
            let step = runner.tick(DT, &curve, &RunnerInput::default());
            assert!(!step.landed);
            assert_eq!(runner.jump_offset(), 0.0);
        }
    }

    #[test]
    fn test_bank_from_lane_offset_on_straight() {
        let curve = straight(100);
        let mut runner = runner_on(&curve);
        runner.tick(DT, &curve, &RunnerInput::default());
        // lane 0: lateral -1.1 of width 2.2 -> half of roll_max, no curvature
        assert!((runner.roll() + 11.0).abs() < 1e-3);
    }

    #[test]
    fn test_bank_leans_into_bends() {
        // Curve to the left (+X) and to the right (-X) should bank opposite ways
        let bend = |dir: f32| {
            TrackCurve::from_knots(
                (0..60).map(|i| {
                    let a = dir * i as f32 * 0.08;
                    let p = Vec3::new(a.sin(), 0.0, a.cos()) * 100.0 - Vec3::Z * 100.0;
                    let t = Vec3::new(a.cos(), 0.0, -a.sin()) * dir * 2.4;
                    Knot::smooth(p, t)
                }),
                false,
            )
        };
        let config = RunnerConfig {
            lanes: 1,
            ..Default::default()
        };

        let a = bend(1.0);
        let b = bend(-1.0);
        let mut ra = TrackRunner::new(config.clone());
        let mut rb = TrackRunner::new(config);
        ra.tick(DT, &a, &RunnerInput::default());
        rb.tick(DT, &b, &RunnerInput::default());
        assert!(ra.roll().abs() > 1e-3);
        assert!(ra.roll() * rb.roll() < 0.0);
        assert!((ra.roll() + rb.roll()).abs() < 1e-2);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let curve = straight(200);
        let mut runner = runner_on(&curve);
        run(
            &mut runner,
            &curve,
            90,
            RunnerInput {
                lane_change: Some(LaneChange::Right),
                jump: true,
            },
        );
        assert!(runner.distance_on_track() > 0.0);

        runner.reset_run();
        let once = runner.clone();
        runner.reset_run();
        assert_eq!(runner, once);

        assert_eq!(runner.distance_on_track(), 0.0);
        assert_eq!(runner.elapsed(), 0.0);
        assert_eq!(runner.speed(), 18.0);
        assert_eq!(runner.lane(), 0);
        assert_eq!(runner.lateral_offset(), -1.1);
        assert_eq!(runner.jump_offset(), 0.0);
        assert!(runner.is_grounded());
    }

    #[test]
    fn test_rotation_follows_track() {
        let curve = straight(200);
        let mut runner = runner_on(&curve);
        run(&mut runner, &curve, 120, RunnerInput::default());
        let fwd = runner.rotation() * Vec3::Z;
        assert!(fwd.dot(Vec3::Z) > 0.95);
        assert!((runner.rotation().length() - 1.0).abs() < 1e-4);
    }
}
