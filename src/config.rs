//! Game tuning
//!
//! Everything a designer tweaks lives here and loads from JSON. Every struct is
//! `#[serde(default)]`, so a file only needs the keys it changes.
//!
//! Inverted ranges load as-is and are normalized where they are used.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sim::window::ExtensionPolicy;

/// Track synthesis and materialization window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Distance between knots
    pub step: f32,
    /// Knots laid down when a track is built
    pub start_points: usize,
    /// Maximum yaw swing in degrees (bigger = wider S curves)
    pub turn_degrees: f32,
    /// Noise frequency for yaw (smaller = longer arcs)
    pub turn_scale: f32,
    /// Vertical range of hills
    pub height_amplitude: f32,
    /// Noise frequency for height (smaller = slower hills)
    pub height_scale: f32,
    /// Low-pass factor per knot on height
    pub height_follow: f32,
    /// Tangent length relative to `step`
    pub tangent_scale: f32,
    /// Track kept ahead of the runner
    pub look_ahead: f32,
    /// Track kept behind the runner
    pub trim_behind: f32,
    /// Gap between the generated tail and the furthest spawn
    pub safety_margin: f32,
    /// Trimming never leaves fewer knots than this
    pub safety_min_knots: usize,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            step: 8.0,
            start_points: 30,
            turn_degrees: 70.0,
            turn_scale: 0.015,
            height_amplitude: 8.0,
            height_scale: 0.008,
            height_follow: 0.08,
            tangent_scale: 0.6,
            look_ahead: 240.0,
            trim_behind: 120.0,
            safety_margin: 5.0,
            safety_min_knots: 10,
        }
    }
}

impl TrackConfig {
    pub fn policy(&self) -> ExtensionPolicy {
        ExtensionPolicy {
            look_ahead: self.look_ahead,
            trim_behind: self.trim_behind,
            safety_margin: self.safety_margin,
            min_knots: self.safety_min_knots,
        }
    }
}

/// Runner locomotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub start_speed: f32,
    pub max_speed: f32,
    /// Exponential approach rate toward `max_speed`
    pub ramp_rate: f32,
    /// Use the eased ramp over `ramp_duration` instead of the exponential one
    pub use_ramp_curve: bool,
    pub ramp_duration: f32,

    pub lanes: usize,
    pub lane_width: f32,
    /// Lane smoothing rate used when `lane_switch_smooth` is zero
    pub steer_damp: f32,
    pub lane_switch_smooth: f32,

    /// Bank in degrees at full lane offset
    pub roll_max: f32,
    /// Extra bank per degree of track turn
    pub roll_from_curve: f32,

    pub loop_if_closed: bool,
    pub hover: f32,
    pub y_smooth: f32,
    pub jump_height: f32,
    pub gravity: f32,
    pub rotation_smooth: f32,
    /// 0 keeps the runner upright, 1 follows the track's up
    pub align_to_track: f32,
    pub snap_to_start_on_reset: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            start_speed: 18.0,
            max_speed: 38.0,
            ramp_rate: 0.12,
            use_ramp_curve: true,
            ramp_duration: 60.0,
            lanes: 2,
            lane_width: 2.2,
            steer_damp: 10.0,
            lane_switch_smooth: 10.0,
            roll_max: 22.0,
            roll_from_curve: 0.6,
            loop_if_closed: true,
            hover: 0.25,
            y_smooth: 12.0,
            jump_height: 1.6,
            gravity: 30.0,
            rotation_smooth: 12.0,
            align_to_track: 1.0,
            snap_to_start_on_reset: true,
        }
    }
}

impl RunnerConfig {
    /// Lane count, at least one
    pub fn lane_count(&self) -> usize {
        self.lanes.max(1)
    }
}

/// Normalize a possibly inverted spacing pair to `[max(1, lo), hi]`
pub fn spacing_range(a: f32, b: f32) -> (f32, f32) {
    let lo = a.min(b).max(1.0);
    let hi = a.max(b).max(lo);
    (lo, hi)
}

/// Lane-placed content (obstacles, points)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub spawn_start: f32,
    pub spawn_up_to: f32,
    pub despawn_behind: f32,
    pub min_spacing: f32,
    pub max_spacing: f32,
    pub hover: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self::obstacles()
    }
}

impl SpawnConfig {
    pub fn obstacles() -> Self {
        Self {
            spawn_start: 40.0,
            spawn_up_to: 160.0,
            despawn_behind: 40.0,
            min_spacing: 14.0,
            max_spacing: 22.0,
            hover: 0.15,
        }
    }

    pub fn points() -> Self {
        Self {
            spawn_start: 30.0,
            spawn_up_to: 160.0,
            despawn_behind: 40.0,
            min_spacing: 8.0,
            max_spacing: 14.0,
            hover: 0.5,
        }
    }
}

/// Decorations scattered on a ring around the track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    pub spawn_start: f32,
    pub spawn_up_to: f32,
    pub despawn_behind: f32,
    pub min_spacing: f32,
    pub max_spacing: f32,
    /// Distance from the track centre line, `[min, max]`
    pub radius_range: [f32; 2],
    /// Angle around the track in degrees, `[min, max]`
    pub angle_range: [f32; 2],
    /// Squash of the ring's vertical axis (0..1)
    pub vertical_scale: f32,
    /// Random yaw about the local up, degrees either way
    pub random_yaw: f32,
    /// Orient local +X along the track instead of local +Z
    pub align_x_to_forward: bool,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self::bubbles()
    }
}

impl DecorationConfig {
    pub fn bubbles() -> Self {
        Self {
            spawn_start: 40.0,
            spawn_up_to: 180.0,
            despawn_behind: 60.0,
            min_spacing: 30.0,
            max_spacing: 50.0,
            radius_range: [3.0, 8.0],
            angle_range: [0.0, 360.0],
            vertical_scale: 1.0,
            random_yaw: 0.0,
            align_x_to_forward: true,
        }
    }

    pub fn fish() -> Self {
        Self {
            min_spacing: 12.0,
            max_spacing: 24.0,
            ..Self::bubbles()
        }
    }
}

/// Player health and track-space hit tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub max_health: u32,
    /// Seconds of immunity after a hit
    pub invulnerability: f32,
    /// Seconds before regeneration starts
    pub regen_delay: f32,
    /// Seconds to regenerate one point
    pub regen_duration: f32,
    /// Distance along the track within which an obstacle counts as touching
    pub hit_depth: f32,
    /// Jump height that clears an obstacle
    pub obstacle_clearance: f32,
    /// Distance within which a point is collected
    pub pickup_radius: f32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_health: 2,
            invulnerability: 1.0,
            regen_delay: 1.5,
            regen_duration: 3.5,
            hit_depth: 1.2,
            obstacle_clearance: 0.9,
            pickup_radius: 1.2,
        }
    }
}

/// Complete tuning for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub track: TrackConfig,
    pub runner: RunnerConfig,
    pub obstacles: SpawnConfig,
    pub points: SpawnConfig,
    pub bubbles: DecorationConfig,
    pub fish: DecorationConfig,
    pub health: HealthConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            track: TrackConfig::default(),
            runner: RunnerConfig::default(),
            obstacles: SpawnConfig::obstacles(),
            points: SpawnConfig::points(),
            bubbles: DecorationConfig::bubbles(),
            fish: DecorationConfig::fish(),
            health: HealthConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Read and parse a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_json(&json)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load a config file, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("{err:#}; using default config");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "track": { "step": 4.0 }, "runner": { "lanes": 3 } }"#;
        let config = GameConfig::from_json(json).unwrap();
        assert_eq!(config.track.step, 4.0);
        assert_eq!(config.track.start_points, 30);
        assert_eq!(config.runner.lanes, 3);
        assert_eq!(config.runner.max_speed, 38.0);
        assert_eq!(config.points, SpawnConfig::points());
        assert_eq!(config.fish.min_spacing, 12.0);
    }

    #[test]
    fn test_json_round_trip() {
        let config = GameConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(GameConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(GameConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = GameConfig::load_or_default("/definitely/not/here/voidwave.json");
        assert_eq!(config, GameConfig::default());
        assert!(GameConfig::load("/definitely/not/here/voidwave.json").is_err());
    }

    #[test]
    fn test_spacing_range_normalizes() {
        assert_eq!(spacing_range(14.0, 22.0), (14.0, 22.0));
        assert_eq!(spacing_range(22.0, 14.0), (14.0, 22.0));
        assert_eq!(spacing_range(0.2, 0.5), (1.0, 1.0));
        assert_eq!(spacing_range(-3.0, 6.0), (1.0, 6.0));
    }

    #[test]
    fn test_policy_from_track_config() {
        let policy = TrackConfig::default().policy();
        assert_eq!(policy.look_ahead, 240.0);
        assert_eq!(policy.trim_behind, 120.0);
        assert_eq!(policy.min_knots, 10);
    }
}
