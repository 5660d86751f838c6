//! Content placed along the track
//!
//! A spawner walks a cursor (`next_spawn_s`) ahead of the runner in global
//! distance, dropping an item at each stop and jumping a random spacing forward.
//! Items only remember their global distance and slot; their world pose is
//! rebuilt from the curve every tick so trimming never moves them.
//!
//! On a closed looping track items are posed by their distance around the loop.
//! The spawn cursor and despawn cutoff still assume a distance that only grows.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::curve::TrackCurve;
use super::frame::Frame;
use super::window::ExtensionPolicy;
use crate::config::{DecorationConfig, RunnerConfig, SpawnConfig, spacing_range};
use crate::look_rotation;

/// What a spawner produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Obstacle,
    Point,
    Bubble,
    Fish,
}

/// How items sit around the track centre line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// On one of the runner's lanes
    Lanes { lanes: usize, lane_width: f32, hover: f32 },
    /// On a ring around the centre line
    Ring {
        radius: [f32; 2],
        angle_deg: [f32; 2],
        vertical_scale: f32,
        random_yaw: f32,
        align_x_to_forward: bool,
    },
}

/// Where on the cross-section an item was dropped
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    Lane(usize),
    Ring { angle: f32, radius: f32, yaw: f32 },
}

/// One spawned item
#[derive(Debug, Clone, PartialEq)]
pub struct TrackItem {
    pub id: u32,
    pub kind: ItemKind,
    /// Global distance along the track
    pub s_global: f32,
    pub slot: Slot,
    pub position: Vec3,
    pub rotation: Quat,
    /// Set once the runner has picked it up or hit it
    pub collected: bool,
}

/// Counts from one spawner update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnUpdate {
    pub spawned: usize,
    pub despawned: usize,
}

#[derive(Debug, Clone)]
pub struct TrackSpawner {
    kind: ItemKind,
    placement: Placement,
    spawn_start: f32,
    spawn_up_to: f32,
    despawn_behind: f32,
    spacing: (f32, f32),
    /// Pose items around the loop when the curve is closed
    loop_if_closed: bool,

    seed: u64,
    rng: Pcg32,
    next_spawn_s: f32,
    next_id: u32,
    items: Vec<TrackItem>,
}

impl TrackSpawner {
    pub fn new(
        kind: ItemKind,
        placement: Placement,
        spawn_start: f32,
        spawn_up_to: f32,
        despawn_behind: f32,
        spacing: (f32, f32),
        seed: u64,
    ) -> Self {
        Self {
            kind,
            placement,
            spawn_start,
            spawn_up_to,
            despawn_behind: despawn_behind.max(0.0),
            spacing: spacing_range(spacing.0, spacing.1),
            loop_if_closed: true,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            next_spawn_s: 0.0,
            next_id: 1,
            items: Vec::new(),
        }
    }

    /// Lane content sharing the runner's lane layout
    pub fn lanes(kind: ItemKind, config: &SpawnConfig, runner: &RunnerConfig, seed: u64) -> Self {
        Self::new(
            kind,
            Placement::Lanes {
                lanes: runner.lane_count(),
                lane_width: runner.lane_width,
                hover: config.hover,
            },
            config.spawn_start,
            config.spawn_up_to,
            config.despawn_behind,
            (config.min_spacing, config.max_spacing),
            seed,
        )
        .with_looping(runner.loop_if_closed)
    }

    /// Decorations on a ring around the track
    pub fn ring(kind: ItemKind, config: &DecorationConfig, seed: u64) -> Self {
        Self::new(
            kind,
            Placement::Ring {
                radius: config.radius_range,
                angle_deg: config.angle_range,
                vertical_scale: config.vertical_scale,
                random_yaw: config.random_yaw,
                align_x_to_forward: config.align_x_to_forward,
            },
            config.spawn_start,
            config.spawn_up_to,
            config.despawn_behind,
            (config.min_spacing, config.max_spacing),
            seed,
        )
    }

    pub fn with_looping(mut self, loop_if_closed: bool) -> Self {
        self.loop_if_closed = loop_if_closed;
        self
    }

    /// Use a new seed from the next `reset` on
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
    }

    /// Drop every item and restart the cursor at `player_distance`
    pub fn reset(&mut self, player_distance: f32) {
        self.items.clear();
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.next_spawn_s = player_distance;
        self.next_id = 1;
        log::debug!("{:?} spawner reset at s={:.1}", self.kind, player_distance);
    }

    /// Spawn ahead of `player_global`, despawn behind it and re-pose every item
    pub fn update(
        &mut self,
        player_global: f32,
        curve: &TrackCurve,
        policy: &ExtensionPolicy,
    ) -> SpawnUpdate {
        if !curve.is_ready() {
            return SpawnUpdate::default();
        }

        let range = policy.spawn_range(self.spawn_start, self.spawn_up_to);
        self.next_spawn_s = self.next_spawn_s.max(player_global + range.start);
        let limit = (player_global + range.up_to).min(policy.spawn_limit(curve));

        let mut spawned = 0;
        while self.next_spawn_s < limit {
            self.spawn(self.next_spawn_s);
            self.next_spawn_s += self.rng.random_range(self.spacing.0..=self.spacing.1);
            spawned += 1;
        }

        let cutoff = player_global - self.despawn_behind;
        let before = self.items.len();
        self.items.retain(|item| item.s_global >= cutoff);
        let despawned = before - self.items.len();

        let looping = self.loop_if_closed && curve.is_closed();
        for item in &mut self.items {
            // Each item is its own sampling stream
            let mut up = Vec3::Y;
            if let Some(frame) = curve.frame_at(item.s_global, looping, &mut up) {
                (item.position, item.rotation) = pose(&self.placement, item.slot, &frame);
            }
        }

        SpawnUpdate { spawned, despawned }
    }

    fn spawn(&mut self, s_global: f32) {
        let slot = match self.placement {
            Placement::Lanes { lanes, .. } => Slot::Lane(self.rng.random_range(0..lanes.max(1))),
            Placement::Ring {
                radius,
                angle_deg,
                random_yaw,
                ..
            } => {
                let angle = self.draw(angle_deg).to_radians();
                let radius = self.draw(radius);
                let yaw = if random_yaw > 0.0 {
                    self.rng.random_range(-random_yaw..=random_yaw)
                } else {
                    0.0
                };
                Slot::Ring { angle, radius, yaw }
            }
        };

        let id = self.next_id;
        self.next_id += 1;
        self.items.push(TrackItem {
            id,
            kind: self.kind,
            s_global,
            slot,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            collected: false,
        });
    }

    /// Uniform draw from a possibly inverted `[a, b]` pair
    fn draw(&mut self, range: [f32; 2]) -> f32 {
        let lo = range[0].min(range[1]);
        let hi = range[0].max(range[1]);
        self.rng.random_range(lo..=hi)
    }

    #[inline]
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    #[inline]
    pub fn items(&self) -> &[TrackItem] {
        &self.items
    }

    #[inline]
    pub fn items_mut(&mut self) -> &mut [TrackItem] {
        &mut self.items
    }

    #[inline]
    pub fn next_spawn_s(&self) -> f32 {
        self.next_spawn_s
    }

    /// Sideways offset of a lane's centre for lane placements
    pub fn lane_offset(&self, lane: usize) -> f32 {
        match self.placement {
            Placement::Lanes { lanes, lane_width, .. } => lane_offset(lanes, lane_width, lane),
            Placement::Ring { .. } => 0.0,
        }
    }
}

fn lane_offset(lanes: usize, lane_width: f32, lane: usize) -> f32 {
    let center = (lanes.max(1) - 1) as f32 * 0.5;
    (lane as f32 - center) * lane_width
}

/// World pose of an item in `slot` on `frame`
fn pose(placement: &Placement, slot: Slot, frame: &Frame) -> (Vec3, Quat) {
    match (*placement, slot) {
        (Placement::Lanes { lanes, lane_width, hover }, Slot::Lane(lane)) => {
            (frame.offset(lane_offset(lanes, lane_width, lane), hover), frame.rotation())
        }
        (
            Placement::Ring {
                vertical_scale,
                align_x_to_forward,
                ..
            },
            Slot::Ring { angle, radius, yaw },
        ) => {
            let c = angle.cos() * radius;
            let s = angle.sin() * vertical_scale.clamp(0.0, 1.0) * radius;
            let position = frame.position + frame.right * c + frame.up * s;

            let mut rotation = if align_x_to_forward {
                // Local +X along the track, +Z out to the side
                look_rotation(frame.forward.cross(frame.up), frame.up)
            } else {
                frame.rotation()
            };
            if yaw.abs() > 0.01 {
                rotation = Quat::from_axis_angle(frame.up, yaw.to_radians()) * rotation;
            }
            (position, rotation)
        }
        // A slot from the other placement never happens; keep the item on the centre line
        _ => (frame.position, frame.rotation()),
    }
}
